use crate::utils::error::NavError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

macro_rules! entity_id {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const KIND: &'static str = $kind;
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(RegionId, "region");
entity_id!(DistrictId, "district");
entity_id!(NeighborhoodId, "neighborhood");

/// (lat, lon) 座標，地圖圖層使用此順序
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl Bounds {
    /// Envelope of the valid coordinates, `None` when there are none.
    pub fn from_coordinates<'a, I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        coordinates
            .into_iter()
            .filter(|c| c.is_valid())
            .fold(None, |acc: Option<Bounds>, c| {
                Some(match acc {
                    None => Bounds {
                        south_west: *c,
                        north_east: *c,
                    },
                    Some(b) => Bounds {
                        south_west: Coordinate::new(b.south_west.lat.min(c.lat), b.south_west.lon.min(c.lon)),
                        north_east: Coordinate::new(b.north_east.lat.max(c.lat), b.north_east.lon.max(c.lon)),
                    },
                })
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub polygon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: DistrictId,
    pub name: String,
    pub geometry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighborhood {
    pub id: NeighborhoodId,
    pub name: String,
    pub geometry: Option<String>,
}

/// 三個互斥的渲染圖層
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
    Region,
    District,
    Neighborhood,
}

impl LayerKind {
    pub const ALL: [LayerKind; 3] = [LayerKind::Region, LayerKind::District, LayerKind::Neighborhood];

    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Region => "region",
            LayerKind::District => "district",
            LayerKind::Neighborhood => "neighborhood",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_width: f64,
}

impl ShapeStyle {
    pub fn for_layer(kind: LayerKind) -> Self {
        let (fill_color, fill_opacity) = match kind {
            LayerKind::Region => ("#a1c4fd", 0.5),
            LayerKind::District => ("#76b852", 0.4),
            LayerKind::Neighborhood => ("#fa709a", 0.5),
        };
        Self {
            fill_color: fill_color.to_string(),
            fill_opacity,
            stroke_width: 2.0,
        }
    }
}

/// A polygon ready to hand to the map, bound to the entity it represents.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonShape {
    pub layer: LayerKind,
    pub entity: u64,
    pub hint: String,
    pub ring: Vec<Coordinate>,
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Apartment,
    NonResidential,
    Penthouse,
    RawLand,
    Plot,
    NewConstruction,
}

impl PriceField {
    pub const ALL: [PriceField; 6] = [
        PriceField::Apartment,
        PriceField::NonResidential,
        PriceField::Penthouse,
        PriceField::RawLand,
        PriceField::Plot,
        PriceField::NewConstruction,
    ];

    /// 後端 JSON 欄位名稱
    pub fn key(&self) -> &'static str {
        match self {
            PriceField::Apartment => "narx_kvartira",
            PriceField::NonResidential => "narx_nejiloy",
            PriceField::Penthouse => "narx_penthaus",
            PriceField::RawLand => "narx_quruqyer",
            PriceField::Plot => "narx_uchastka",
            PriceField::NewConstruction => "narx_yangiqurilish",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceField::Apartment => "apartment price",
            PriceField::NonResidential => "non-residential price",
            PriceField::Penthouse => "penthouse price",
            PriceField::RawLand => "raw-land price",
            PriceField::Plot => "plot price",
            PriceField::NewConstruction => "new-construction price",
        }
    }
}

impl FromStr for PriceField {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let normalized = normalized.trim_end_matches("_price");
        PriceField::ALL
            .into_iter()
            .find(|f| {
                f.key() == normalized
                    || f.key().trim_start_matches("narx_") == normalized
                    || f.label().replace(['-', ' '], "_").trim_end_matches("_price") == normalized
            })
            .ok_or_else(|| NavError::UnknownField { name: s.to_string() })
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 後端可能回傳數字、數字字串、空字串或 null
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(rename = "narx_kvartira", default, deserialize_with = "lenient_price")]
    pub apartment: Option<f64>,
    #[serde(rename = "narx_nejiloy", default, deserialize_with = "lenient_price")]
    pub non_residential: Option<f64>,
    #[serde(rename = "narx_penthaus", default, deserialize_with = "lenient_price")]
    pub penthouse: Option<f64>,
    #[serde(rename = "narx_quruqyer", default, deserialize_with = "lenient_price")]
    pub raw_land: Option<f64>,
    #[serde(rename = "narx_uchastka", default, deserialize_with = "lenient_price")]
    pub plot: Option<f64>,
    #[serde(rename = "narx_yangiqurilish", default, deserialize_with = "lenient_price")]
    pub new_construction: Option<f64>,
}

impl PriceRecord {
    pub fn get(&self, field: PriceField) -> Option<f64> {
        match field {
            PriceField::Apartment => self.apartment,
            PriceField::NonResidential => self.non_residential,
            PriceField::Penthouse => self.penthouse,
            PriceField::RawLand => self.raw_land,
            PriceField::Plot => self.plot,
            PriceField::NewConstruction => self.new_construction,
        }
    }

    pub fn set(&mut self, field: PriceField, value: Option<f64>) {
        let slot = match field {
            PriceField::Apartment => &mut self.apartment,
            PriceField::NonResidential => &mut self.non_residential,
            PriceField::Penthouse => &mut self.penthouse,
            PriceField::RawLand => &mut self.raw_land,
            PriceField::Plot => &mut self.plot,
            PriceField::NewConstruction => &mut self.new_construction,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        PriceField::ALL.iter().all(|f| self.get(*f).is_none())
    }
}

/// 某個區的社區清單與各社區的價格（價格抓取失敗者以空記錄代替）
#[derive(Debug, Clone, Default)]
pub struct NeighborhoodBatch {
    pub neighborhoods: Vec<Neighborhood>,
    pub prices: HashMap<NeighborhoodId, PriceRecord>,
    pub failed_prices: Vec<NeighborhoodId>,
}
