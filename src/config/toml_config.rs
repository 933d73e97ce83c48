use crate::core::layers::ViewSettings;
use crate::domain::model::{Coordinate, LayerKind, ShapeStyle};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{NavError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://admin.uysavdo.com/api";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub styles: StylesConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    pub headers: Option<HashMap<String, String>>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
            endpoints: EndpointsConfig::default(),
            headers: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub regions: String,
    pub districts: String,
    pub neighborhoods: String,
    pub price: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            regions: "viloyatlar/".to_string(),
            districts: "tumanlar/{id}/".to_string(),
            neighborhoods: "mahallalar/{id}/".to_string(),
            price: "narx/{id}/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub price_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapConfig {
    /// [lat, lon]
    pub center: Option<[f64; 2]>,
    pub zoom: Option<u8>,
    pub animation_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StylesConfig {
    pub region: Option<StyleOverride>,
    pub district: Option<StyleOverride>,
    pub neighborhood: Option<StyleOverride>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleOverride {
    pub fill_color: Option<String>,
    pub fill_opacity: Option<f64>,
    pub stroke_width: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(NavError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| NavError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| NavError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("backend.base_url", &self.backend.base_url)?;

        let endpoints = &self.backend.endpoints;
        validation::validate_non_empty_string("backend.endpoints.regions", &endpoints.regions)?;
        validation::validate_endpoint_template("backend.endpoints.districts", &endpoints.districts)?;
        validation::validate_endpoint_template(
            "backend.endpoints.neighborhoods",
            &endpoints.neighborhoods,
        )?;
        validation::validate_endpoint_template("backend.endpoints.price", &endpoints.price)?;

        if let Some(timeout) = self.backend.timeout_seconds {
            validation::validate_range("backend.timeout_seconds", timeout, 1, 600)?;
        }

        if let Some(concurrency) = self.loader.price_concurrency {
            validation::validate_positive_number("loader.price_concurrency", concurrency, 1)?;
            validation::validate_range("loader.price_concurrency", concurrency, 1, 64)?;
        }

        if let Some([lat, lon]) = self.map.center {
            validation::validate_range("map.center.lat", lat, -90.0, 90.0)?;
            validation::validate_range("map.center.lon", lon, -180.0, 180.0)?;
        }
        if let Some(zoom) = self.map.zoom {
            validation::validate_range("map.zoom", zoom, 0, 22)?;
        }

        for (kind, style) in self.style_overrides() {
            if let Some(color) = &style.fill_color {
                validation::validate_hex_color(&format!("styles.{}.fill_color", kind.name()), color)?;
            }
            if let Some(opacity) = style.fill_opacity {
                validation::validate_range(
                    &format!("styles.{}.fill_opacity", kind.name()),
                    opacity,
                    0.0,
                    1.0,
                )?;
            }
        }

        Ok(())
    }

    fn style_overrides(&self) -> impl Iterator<Item = (LayerKind, &StyleOverride)> {
        [
            (LayerKind::Region, self.styles.region.as_ref()),
            (LayerKind::District, self.styles.district.as_ref()),
            (LayerKind::Neighborhood, self.styles.neighborhood.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, style)| style.map(|s| (kind, s)))
    }

    /// 取得價格並發請求數
    pub fn price_concurrency(&self) -> usize {
        self.loader.price_concurrency.unwrap_or(4)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    /// 地圖視角與圖層樣式
    pub fn view_settings(&self) -> ViewSettings {
        let mut settings = ViewSettings::default();
        if let Some([lat, lon]) = self.map.center {
            settings.country_center = Coordinate::new(lat, lon);
        }
        if let Some(zoom) = self.map.zoom {
            settings.country_zoom = zoom;
        }
        if let Some(ms) = self.map.animation_ms {
            settings.animation = Duration::from_millis(ms);
        }
        for (kind, style) in self.style_overrides() {
            let base = ShapeStyle::for_layer(kind);
            settings.styles.insert(
                kind,
                ShapeStyle {
                    fill_color: style.fill_color.clone().unwrap_or(base.fill_color),
                    fill_opacity: style.fill_opacity.unwrap_or(base.fill_opacity),
                    stroke_width: style.stroke_width.unwrap_or(base.stroke_width),
                },
            );
        }
        settings
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        &self.backend.base_url
    }

    fn endpoint(&self, name: &str) -> Option<&str> {
        let endpoints = &self.backend.endpoints;
        match name {
            "regions" => Some(endpoints.regions.as_str()),
            "districts" => Some(endpoints.districts.as_str()),
            "neighborhoods" => Some(endpoints.neighborhoods.as_str()),
            "price" => Some(endpoints.price.as_str()),
            _ => None,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_seconds.unwrap_or(30))
    }

    fn headers(&self) -> HashMap<String, String> {
        self.backend.headers.clone().unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
