use crate::domain::model::{
    District, DistrictId, Neighborhood, NeighborhoodId, PriceRecord, Region, RegionId,
};
use crate::domain::ports::{Backend, ConfigProvider};
use crate::utils::error::{NavError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RegionDto {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    polygon: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeatureDto {
    id: u64,
    #[serde(default)]
    properties: Option<FeatureProperties>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    geometry: Option<serde_json::Value>,
}

impl FeatureDto {
    fn name(&self) -> String {
        self.properties
            .as_ref()
            .and_then(|p| p.name.clone())
            .or_else(|| self.name.clone())
            .unwrap_or_default()
    }
}

/// 區與社區端點可能回傳 `{features: [...]}` 或直接回傳陣列
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureList {
    Bare(Vec<FeatureDto>),
    Collection {
        #[serde(default)]
        features: Option<Vec<FeatureDto>>,
    },
}

impl FeatureList {
    fn into_features(self) -> Vec<FeatureDto> {
        match self {
            FeatureList::Bare(items) => items,
            FeatureList::Collection { features } => features.unwrap_or_default(),
        }
    }
}

/// Geometry is polygon text; anything else is treated as absent.
fn geometry_text(value: Option<serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) if !other.is_null() => {
            tracing::debug!("Ignoring non-text geometry: {}", other);
            None
        }
        _ => None,
    }
}

/// reqwest-backed client for the hierarchy and pricing API.
pub struct HttpBackend<C: ConfigProvider> {
    config: C,
    client: Client,
}

impl<C: ConfigProvider> HttpBackend<C> {
    pub fn new(config: C) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    /// Resolve an endpoint template against the base URL.
    pub fn endpoint_url(&self, name: &str, id: Option<u64>) -> Result<String> {
        let template = self
            .config
            .endpoint(name)
            .ok_or_else(|| NavError::MissingConfigError {
                field: format!("backend.endpoints.{}", name),
            })?;

        let path = match id {
            Some(id) => template.replace("{id}", &id.to_string()),
            None => template.to_string(),
        };
        if path.contains('{') && path.contains('}') {
            return Err(NavError::ConfigError {
                message: format!("Unresolved parameters in endpoint '{}': {}", name, path),
            });
        }

        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path);
        }
        Ok(format!(
            "{}/{}",
            self.config.base_url().trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }

    fn with_headers(&self, mut request: RequestBuilder) -> RequestBuilder {
        for (key, value) in self.config.headers() {
            request = request.header(key, value);
        }
        request
    }

    fn check_status(url: &str, response: Response) -> Result<Response> {
        let status = response.status();
        tracing::debug!("API response status: {} for {}", status, url);
        if status.is_success() {
            Ok(response)
        } else {
            Err(NavError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("Making API request to: {}", url);
        let response = self.with_headers(self.client.get(url)).send().await?;
        let response = Self::check_status(url, response)?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn features(&self, name: &str, id: u64) -> Result<Vec<FeatureDto>> {
        let url = self.endpoint_url(name, Some(id))?;
        let list: FeatureList = self.get_json(&url).await?;
        Ok(list.into_features())
    }
}

#[async_trait]
impl<C: ConfigProvider> Backend for HttpBackend<C> {
    async fn regions(&self) -> Result<Vec<Region>> {
        let url = self.endpoint_url("regions", None)?;
        let items: Vec<RegionDto> = self.get_json(&url).await?;
        Ok(items
            .into_iter()
            .map(|dto| Region {
                id: RegionId(dto.id),
                name: dto.name,
                polygon: geometry_text(dto.polygon),
            })
            .collect())
    }

    async fn districts(&self, region: RegionId) -> Result<Vec<District>> {
        let features = self.features("districts", region.0).await?;
        Ok(features
            .into_iter()
            .map(|f| District {
                id: DistrictId(f.id),
                name: f.name(),
                geometry: geometry_text(f.geometry),
            })
            .collect())
    }

    async fn neighborhoods(&self, district: DistrictId) -> Result<Vec<Neighborhood>> {
        let features = self.features("neighborhoods", district.0).await?;
        Ok(features
            .into_iter()
            .map(|f| Neighborhood {
                id: NeighborhoodId(f.id),
                name: f.name(),
                geometry: geometry_text(f.geometry),
            })
            .collect())
    }

    async fn price(&self, neighborhood: NeighborhoodId) -> Result<PriceRecord> {
        let url = self.endpoint_url("price", Some(neighborhood.0))?;
        self.get_json(&url).await
    }

    async fn update_price(&self, neighborhood: NeighborhoodId, record: &PriceRecord) -> Result<()> {
        let url = self.endpoint_url("price", Some(neighborhood.0))?;
        tracing::debug!("PATCH {}", url);
        let response = self
            .with_headers(self.client.patch(&url))
            .json(record)
            .send()
            .await?;
        Self::check_status(&url, response)?;
        Ok(())
    }
}
