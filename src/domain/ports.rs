use crate::domain::model::{
    Bounds, Coordinate, District, DistrictId, LayerKind, Neighborhood, NeighborhoodId, PolygonShape,
    PriceRecord, Region, RegionId,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Backend API supplying the hierarchy and pricing data.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn regions(&self) -> Result<Vec<Region>>;
    async fn districts(&self, region: RegionId) -> Result<Vec<District>>;
    async fn neighborhoods(&self, district: DistrictId) -> Result<Vec<Neighborhood>>;
    async fn price(&self, neighborhood: NeighborhoodId) -> Result<PriceRecord>;
    async fn update_price(&self, neighborhood: NeighborhoodId, record: &PriceRecord) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    /// `regions`、`districts`、`neighborhoods`、`price` 四個端點模板
    fn endpoint(&self, name: &str) -> Option<&str>;
    fn timeout(&self) -> Duration;
    fn headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerHandle(pub u32);

/// Only handed out once a shape is attached to its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeHandle(pub u64);

/// Map rendering collaborator. The engine only orchestrates these calls.
pub trait MapSurface {
    fn create_layer(&mut self, kind: LayerKind) -> LayerHandle;
    fn clear_layer(&mut self, layer: LayerHandle);
    fn add_polygon(&mut self, layer: LayerHandle, shape: PolygonShape) -> ShapeHandle;
    fn shape_bounds(&self, shape: ShapeHandle) -> Option<Bounds>;
    fn set_interactive(&mut self, layer: LayerHandle, interactive: bool);
    fn set_emphasis(&mut self, shape: ShapeHandle, emphasized: bool);
    /// Fire-and-forget; a later call supersedes one still animating.
    fn fly_to_bounds(&mut self, bounds: Bounds, duration: Duration);
    fn set_view(&mut self, center: Coordinate, zoom: u8);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Saved(NeighborhoodId),
    SaveFailed { id: NeighborhoodId, message: String },
}

/// Detail/edit panel collaborator.
pub trait DetailPanel {
    fn open(&mut self, neighborhood: &Neighborhood, record: &PriceRecord);
    fn refresh(&mut self, record: &PriceRecord);
    fn close(&mut self);
    fn notify(&mut self, notice: Notice);
}
