pub mod attributes;
pub mod driver;
pub mod engine;
pub mod geometry;
pub mod layers;
pub mod loader;
pub mod navigation;

pub use crate::domain::model::{District, Neighborhood, PriceRecord, Region};
pub use crate::domain::ports::{Backend, ConfigProvider, DetailPanel, MapSurface};
pub use crate::utils::error::Result;
