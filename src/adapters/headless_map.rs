use crate::domain::model::{Bounds, Coordinate, LayerKind, PolygonShape};
use crate::domain::ports::{LayerHandle, MapSurface, ShapeHandle};
use geo::{BoundingRect, Coord, LineString};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

/// Every call the engine made, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    CreateLayer(LayerKind),
    ClearLayer(LayerKind),
    AddPolygon { layer: LayerKind, entity: u64 },
    Bounds(ShapeHandle),
    SetInteractive { layer: LayerKind, interactive: bool },
    SetEmphasis { shape: ShapeHandle, emphasized: bool },
    FlyTo(Bounds),
    SetView { center: Coordinate, zoom: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Viewport {
    Center { center: Coordinate, zoom: u8 },
    Fitted(Bounds),
}

/// In-memory map surface: keeps layers, shapes and viewport, renders nothing.
#[derive(Debug, Default)]
pub struct HeadlessMap {
    layers: HashMap<LayerHandle, LayerKind>,
    shapes: BTreeMap<ShapeHandle, (LayerHandle, PolygonShape)>,
    interactive: HashSet<LayerHandle>,
    emphasized: HashSet<ShapeHandle>,
    viewport: Option<Viewport>,
    next_shape: u64,
    calls: RefCell<Vec<MapCall>>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: MapCall) {
        self.calls.borrow_mut().push(call);
    }

    fn kind_of(&self, layer: LayerHandle) -> LayerKind {
        self.layers.get(&layer).copied().unwrap_or(LayerKind::Region)
    }

    fn handle_of(&self, kind: LayerKind) -> Option<LayerHandle> {
        self.layers.iter().find(|(_, k)| **k == kind).map(|(h, _)| *h)
    }

    pub fn shapes_in(&self, kind: LayerKind) -> Vec<&PolygonShape> {
        let Some(handle) = self.handle_of(kind) else {
            return Vec::new();
        };
        self.shapes
            .values()
            .filter(|(layer, _)| *layer == handle)
            .map(|(_, shape)| shape)
            .collect()
    }

    /// Entity ids drawn in a layer, sorted.
    pub fn entities_in(&self, kind: LayerKind) -> Vec<u64> {
        let mut ids: Vec<u64> = self.shapes_in(kind).iter().map(|s| s.entity).collect();
        ids.sort_unstable();
        ids
    }

    pub fn shape_for(&self, kind: LayerKind, entity: u64) -> Option<ShapeHandle> {
        let handle = self.handle_of(kind)?;
        self.shapes
            .iter()
            .find(|(_, (layer, shape))| *layer == handle && shape.entity == entity)
            .map(|(h, _)| *h)
    }

    pub fn is_interactive(&self, kind: LayerKind) -> bool {
        self.handle_of(kind)
            .is_some_and(|h| self.interactive.contains(&h))
    }

    pub fn is_emphasized(&self, shape: ShapeHandle) -> bool {
        self.emphasized.contains(&shape)
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn last_flight(&self) -> Option<Bounds> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            MapCall::FlyTo(bounds) => Some(*bounds),
            _ => None,
        })
    }

    pub fn calls(&self) -> Vec<MapCall> {
        self.calls.borrow().clone()
    }
}

impl MapSurface for HeadlessMap {
    fn create_layer(&mut self, kind: LayerKind) -> LayerHandle {
        let handle = LayerHandle(self.layers.len() as u32);
        self.layers.insert(handle, kind);
        self.record(MapCall::CreateLayer(kind));
        handle
    }

    fn clear_layer(&mut self, layer: LayerHandle) {
        let removed: Vec<ShapeHandle> = self
            .shapes
            .iter()
            .filter(|(_, (owner, _))| *owner == layer)
            .map(|(h, _)| *h)
            .collect();
        for shape in removed {
            self.shapes.remove(&shape);
            self.emphasized.remove(&shape);
        }
        self.record(MapCall::ClearLayer(self.kind_of(layer)));
    }

    fn add_polygon(&mut self, layer: LayerHandle, shape: PolygonShape) -> ShapeHandle {
        let handle = ShapeHandle(self.next_shape);
        self.next_shape += 1;
        self.record(MapCall::AddPolygon {
            layer: self.kind_of(layer),
            entity: shape.entity,
        });
        self.shapes.insert(handle, (layer, shape));
        handle
    }

    fn shape_bounds(&self, shape: ShapeHandle) -> Option<Bounds> {
        self.record(MapCall::Bounds(shape));
        let (_, polygon) = self.shapes.get(&shape)?;
        // geo 使用 x = lon, y = lat
        let line: LineString<f64> = polygon
            .ring
            .iter()
            .map(|c| Coord { x: c.lon, y: c.lat })
            .collect();
        let rect = line.bounding_rect()?;
        Some(Bounds {
            south_west: Coordinate::new(rect.min().y, rect.min().x),
            north_east: Coordinate::new(rect.max().y, rect.max().x),
        })
    }

    fn set_interactive(&mut self, layer: LayerHandle, interactive: bool) {
        if interactive {
            self.interactive.insert(layer);
        } else {
            self.interactive.remove(&layer);
        }
        self.record(MapCall::SetInteractive {
            layer: self.kind_of(layer),
            interactive,
        });
    }

    fn set_emphasis(&mut self, shape: ShapeHandle, emphasized: bool) {
        if emphasized {
            self.emphasized.insert(shape);
        } else {
            self.emphasized.remove(&shape);
        }
        self.record(MapCall::SetEmphasis { shape, emphasized });
    }

    fn fly_to_bounds(&mut self, bounds: Bounds, _duration: Duration) {
        self.viewport = Some(Viewport::Fitted(bounds));
        self.record(MapCall::FlyTo(bounds));
    }

    fn set_view(&mut self, center: Coordinate, zoom: u8) {
        self.viewport = Some(Viewport::Center { center, zoom });
        self.record(MapCall::SetView { center, zoom });
    }
}
