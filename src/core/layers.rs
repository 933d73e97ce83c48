use crate::core::geometry;
use crate::domain::model::{
    Bounds, Coordinate, District, LayerKind, Neighborhood, PolygonShape, Region, ShapeStyle,
};
use crate::domain::ports::{LayerHandle, MapSurface, ShapeHandle};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Anything that can be drawn as one polygon in a layer.
pub trait Drawable {
    fn entity(&self) -> u64;
    fn label(&self) -> &str;
    fn geometry(&self) -> Option<&str>;
}

impl Drawable for Region {
    fn entity(&self) -> u64 {
        self.id.0
    }
    fn label(&self) -> &str {
        &self.name
    }
    fn geometry(&self) -> Option<&str> {
        self.polygon.as_deref()
    }
}

impl Drawable for District {
    fn entity(&self) -> u64 {
        self.id.0
    }
    fn label(&self) -> &str {
        &self.name
    }
    fn geometry(&self) -> Option<&str> {
        self.geometry.as_deref()
    }
}

impl Drawable for Neighborhood {
    fn entity(&self) -> u64 {
        self.id.0
    }
    fn label(&self) -> &str {
        &self.name
    }
    fn geometry(&self) -> Option<&str> {
        self.geometry.as_deref()
    }
}

/// Viewport and styling settings for the layers.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub country_center: Coordinate,
    pub country_zoom: u8,
    pub animation: Duration,
    pub styles: HashMap<LayerKind, ShapeStyle>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            country_center: Coordinate::new(41.3111, 69.2401),
            country_zoom: 6,
            animation: Duration::from_secs(1),
            styles: LayerKind::ALL
                .into_iter()
                .map(|kind| (kind, ShapeStyle::for_layer(kind)))
                .collect(),
        }
    }
}

impl ViewSettings {
    pub fn style(&self, kind: LayerKind) -> ShapeStyle {
        self.styles
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| ShapeStyle::for_layer(kind))
    }
}

struct LayerSlot {
    handle: LayerHandle,
    shapes: BTreeMap<u64, ShapeHandle>,
    /// Envelope of each drawn ring, used when the surface cannot measure a shape.
    envelopes: HashMap<u64, Bounds>,
    interactive: bool,
}

/// Owns the region, district and neighborhood layers on a map.
pub struct LayerManager<M: MapSurface> {
    map: M,
    slots: HashMap<LayerKind, LayerSlot>,
    owners: HashMap<ShapeHandle, (LayerKind, u64)>,
    settings: ViewSettings,
}

impl<M: MapSurface> LayerManager<M> {
    pub fn new(mut map: M, settings: ViewSettings) -> Self {
        let slots = LayerKind::ALL
            .into_iter()
            .map(|kind| {
                let handle = map.create_layer(kind);
                (
                    kind,
                    LayerSlot {
                        handle,
                        shapes: BTreeMap::new(),
                        envelopes: HashMap::new(),
                        interactive: false,
                    },
                )
            })
            .collect();

        Self {
            map,
            slots,
            owners: HashMap::new(),
            settings,
        }
    }

    fn slot_mut(&mut self, kind: LayerKind) -> &mut LayerSlot {
        self.slots
            .get_mut(&kind)
            .unwrap_or_else(|| unreachable!("every layer kind is created in LayerManager::new"))
    }

    /// Clear the layer, then install `items`. Returns how many were drawn.
    pub fn replace<'a, T, I>(&mut self, kind: LayerKind, items: I, interactive: bool) -> usize
    where
        T: Drawable + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.clear(kind);
        let style = self.settings.style(kind);
        let handle = self.slot_mut(kind).handle;

        for item in items {
            let entity = item.entity();
            if self.slot_mut(kind).shapes.contains_key(&entity) {
                tracing::warn!("⚠️ Duplicate {} id {} ignored", kind.name(), entity);
                continue;
            }

            let Some(text) = item.geometry() else {
                tracing::warn!("⚠️ {} '{}' has no geometry", kind.name(), item.label());
                continue;
            };

            let parsed = geometry::parse(Some(text));
            let ring = geometry::valid_coordinates(&parsed);
            if ring.is_empty() {
                tracing::warn!(
                    "⚠️ Malformed geometry for {} '{}' ({}), not drawn",
                    kind.name(),
                    item.label(),
                    entity
                );
                continue;
            }
            if ring.len() < parsed.len() {
                tracing::debug!(
                    "{} '{}': dropped {} invalid coordinate pairs",
                    kind.name(),
                    item.label(),
                    parsed.len() - ring.len()
                );
            }

            let envelope = Bounds::from_coordinates(&ring);
            let shape = self.map.add_polygon(
                handle,
                PolygonShape {
                    layer: kind,
                    entity,
                    hint: item.label().to_string(),
                    ring,
                    style: style.clone(),
                },
            );
            self.owners.insert(shape, (kind, entity));
            let slot = self.slot_mut(kind);
            slot.shapes.insert(entity, shape);
            if let Some(envelope) = envelope {
                slot.envelopes.insert(entity, envelope);
            }
        }

        self.set_interactive(kind, interactive);
        let drawn = self.shape_count(kind);
        tracing::debug!("🗺️ {} layer now holds {} shapes", kind.name(), drawn);
        drawn
    }

    pub fn clear(&mut self, kind: LayerKind) {
        let slot = self.slot_mut(kind);
        let handle = slot.handle;
        let removed: Vec<ShapeHandle> = std::mem::take(&mut slot.shapes).into_values().collect();
        slot.envelopes.clear();
        self.map.clear_layer(handle);
        for shape in removed {
            self.owners.remove(&shape);
        }
    }

    pub fn set_interactive(&mut self, kind: LayerKind, interactive: bool) {
        let slot = self.slot_mut(kind);
        slot.interactive = interactive;
        let handle = slot.handle;
        self.map.set_interactive(handle, interactive);
    }

    /// Animate the viewport to an entity's shape. The shape is already
    /// attached because handles only exist after insertion.
    pub fn focus(&mut self, kind: LayerKind, entity: u64) -> bool {
        let Some(shape) = self.slots.get(&kind).and_then(|s| s.shapes.get(&entity)).copied() else {
            tracing::debug!("No {} shape for {} to focus", kind.name(), entity);
            return false;
        };

        let measured = self.map.shape_bounds(shape).or_else(|| {
            tracing::debug!("Map could not measure {} {}, using ring envelope", kind.name(), entity);
            self.slots.get(&kind).and_then(|s| s.envelopes.get(&entity)).copied()
        });
        match measured {
            Some(bounds) => {
                self.map.fly_to_bounds(bounds, self.settings.animation);
                true
            }
            None => false,
        }
    }

    pub fn reset_view(&mut self) {
        let center = self.settings.country_center;
        let zoom = self.settings.country_zoom;
        self.map.set_view(center, zoom);
    }

    /// Entity bound to a clicked shape, if its layer accepts clicks.
    pub fn resolve_click(&self, shape: ShapeHandle) -> Option<(LayerKind, u64)> {
        let (kind, entity) = *self.owners.get(&shape)?;
        if self.is_interactive(kind) {
            Some((kind, entity))
        } else {
            None
        }
    }

    pub fn hover(&mut self, shape: ShapeHandle, entered: bool) {
        if self.owners.contains_key(&shape) {
            self.map.set_emphasis(shape, entered);
        }
    }

    pub fn contains(&self, kind: LayerKind, entity: u64) -> bool {
        self.slots
            .get(&kind)
            .is_some_and(|s| s.shapes.contains_key(&entity))
    }

    pub fn entities(&self, kind: LayerKind) -> Vec<u64> {
        self.slots
            .get(&kind)
            .map(|s| s.shapes.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn shape_count(&self, kind: LayerKind) -> usize {
        self.slots.get(&kind).map_or(0, |s| s.shapes.len())
    }

    pub fn shape_of(&self, kind: LayerKind, entity: u64) -> Option<ShapeHandle> {
        self.slots.get(&kind)?.shapes.get(&entity).copied()
    }

    pub fn is_interactive(&self, kind: LayerKind) -> bool {
        self.slots.get(&kind).is_some_and(|s| s.interactive)
    }

    pub fn map(&self) -> &M {
        &self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::headless_map::{HeadlessMap, MapCall};
    use crate::domain::model::RegionId;

    fn region(id: u64, polygon: Option<&str>) -> Region {
        Region {
            id: RegionId(id),
            name: format!("Region {}", id),
            polygon: polygon.map(str::to_string),
        }
    }

    fn manager() -> LayerManager<HeadlessMap> {
        LayerManager::new(HeadlessMap::new(), ViewSettings::default())
    }

    /// Surface that draws shapes but cannot report their bounds.
    #[derive(Default)]
    struct UnmeasuredMap {
        inner: HeadlessMap,
        flights: Vec<Bounds>,
    }

    impl MapSurface for UnmeasuredMap {
        fn create_layer(&mut self, kind: LayerKind) -> LayerHandle {
            self.inner.create_layer(kind)
        }
        fn clear_layer(&mut self, layer: LayerHandle) {
            self.inner.clear_layer(layer)
        }
        fn add_polygon(&mut self, layer: LayerHandle, shape: PolygonShape) -> ShapeHandle {
            self.inner.add_polygon(layer, shape)
        }
        fn shape_bounds(&self, _shape: ShapeHandle) -> Option<Bounds> {
            None
        }
        fn set_interactive(&mut self, layer: LayerHandle, interactive: bool) {
            self.inner.set_interactive(layer, interactive)
        }
        fn set_emphasis(&mut self, shape: ShapeHandle, emphasized: bool) {
            self.inner.set_emphasis(shape, emphasized)
        }
        fn fly_to_bounds(&mut self, bounds: Bounds, _duration: Duration) {
            self.flights.push(bounds);
        }
        fn set_view(&mut self, center: Coordinate, zoom: u8) {
            self.inner.set_view(center, zoom)
        }
    }

    #[test]
    fn test_replace_clears_before_installing() {
        let mut layers = manager();
        let first = vec![region(1, Some("((60 40, 61 40, 61 41))")), region(2, Some("((62 40, 63 40, 63 41))"))];
        let second = vec![region(3, Some("((64 40, 65 40, 65 41))"))];

        assert_eq!(layers.replace(LayerKind::Region, &first, true), 2);
        assert_eq!(layers.replace(LayerKind::Region, &second, true), 1);

        assert_eq!(layers.entities(LayerKind::Region), vec![3]);
        assert_eq!(layers.map().shapes_in(LayerKind::Region).len(), 1);
    }

    #[test]
    fn test_replace_skips_missing_and_malformed_geometry() {
        let mut layers = manager();
        let items = vec![
            region(1, None),
            region(2, Some("POLYGON ((abc def, ghi jkl))")),
            region(3, Some("no parentheses")),
            region(4, Some("POLYGON ((69 41, 70 41, 70 42))")),
        ];

        assert_eq!(layers.replace(LayerKind::Region, &items, true), 1);
        assert!(layers.contains(LayerKind::Region, 4));
        assert!(!layers.contains(LayerKind::Region, 2));
    }

    #[test]
    fn test_at_most_one_shape_per_entity() {
        let mut layers = manager();
        let items = vec![region(1, Some("((60 40, 61 40, 61 41))")), region(1, Some("((62 40, 63 40, 63 41))"))];
        assert_eq!(layers.replace(LayerKind::Region, &items, true), 1);
    }

    #[test]
    fn test_focus_measures_after_insert() {
        let mut layers = manager();
        let items = vec![region(7, Some("((69 41, 70 41, 70 42))"))];
        layers.replace(LayerKind::Region, &items, false);

        assert!(layers.focus(LayerKind::Region, 7));
        assert!(!layers.focus(LayerKind::Region, 8));

        let calls = layers.map().calls();
        let added = calls.iter().position(|c| matches!(c, MapCall::AddPolygon { entity: 7, .. })).unwrap();
        let measured = calls.iter().position(|c| matches!(c, MapCall::Bounds(_))).unwrap();
        assert!(added < measured);

        let expected = Bounds {
            south_west: Coordinate::new(41.0, 69.0),
            north_east: Coordinate::new(42.0, 70.0),
        };
        assert_eq!(layers.map().last_flight(), Some(expected));
    }

    #[test]
    fn test_focus_falls_back_to_ring_envelope() {
        let mut layers = LayerManager::new(UnmeasuredMap::default(), ViewSettings::default());
        let items = vec![region(7, Some("POLYGON ((69 41, 70.5 41, 70.5 42, 69 41))"))];
        layers.replace(LayerKind::Region, &items, false);

        assert!(layers.focus(LayerKind::Region, 7));
        assert_eq!(
            layers.map().flights,
            vec![Bounds {
                south_west: Coordinate::new(41.0, 69.0),
                north_east: Coordinate::new(42.0, 70.5),
            }]
        );

        layers.clear(LayerKind::Region);
        assert!(!layers.focus(LayerKind::Region, 7));
        assert_eq!(layers.map().flights.len(), 1);
    }

    #[test]
    fn test_click_resolution_respects_interactivity() {
        let mut layers = manager();
        let items = vec![region(5, Some("((69 41, 70 41, 70 42))"))];
        layers.replace(LayerKind::Region, &items, true);
        let shape = layers.shape_of(LayerKind::Region, 5).unwrap();

        assert_eq!(layers.resolve_click(shape), Some((LayerKind::Region, 5)));
        layers.set_interactive(LayerKind::Region, false);
        assert_eq!(layers.resolve_click(shape), None);

        layers.clear(LayerKind::Region);
        layers.set_interactive(LayerKind::Region, true);
        assert_eq!(layers.resolve_click(shape), None);
    }

    #[test]
    fn test_hover_only_changes_emphasis() {
        let mut layers = manager();
        let items = vec![region(5, Some("((69 41, 70 41, 70 42))"))];
        layers.replace(LayerKind::Region, &items, true);
        let shape = layers.shape_of(LayerKind::Region, 5).unwrap();

        layers.hover(shape, true);
        assert!(layers.map().is_emphasized(shape));
        layers.hover(shape, false);
        assert!(!layers.map().is_emphasized(shape));
        assert_eq!(layers.shape_count(LayerKind::Region), 1);
    }
}
