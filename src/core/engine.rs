//! Single owner of navigation state, collections, layers and edits.
//!
//! The engine never awaits. Events return the fetches they need as
//! [`FetchCommand`]s and completed fetches come back through [`Engine::apply`],
//! where responses issued under an outdated context are dropped.

use crate::core::attributes::AttributeCache;
use crate::core::layers::{LayerManager, ViewSettings};
use crate::core::loader::{FetchContext, LoadError, LoadStatus};
use crate::core::navigation::{Effect, NavEvent, NavigationState};
use crate::domain::model::{
    District, DistrictId, LayerKind, Neighborhood, NeighborhoodBatch, NeighborhoodId, PriceField,
    PriceRecord, Region, RegionId,
};
use crate::domain::ports::{DetailPanel, MapSurface, Notice, ShapeHandle};
use crate::utils::error::{NavError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum UserEvent {
    Navigate(NavEvent),
    EditField {
        id: NeighborhoodId,
        field: PriceField,
        value: Option<f64>,
    },
    Submit(NeighborhoodId),
    DismissError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    Click(ShapeHandle),
    HoverIn(ShapeHandle),
    HoverOut(ShapeHandle),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchCommand {
    Regions,
    Districts {
        ctx: FetchContext,
        region: RegionId,
    },
    Neighborhoods {
        ctx: FetchContext,
        district: DistrictId,
    },
    SubmitPrice {
        id: NeighborhoodId,
        record: PriceRecord,
    },
}

#[derive(Debug)]
pub enum Loaded {
    Regions(Result<Vec<Region>>),
    Districts {
        ctx: FetchContext,
        region: RegionId,
        result: Result<Vec<District>>,
    },
    Neighborhoods {
        ctx: FetchContext,
        district: DistrictId,
        result: Result<NeighborhoodBatch>,
    },
    Submitted {
        id: NeighborhoodId,
        result: Result<()>,
    },
}

pub struct Engine<M: MapSurface, P: DetailPanel> {
    state: NavigationState,
    epoch: u64,
    regions: Vec<Region>,
    districts: Vec<District>,
    neighborhoods: Vec<Neighborhood>,
    prices: AttributeCache,
    status: LoadStatus,
    layers: LayerManager<M>,
    panel: P,
}

impl<M: MapSurface, P: DetailPanel> Engine<M, P> {
    pub fn new(map: M, panel: P, settings: ViewSettings) -> Self {
        Self {
            state: NavigationState::Republic,
            epoch: 0,
            regions: Vec::new(),
            districts: Vec::new(),
            neighborhoods: Vec::new(),
            prices: AttributeCache::new(),
            status: LoadStatus::default(),
            layers: LayerManager::new(map, settings),
            panel,
        }
    }

    /// Country view plus the one-time region fetch.
    pub fn start(&mut self) -> Vec<FetchCommand> {
        self.layers.reset_view();
        self.status.begin();
        vec![FetchCommand::Regions]
    }

    pub fn handle(&mut self, event: UserEvent) -> Vec<FetchCommand> {
        match event {
            UserEvent::Navigate(nav) => self.navigate(nav),
            UserEvent::EditField { id, field, value } => {
                if let Err(e) = self.edit(id, field, value) {
                    tracing::warn!("⚠️ Edit rejected: {}", e);
                }
                Vec::new()
            }
            UserEvent::Submit(id) => match self.prices.submission(id) {
                Ok(record) => vec![FetchCommand::SubmitPrice { id, record }],
                Err(e) => {
                    tracing::warn!("⚠️ Nothing to submit: {}", e);
                    self.panel.notify(Notice::SaveFailed {
                        id,
                        message: e.user_friendly_message(),
                    });
                    Vec::new()
                }
            },
            UserEvent::DismissError => {
                self.status.dismiss_error();
                Vec::new()
            }
        }
    }

    pub fn on_map_event(&mut self, event: MapEvent) -> Vec<FetchCommand> {
        match event {
            MapEvent::Click(shape) => {
                let Some((kind, entity)) = self.layers.resolve_click(shape) else {
                    return Vec::new();
                };
                let nav = match kind {
                    LayerKind::Region => NavEvent::SelectRegion(RegionId(entity)),
                    LayerKind::District => NavEvent::SelectDistrict(DistrictId(entity)),
                    LayerKind::Neighborhood => NavEvent::SelectNeighborhood(NeighborhoodId(entity)),
                };
                self.navigate(nav)
            }
            MapEvent::HoverIn(shape) => {
                self.layers.hover(shape, true);
                Vec::new()
            }
            MapEvent::HoverOut(shape) => {
                self.layers.hover(shape, false);
                Vec::new()
            }
        }
    }

    fn check_known(&self, event: &NavEvent) -> Result<()> {
        let (kind, id, known) = match *event {
            NavEvent::SelectRegion(id) => (RegionId::KIND, id.0, self.regions.iter().any(|r| r.id == id)),
            NavEvent::SelectDistrict(id) => (DistrictId::KIND, id.0, self.districts.iter().any(|d| d.id == id)),
            NavEvent::SelectNeighborhood(id) => (
                NeighborhoodId::KIND,
                id.0,
                self.neighborhoods.iter().any(|n| n.id == id),
            ),
            NavEvent::Back | NavEvent::CloseDetail => return Ok(()),
        };
        if known {
            Ok(())
        } else {
            Err(NavError::UnknownEntity { kind, id })
        }
    }

    pub fn navigate(&mut self, event: NavEvent) -> Vec<FetchCommand> {
        if let Err(e) = self.check_known(&event) {
            tracing::warn!("⚠️ Ignoring {:?}: {}", event, e);
            return Vec::new();
        }

        let Some(transition) = self.state.transition(&event) else {
            tracing::debug!("{:?} is a no-op in state {}", event, self.state);
            return Vec::new();
        };

        if transition.leaves_scope() {
            self.epoch += 1;
        }
        tracing::info!("🧭 {} → {}", self.state, transition.next);
        self.state = transition.next;

        let ctx = FetchContext {
            epoch: self.epoch,
            state: self.state,
        };
        let mut commands = Vec::new();
        for effect in transition.effects {
            self.run_effect(effect, ctx, &mut commands);
        }
        commands
    }

    fn run_effect(&mut self, effect: Effect, ctx: FetchContext, commands: &mut Vec<FetchCommand>) {
        match effect {
            Effect::ClearLayer(kind) => self.layers.clear(kind),
            Effect::DiscardDistricts => self.districts.clear(),
            Effect::DiscardNeighborhoods => {
                self.neighborhoods.clear();
                self.prices.clear();
            }
            Effect::HighlightRegion(id) => {
                let selected = self.regions.iter().filter(|r| r.id == id);
                self.layers.replace(LayerKind::Region, selected, false);
                self.layers.focus(LayerKind::Region, id.0);
            }
            Effect::HighlightDistrict(id) => {
                let selected = self.districts.iter().filter(|d| d.id == id);
                self.layers.replace(LayerKind::District, selected, false);
                self.layers.focus(LayerKind::District, id.0);
            }
            Effect::LoadDistricts(region) => {
                self.status.begin();
                commands.push(FetchCommand::Districts { ctx, region });
            }
            Effect::LoadNeighborhoods(district) => {
                self.status.begin();
                commands.push(FetchCommand::Neighborhoods { ctx, district });
            }
            Effect::ShowRegions => {
                self.layers.replace(LayerKind::Region, &self.regions, true);
            }
            Effect::ShowDistricts => {
                self.layers.replace(LayerKind::District, &self.districts, true);
            }
            Effect::ResetViewport => self.layers.reset_view(),
            Effect::OpenDetail(id) => {
                if let Some(neighborhood) = self.neighborhoods.iter().find(|n| n.id == id) {
                    let record = self.prices.get(id).cloned().unwrap_or_default();
                    self.panel.open(neighborhood, &record);
                }
            }
            Effect::FocusNeighborhood(id) => {
                self.layers.focus(LayerKind::Neighborhood, id.0);
            }
            Effect::CloseDetail => self.panel.close(),
        }
    }

    fn edit(&mut self, id: NeighborhoodId, field: PriceField, value: Option<f64>) -> Result<()> {
        self.prices.set(id, field, value)?;
        if self.state.neighborhood() == Some(id) {
            if let Some(record) = self.prices.get(id) {
                self.panel.refresh(record);
            }
        }
        Ok(())
    }

    pub fn apply(&mut self, loaded: Loaded) {
        match loaded {
            Loaded::Regions(result) => self.apply_regions(result),
            Loaded::Districts { ctx, region, result } => {
                if self.is_stale(&ctx, "districts") {
                    return;
                }
                match result {
                    Ok(districts) => {
                        self.status.succeeded();
                        tracing::info!("📥 {} districts for region {}", districts.len(), region);
                        self.districts = districts;
                        let interactive = self.state.interactive_layer() == LayerKind::District;
                        self.layers.replace(LayerKind::District, &self.districts, interactive);
                    }
                    Err(e) => {
                        tracing::error!("❌ Loading districts for region {} failed: {}", region, e);
                        self.status.failed("districts", &e);
                        self.districts.clear();
                        self.layers.clear(LayerKind::District);
                    }
                }
            }
            Loaded::Neighborhoods { ctx, district, result } => {
                if self.is_stale(&ctx, "neighborhoods") {
                    return;
                }
                match result {
                    Ok(batch) => {
                        self.status.succeeded();
                        tracing::info!(
                            "📥 {} neighborhoods for district {} ({} without prices)",
                            batch.neighborhoods.len(),
                            district,
                            batch.failed_prices.len()
                        );
                        self.neighborhoods = batch.neighborhoods;
                        self.prices.seed(batch.prices);
                        // 區的高亮由社區圖層取代
                        self.layers.clear(LayerKind::District);
                        let interactive = self.state.interactive_layer() == LayerKind::Neighborhood;
                        self.layers.replace(LayerKind::Neighborhood, &self.neighborhoods, interactive);
                    }
                    Err(e) => {
                        tracing::error!("❌ Loading neighborhoods for district {} failed: {}", district, e);
                        self.status.failed("neighborhoods", &e);
                        self.neighborhoods.clear();
                        self.prices.clear();
                        self.layers.clear(LayerKind::Neighborhood);
                    }
                }
            }
            Loaded::Submitted { id, result } => {
                // 已離開該社區所在的區，不再通知
                if self.prices.get(id).is_none() {
                    tracing::debug!(
                        "Dropping save result for neighborhood {} outside the current district",
                        id
                    );
                    return;
                }
                match result {
                    Ok(()) => self.panel.notify(Notice::Saved(id)),
                    Err(e) => self.panel.notify(Notice::SaveFailed {
                        id,
                        message: e.user_friendly_message(),
                    }),
                }
            }
        }
    }

    fn apply_regions(&mut self, result: Result<Vec<Region>>) {
        match result {
            Ok(regions) => {
                self.status.succeeded();
                tracing::info!("📥 {} regions", regions.len());
                self.regions = regions;
                if self.state == NavigationState::Republic {
                    self.layers.replace(LayerKind::Region, &self.regions, true);
                }
            }
            Err(e) => {
                tracing::error!("❌ Loading regions failed: {}", e);
                self.status.failed("regions", &e);
                self.regions.clear();
                self.layers.clear(LayerKind::Region);
            }
        }
    }

    fn is_stale(&mut self, ctx: &FetchContext, what: &str) -> bool {
        if ctx.is_current(self.epoch) {
            return false;
        }
        tracing::debug!(
            "Discarding stale {} response issued in {} (epoch {} < {})",
            what,
            ctx.state,
            ctx.epoch,
            self.epoch
        );
        self.status.discarded();
        true
    }

    /// A fetch task died without a result.
    pub fn fetch_aborted(&mut self) {
        self.status.discarded();
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn neighborhoods(&self) -> &[Neighborhood] {
        &self.neighborhoods
    }

    pub fn price_record(&self, id: NeighborhoodId) -> Option<&PriceRecord> {
        self.prices.get(id)
    }

    pub fn cached_prices(&self) -> usize {
        self.prices.len()
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    pub fn error(&self) -> Option<&LoadError> {
        self.status.error()
    }

    pub fn layers(&self) -> &LayerManager<M> {
        &self.layers
    }

    pub fn map(&self) -> &M {
        self.layers.map()
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }
}
