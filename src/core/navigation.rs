//! Selection hierarchy: Republic → region → district → focused neighborhood.
//!
//! Transitions are pure. The engine executes the returned [`Effect`]s in order.

use crate::domain::model::{DistrictId, LayerKind, NeighborhoodId, RegionId};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationState {
    #[default]
    Republic,
    RegionSelected {
        region: RegionId,
    },
    DistrictSelected {
        region: RegionId,
        district: DistrictId,
    },
    NeighborhoodFocused {
        region: RegionId,
        district: DistrictId,
        neighborhood: NeighborhoodId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    SelectRegion(RegionId),
    SelectDistrict(DistrictId),
    SelectNeighborhood(NeighborhoodId),
    Back,
    CloseDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ClearLayer(LayerKind),
    DiscardDistricts,
    DiscardNeighborhoods,
    /// Region layer holds only this region; viewport flies to it.
    HighlightRegion(RegionId),
    /// District layer holds only this district; viewport flies to it.
    HighlightDistrict(DistrictId),
    LoadDistricts(RegionId),
    LoadNeighborhoods(DistrictId),
    ShowRegions,
    ShowDistricts,
    ResetViewport,
    OpenDetail(NeighborhoodId),
    FocusNeighborhood(NeighborhoodId),
    CloseDetail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: NavigationState,
    pub effects: Vec<Effect>,
}

impl Transition {
    /// True when fetches issued under the previous scope are no longer wanted.
    pub fn leaves_scope(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, Effect::DiscardDistricts | Effect::DiscardNeighborhoods))
    }
}

impl NavigationState {
    pub fn region(&self) -> Option<RegionId> {
        match *self {
            NavigationState::Republic => None,
            NavigationState::RegionSelected { region }
            | NavigationState::DistrictSelected { region, .. }
            | NavigationState::NeighborhoodFocused { region, .. } => Some(region),
        }
    }

    pub fn district(&self) -> Option<DistrictId> {
        match *self {
            NavigationState::DistrictSelected { district, .. }
            | NavigationState::NeighborhoodFocused { district, .. } => Some(district),
            _ => None,
        }
    }

    pub fn neighborhood(&self) -> Option<NeighborhoodId> {
        match *self {
            NavigationState::NeighborhoodFocused { neighborhood, .. } => Some(neighborhood),
            _ => None,
        }
    }

    pub fn depth(&self) -> u8 {
        match self {
            NavigationState::Republic => 0,
            NavigationState::RegionSelected { .. } => 1,
            NavigationState::DistrictSelected { .. } => 2,
            NavigationState::NeighborhoodFocused { .. } => 3,
        }
    }

    /// The layer the operator can currently click in.
    pub fn interactive_layer(&self) -> LayerKind {
        match self {
            NavigationState::Republic => LayerKind::Region,
            NavigationState::RegionSelected { .. } => LayerKind::District,
            NavigationState::DistrictSelected { .. } | NavigationState::NeighborhoodFocused { .. } => {
                LayerKind::Neighborhood
            }
        }
    }

    /// `None` means the event is a no-op in this state.
    pub fn transition(&self, event: &NavEvent) -> Option<Transition> {
        match *event {
            NavEvent::SelectRegion(region) => self.select_region(region),
            NavEvent::SelectDistrict(district) => self.select_district(district),
            NavEvent::SelectNeighborhood(neighborhood) => self.select_neighborhood(neighborhood),
            NavEvent::Back => self.back(),
            NavEvent::CloseDetail => self.close_detail(),
        }
    }

    fn select_region(&self, region: RegionId) -> Option<Transition> {
        if self.region() == Some(region) {
            return None;
        }

        let mut effects = Vec::new();
        if self.neighborhood().is_some() {
            effects.push(Effect::CloseDetail);
        }
        effects.extend([
            Effect::ClearLayer(LayerKind::District),
            Effect::ClearLayer(LayerKind::Neighborhood),
            Effect::DiscardDistricts,
            Effect::DiscardNeighborhoods,
            Effect::HighlightRegion(region),
            Effect::LoadDistricts(region),
        ]);

        Some(Transition {
            next: NavigationState::RegionSelected { region },
            effects,
        })
    }

    fn select_district(&self, district: DistrictId) -> Option<Transition> {
        let region = self.region()?;
        if self.district() == Some(district) {
            return None;
        }

        let mut effects = Vec::new();
        if self.neighborhood().is_some() {
            effects.push(Effect::CloseDetail);
        }
        effects.extend([
            Effect::ClearLayer(LayerKind::Region),
            Effect::ClearLayer(LayerKind::Neighborhood),
            Effect::DiscardNeighborhoods,
            Effect::HighlightDistrict(district),
            Effect::LoadNeighborhoods(district),
        ]);

        Some(Transition {
            next: NavigationState::DistrictSelected { region, district },
            effects,
        })
    }

    fn select_neighborhood(&self, neighborhood: NeighborhoodId) -> Option<Transition> {
        let (region, district) = match *self {
            NavigationState::DistrictSelected { region, district } => (region, district),
            NavigationState::NeighborhoodFocused {
                region,
                district,
                neighborhood: current,
            } if current != neighborhood => (region, district),
            _ => return None,
        };

        Some(Transition {
            next: NavigationState::NeighborhoodFocused {
                region,
                district,
                neighborhood,
            },
            effects: vec![Effect::OpenDetail(neighborhood), Effect::FocusNeighborhood(neighborhood)],
        })
    }

    fn back(&self) -> Option<Transition> {
        match *self {
            NavigationState::Republic => None,
            NavigationState::RegionSelected { .. } => Some(Transition {
                next: NavigationState::Republic,
                effects: vec![
                    Effect::ClearLayer(LayerKind::Region),
                    Effect::ClearLayer(LayerKind::District),
                    Effect::ClearLayer(LayerKind::Neighborhood),
                    Effect::DiscardDistricts,
                    Effect::DiscardNeighborhoods,
                    Effect::ShowRegions,
                    Effect::ResetViewport,
                ],
            }),
            NavigationState::DistrictSelected { region, .. } => Some(Transition {
                next: NavigationState::RegionSelected { region },
                effects: vec![
                    Effect::ClearLayer(LayerKind::Region),
                    Effect::ClearLayer(LayerKind::District),
                    Effect::ClearLayer(LayerKind::Neighborhood),
                    Effect::DiscardNeighborhoods,
                    Effect::ShowRegions,
                    Effect::ShowDistricts,
                    Effect::ResetViewport,
                ],
            }),
            NavigationState::NeighborhoodFocused { .. } => self.close_detail(),
        }
    }

    fn close_detail(&self) -> Option<Transition> {
        match *self {
            NavigationState::NeighborhoodFocused { region, district, .. } => Some(Transition {
                next: NavigationState::DistrictSelected { region, district },
                effects: vec![Effect::CloseDetail],
            }),
            _ => None,
        }
    }
}

impl fmt::Display for NavigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationState::Republic => write!(f, "Republic"),
            NavigationState::RegionSelected { region } => write!(f, "Region({})", region),
            NavigationState::DistrictSelected { region, district } => {
                write!(f, "Region({}) > District({})", region, district)
            }
            NavigationState::NeighborhoodFocused {
                region,
                district,
                neighborhood,
            } => write!(
                f,
                "Region({}) > District({}) > Neighborhood({})",
                region, district, neighborhood
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: RegionId = RegionId(14);
    const D: DistrictId = DistrictId(201);
    const N: NeighborhoodId = NeighborhoodId(501);

    fn all_states() -> Vec<NavigationState> {
        vec![
            NavigationState::Republic,
            NavigationState::RegionSelected { region: R },
            NavigationState::DistrictSelected { region: R, district: D },
            NavigationState::NeighborhoodFocused {
                region: R,
                district: D,
                neighborhood: N,
            },
        ]
    }

    #[test]
    fn test_select_region_from_republic() {
        let t = NavigationState::Republic
            .transition(&NavEvent::SelectRegion(R))
            .unwrap();

        assert_eq!(t.next, NavigationState::RegionSelected { region: R });
        assert!(t.effects.contains(&Effect::LoadDistricts(R)));
        assert!(t.effects.contains(&Effect::HighlightRegion(R)));
        assert!(t.effects.contains(&Effect::ClearLayer(LayerKind::District)));
        assert!(t.effects.contains(&Effect::ClearLayer(LayerKind::Neighborhood)));
        assert!(!t.effects.contains(&Effect::ClearLayer(LayerKind::Region)));
        assert!(t.leaves_scope());
    }

    #[test]
    fn test_select_district_requires_region() {
        assert!(NavigationState::Republic
            .transition(&NavEvent::SelectDistrict(D))
            .is_none());

        let t = NavigationState::RegionSelected { region: R }
            .transition(&NavEvent::SelectDistrict(D))
            .unwrap();
        assert_eq!(t.next, NavigationState::DistrictSelected { region: R, district: D });
        assert!(t.effects.contains(&Effect::LoadNeighborhoods(D)));
        assert!(t.effects.contains(&Effect::ClearLayer(LayerKind::Region)));
    }

    #[test]
    fn test_select_neighborhood_keeps_layers() {
        let t = NavigationState::DistrictSelected { region: R, district: D }
            .transition(&NavEvent::SelectNeighborhood(N))
            .unwrap();

        assert_eq!(t.next.neighborhood(), Some(N));
        assert_eq!(t.effects, vec![Effect::OpenDetail(N), Effect::FocusNeighborhood(N)]);
        assert!(!t.leaves_scope());
    }

    #[test]
    fn test_reentrant_selection_is_noop() {
        let region = NavigationState::RegionSelected { region: R };
        assert!(region.transition(&NavEvent::SelectRegion(R)).is_none());

        let district = NavigationState::DistrictSelected { region: R, district: D };
        assert!(district.transition(&NavEvent::SelectDistrict(D)).is_none());
        assert!(district.transition(&NavEvent::SelectRegion(R)).is_none());

        let focused = NavigationState::NeighborhoodFocused {
            region: R,
            district: D,
            neighborhood: N,
        };
        assert!(focused.transition(&NavEvent::SelectNeighborhood(N)).is_none());
    }

    #[test]
    fn test_sibling_selection_restarts_scope() {
        let t = NavigationState::DistrictSelected { region: R, district: D }
            .transition(&NavEvent::SelectRegion(RegionId(3)))
            .unwrap();
        assert_eq!(t.next, NavigationState::RegionSelected { region: RegionId(3) });
        assert!(t.effects.contains(&Effect::DiscardNeighborhoods));

        let focused = NavigationState::NeighborhoodFocused {
            region: R,
            district: D,
            neighborhood: N,
        };
        let t = focused.transition(&NavEvent::SelectDistrict(DistrictId(202))).unwrap();
        assert_eq!(t.effects[0], Effect::CloseDetail);
        assert_eq!(
            t.next,
            NavigationState::DistrictSelected {
                region: R,
                district: DistrictId(202)
            }
        );
    }

    #[test]
    fn test_back_goes_exactly_one_level_up() {
        for state in all_states() {
            match state.transition(&NavEvent::Back) {
                None => assert_eq!(state, NavigationState::Republic),
                Some(t) => assert_eq!(t.next.depth() + 1, state.depth()),
            }
        }
    }

    #[test]
    fn test_back_resets_viewport_and_layers() {
        let t = NavigationState::DistrictSelected { region: R, district: D }
            .transition(&NavEvent::Back)
            .unwrap();
        assert_eq!(t.next, NavigationState::RegionSelected { region: R });
        for kind in LayerKind::ALL {
            assert!(t.effects.contains(&Effect::ClearLayer(kind)));
        }
        assert!(t.effects.contains(&Effect::ShowRegions));
        assert!(t.effects.contains(&Effect::ResetViewport));
        assert!(!t.effects.contains(&Effect::DiscardDistricts));

        let t = NavigationState::RegionSelected { region: R }
            .transition(&NavEvent::Back)
            .unwrap();
        assert_eq!(t.next, NavigationState::Republic);
        assert!(t.effects.contains(&Effect::DiscardDistricts));
    }

    #[test]
    fn test_close_detail_only_closes_panel() {
        let focused = NavigationState::NeighborhoodFocused {
            region: R,
            district: D,
            neighborhood: N,
        };
        let t = focused.transition(&NavEvent::CloseDetail).unwrap();
        assert_eq!(t.next, NavigationState::DistrictSelected { region: R, district: D });
        assert_eq!(t.effects, vec![Effect::CloseDetail]);

        assert!(NavigationState::RegionSelected { region: R }
            .transition(&NavEvent::CloseDetail)
            .is_none());
    }

    #[test]
    fn test_transitions_are_deterministic() {
        let events = [
            NavEvent::SelectRegion(RegionId(2)),
            NavEvent::SelectDistrict(DistrictId(9)),
            NavEvent::SelectNeighborhood(NeighborhoodId(77)),
            NavEvent::Back,
            NavEvent::CloseDetail,
        ];
        for state in all_states() {
            for event in &events {
                assert_eq!(state.transition(event), state.transition(event));
            }
        }
    }
}
