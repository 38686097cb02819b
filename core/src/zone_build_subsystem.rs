//! Zone auto-build: places the zone's default building on empty zoned
//! parcels that touch a road, while the zone has positive demand and the
//! treasury can pay for it.
//!
//! Execution: every `auto_build_interval_ticks`, at most
//! `auto_build_per_pass` placements per pass.

use crate::{
    clock::CityTime,
    config::SimConfig,
    error::SimResult,
    event::CityEvent,
    grid::{in_bounds, Footprint},
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::{CityId, Tile},
};
use std::{any::Any, collections::HashSet, sync::Arc};

pub struct ZoneBuildSubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

impl ZoneBuildSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }
}

impl CitySubsystem for ZoneBuildSubsystem {
    fn name(&self) -> &'static str {
        "zone_build"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        let city = store.require_city(&self.city_id)?;
        let roads: HashSet<Tile> = store.roads(&self.city_id)?.iter().map(|r| (r.x, r.y)).collect();
        let mut occupied: HashSet<Tile> = roads.clone();
        for building in store.buildings(&self.city_id)? {
            occupied.extend(building.footprint().tiles());
        }

        let mut treasury = city.treasury;
        let mut events = Vec::new();
        for parcel in store.parcels(&self.city_id)? {
            if events.len() >= self.config.sim.auto_build_per_pass {
                break;
            }
            let Some(zone) = parcel.zoning else {
                continue;
            };
            if city.demand.for_zone(zone) <= 0.0 {
                continue;
            }
            let Some(kind) = self
                .config
                .zone_defaults
                .get(&zone)
                .and_then(|id| self.config.building_type(id))
            else {
                continue;
            };
            let footprint = Footprint::new(parcel.x, parcel.y, kind.width, kind.height);
            let fits = footprint
                .tiles()
                .all(|t| in_bounds(t, city.width, city.height) && !occupied.contains(&t));
            if !fits || !footprint.ring().any(|t| roads.contains(&t)) {
                continue;
            }
            if treasury < kind.construction_cost {
                log::debug!(
                    "tick={} zone_build: treasury {treasury:.0} cannot cover {}",
                    time.tick, kind.id
                );
                break;
            }

            let building_id = store.insert_building(
                &self.city_id,
                parcel.parcel_id,
                &kind.id,
                kind.width,
                kind.height,
                1,
                0.0,
            )?;
            store.adjust_treasury(&self.city_id, -kind.construction_cost)?;
            treasury -= kind.construction_cost;
            occupied.extend(footprint.tiles());
            events.push(CityEvent::ZoneBuildingPlaced {
                building_id,
                parcel_id: parcel.parcel_id,
                building_type: kind.id.clone(),
                cost: kind.construction_cost,
            });
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
