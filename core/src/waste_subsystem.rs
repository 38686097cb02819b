//! Waste collection simulator.
//!
//! Unlike power and water, collection follows the ROAD network: trucks leave
//! a depot onto any road tile touching it and spread 4-directionally along
//! roads. A building is serviced when a reached road tile touches its
//! footprint. Demand is the daily garbage a building produces.
//!
//! Execution: every `utility_interval_ticks` ticks; garbage accumulates once
//! per day, guarded by the `garbage` job marker.

use crate::{
    clock::CityTime,
    config::SimConfig,
    error::SimResult,
    event::{BuildingStatus, CityEvent},
    grid::neighbors4,
    model::BuildingRecord,
    rng::SubsystemRng,
    store::{CityStore, ServiceFlag},
    subsystem::CitySubsystem,
    types::{CityId, EntityId, Tile},
};
use std::{
    any::Any,
    collections::{BTreeMap, HashSet, VecDeque},
    sync::Arc,
};

pub const GARBAGE_JOB: &str = "garbage";

pub struct WasteSubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

impl WasteSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }

    /// Road tiles reachable from any completed depot.
    fn reached_roads(&self, buildings: &[BuildingRecord], roads: &HashSet<Tile>) -> HashSet<Tile> {
        let mut reached = HashSet::new();
        let mut queue = VecDeque::new();
        for depot in buildings.iter().filter(|b| self.is_active_depot(b)) {
            for tile in depot.footprint().ring() {
                if roads.contains(&tile) && reached.insert(tile) {
                    queue.push_back(tile);
                }
            }
        }
        while let Some(tile) = queue.pop_front() {
            for next in neighbors4(tile) {
                if roads.contains(&next) && reached.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        reached
    }

    fn is_active_depot(&self, building: &BuildingRecord) -> bool {
        building.is_complete()
            && self
                .config
                .building_type(&building.building_type)
                .is_some_and(|k| k.is_depot())
    }

    pub fn simulate(&self, store: &CityStore) -> SimResult<BTreeMap<EntityId, bool>> {
        let buildings = store.buildings(&self.city_id)?;
        let roads: HashSet<Tile> = store.roads(&self.city_id)?.iter().map(|r| (r.x, r.y)).collect();
        let reached = self.reached_roads(&buildings, &roads);

        let capacity: f64 = buildings
            .iter()
            .filter(|b| self.is_active_depot(b))
            .filter_map(|b| self.config.building_type(&b.building_type))
            .map(|k| k.garbage_capacity)
            .sum();

        let mut demand = 0.0;
        let mut collected: HashSet<EntityId> = HashSet::new();
        for building in buildings.iter().filter(|b| b.is_complete()) {
            let Some(kind) = self.config.building_type(&building.building_type) else {
                continue;
            };
            if kind.waste_exempt {
                continue;
            }
            if building.footprint().ring().any(|t| reached.contains(&t)) {
                collected.insert(building.building_id);
                demand += kind.daily_garbage(building.floors);
            }
        }
        let rationed = demand > capacity;

        let mut result = BTreeMap::new();
        for building in &buildings {
            let serviced = match self.config.building_type(&building.building_type) {
                None => false,
                Some(kind) if kind.waste_exempt => true,
                Some(_) if !building.is_complete() => false,
                Some(_) => !rationed && collected.contains(&building.building_id),
            };
            result.insert(building.building_id, serviced);
        }
        if rationed {
            log::debug!(
                "city={} waste: garbage {demand:.1}/day exceeds depot capacity {capacity:.1}",
                self.city_id
            );
        }
        Ok(result)
    }

    pub fn apply(&self, store: &CityStore, status: &BTreeMap<EntityId, bool>) -> SimResult<Vec<CityEvent>> {
        let mut changed = Vec::new();
        for building in store.buildings(&self.city_id)? {
            let Some(&serviced) = status.get(&building.building_id) else {
                continue;
            };
            if building.has_waste == serviced {
                continue;
            }
            store.set_service_flag(&self.city_id, building.building_id, ServiceFlag::Waste, serviced)?;
            changed.push(BuildingStatus {
                building_id: building.building_id,
                powered: building.powered,
                has_water: building.has_water,
                has_waste: serviced,
            });
        }
        if changed.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![CityEvent::BuildingsUpdated {
            utility: "waste".to_string(),
            buildings: changed,
        }])
    }

    /// Daily garbage step: unserviced buildings fill up by their daily rate,
    /// serviced ones drain by the same rate. Levels stay within [0, max].
    pub fn accumulate_garbage(&self, store: &CityStore) -> SimResult<usize> {
        let mut touched = 0;
        for building in store.buildings(&self.city_id)? {
            if !building.is_complete() {
                continue;
            }
            let Some(kind) = self.config.building_type(&building.building_type) else {
                continue;
            };
            if kind.waste_exempt || kind.garbage_rate_per_floor <= 0.0 {
                continue;
            }
            let rate = kind.daily_garbage(building.floors);
            let delta = if building.has_waste { -rate } else { rate };
            let level = (building.garbage_level + delta).clamp(0.0, kind.max_garbage);
            if level != building.garbage_level {
                store.set_garbage_level(&self.city_id, building.building_id, level)?;
                touched += 1;
            }
        }
        Ok(touched)
    }
}

impl CitySubsystem for WasteSubsystem {
    fn name(&self) -> &'static str {
        "waste"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        let status = self.simulate(store)?;
        let events = self.apply(store, &status)?;

        if store.claim_job_day(&self.city_id, GARBAGE_JOB, time.day_index())? {
            let touched = self.accumulate_garbage(store)?;
            log::debug!("tick={} waste: garbage levels moved on {touched} buildings", time.tick);
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
