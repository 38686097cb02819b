//! Zone evolution: zoned buildings grow on valuable, serviced land and
//! shrink when buried in uncollected garbage.
//!
//! Execution: daily at `daily_job_hour`.

use crate::{
    clock::CityTime,
    config::SimConfig,
    error::SimResult,
    event::CityEvent,
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::{CityId, EntityId},
};
use std::{any::Any, collections::HashMap, sync::Arc};

pub const ZONE_EVOLUTION_JOB: &str = "zone_evolution";

pub struct ZoneEvolutionSubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

impl ZoneEvolutionSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }
}

impl CitySubsystem for ZoneEvolutionSubsystem {
    fn name(&self) -> &'static str {
        "zone_evolution"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        if !store.claim_job_day(&self.city_id, ZONE_EVOLUTION_JOB, time.day_index())? {
            return Ok(vec![]);
        }
        let land_value: HashMap<EntityId, f64> = store
            .parcels(&self.city_id)?
            .into_iter()
            .map(|p| (p.parcel_id, p.land_value))
            .collect();
        let threshold = self.config.sim.zone_evolution.upgrade_land_value;

        let mut events = Vec::new();
        for building in store.buildings(&self.city_id)? {
            if !building.is_complete() {
                continue;
            }
            let Some(kind) = self.config.building_type(&building.building_type) else {
                continue;
            };
            if kind.zone.is_none() {
                continue;
            }
            let value = land_value.get(&building.parcel_id).copied().unwrap_or(0.0);
            let buried = kind.max_garbage > 0.0
                && !building.has_waste
                && building.garbage_level >= kind.max_garbage;

            let floors = if buried && building.floors > 1 {
                building.floors - 1
            } else if !buried
                && building.is_operational()
                && value >= threshold
                && building.floors < kind.max_floors
            {
                building.floors + 1
            } else {
                continue;
            };
            store.set_floors(&self.city_id, building.building_id, floors)?;
            events.push(CityEvent::BuildingUpgraded { building_id: building.building_id, floors });
        }
        if !events.is_empty() {
            log::debug!("tick={} zone_evolution: {} buildings changed size", time.tick, events.len());
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
