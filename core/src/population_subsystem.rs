//! Population lifecycle.
//!
//! Reacts to the building events emitted earlier in the same tick:
//! a completed building with a population rule spawns its residents, a
//! demolished one displaces everyone living there and lays off everyone
//! working there.
//!
//! Execution: every tick (it only acts on events).

use crate::{
    clock::CityTime,
    config::{PopulationRule, SimConfig},
    error::SimResult,
    event::CityEvent,
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::{CityId, EntityId},
};
use std::{any::Any, sync::Arc};

pub struct PopulationSubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

impl PopulationSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }

    fn spawn(
        &self,
        store: &CityStore,
        building_id: EntityId,
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        let Some(building) = store.building(&self.city_id, building_id)? else {
            log::warn!("city={} population: completed building {building_id} is gone", self.city_id);
            return Ok(vec![]);
        };
        let Some(rule) = self
            .config
            .building_type(&building.building_type)
            .and_then(|k| k.population)
        else {
            return Ok(vec![]);
        };
        let count = match rule {
            PopulationRule::Range { min, max } => rng.range_inclusive(min, max),
            PopulationRule::PerFloor { count } => count * building.floors.max(1),
        };

        let mut events = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let resident_id = store.insert_resident(&self.city_id, building_id)?;
            events.push(CityEvent::ResidentSpawned { resident_id, building_id });
        }
        Ok(events)
    }

    fn displace(&self, store: &CityStore, building_id: EntityId) -> SimResult<Vec<CityEvent>> {
        let mut events = Vec::new();
        let displaced = store.delete_residents_homed_at(&self.city_id, building_id)?;
        if displaced > 0 {
            events.push(CityEvent::ResidentsDisplaced { building_id, count: displaced });
        }
        let laid_off = store.clear_work_at(&self.city_id, building_id)?;
        if laid_off > 0 {
            events.push(CityEvent::JobsLost { building_id, count: laid_off });
        }
        Ok(events)
    }
}

impl CitySubsystem for PopulationSubsystem {
    fn name(&self) -> &'static str {
        "population"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        events_in: &[CityEvent],
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        let mut events = Vec::new();
        for event in events_in {
            match event {
                CityEvent::BuildingCompleted { building_id, .. } => {
                    events.extend(self.spawn(store, *building_id, rng)?);
                }
                CityEvent::BuildingDemolished { building_id, .. } => {
                    events.extend(self.displace(store, *building_id)?);
                }
                _ => {}
            }
        }
        if !events.is_empty() {
            log::debug!("tick={} population: {} lifecycle events", time.tick, events.len());
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
