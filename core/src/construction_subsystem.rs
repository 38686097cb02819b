//! Construction: buildings under construction advance by their type's
//! hourly build rate. Completion creates the building's rental units.
//!
//! Execution: hourly.

use crate::{
    clock::CityTime,
    config::SimConfig,
    error::SimResult,
    event::CityEvent,
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::CityId,
};
use std::{any::Any, sync::Arc};

pub struct ConstructionSubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

impl ConstructionSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }
}

impl CitySubsystem for ConstructionSubsystem {
    fn name(&self) -> &'static str {
        "construction"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        let mut events = Vec::new();
        for building in store.buildings(&self.city_id)? {
            if building.is_complete() {
                continue;
            }
            let Some(kind) = self.config.building_type(&building.building_type) else {
                log::warn!(
                    "tick={} construction: building {} has unknown type {}",
                    time.tick, building.building_id, building.building_type
                );
                continue;
            };
            let progress = (building.progress + kind.build_rate).min(100.0);
            store.set_building_progress(&self.city_id, building.building_id, progress)?;
            if progress < 100.0 {
                continue;
            }

            let mut unit_number = 0;
            for floor in 1..=building.floors {
                for _ in 0..kind.rental_units_per_floor {
                    unit_number += 1;
                    store.insert_rental_unit(
                        &self.city_id,
                        building.building_id,
                        floor,
                        unit_number,
                        &kind.id,
                        kind.rent,
                    )?;
                }
            }
            log::info!(
                "tick={} construction: {} {} completed with {unit_number} rental units",
                time.tick, kind.id, building.building_id
            );
            events.push(CityEvent::BuildingCompleted {
                building_id: building.building_id,
                building_type: kind.id.clone(),
            });
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
