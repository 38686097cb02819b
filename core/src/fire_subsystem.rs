//! Fire: hourly ignition, spread and destruction.
//!
//! Buildings inside an operational fire station's radius never burn and
//! are put out if already burning. Others ignite with `ignition_chance`
//! per hour; a burning building gains `spread_per_hour` fire level and is
//! destroyed at 100.

use crate::{
    clock::CityTime,
    config::{BuildingCategory, SimConfig},
    crime_subsystem::{coverage, covered},
    error::SimResult,
    event::CityEvent,
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::CityId,
};
use std::{any::Any, sync::Arc};

pub const FIRE_DEPARTMENT: &str = "fire";
pub const BURNED_DOWN: f64 = 100.0;

pub struct FireSubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

impl FireSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }
}

impl CitySubsystem for FireSubsystem {
    fn name(&self) -> &'static str {
        "fire"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        let cfg = &self.config.sim.fire;
        let buildings = store.buildings(&self.city_id)?;
        let stations = coverage(&self.config, FIRE_DEPARTMENT, &buildings);

        let mut events = Vec::new();
        for building in buildings.iter().filter(|b| b.is_complete()) {
            let burnable = self
                .config
                .building_type(&building.building_type)
                .is_some_and(|k| k.category != BuildingCategory::Park);
            if !burnable {
                continue;
            }
            if covered(&stations, building) {
                if building.fire_level > 0.0 {
                    store.set_fire_level(&self.city_id, building.building_id, 0.0)?;
                }
                continue;
            }
            if building.fire_level > 0.0 {
                let level = building.fire_level + cfg.spread_per_hour;
                if level >= BURNED_DOWN {
                    store.delete_building(&self.city_id, building.building_id)?;
                    log::info!("tick={} fire: building {} burned down", time.tick, building.building_id);
                    events.push(CityEvent::BuildingDemolished {
                        building_id: building.building_id,
                        cause: "fire".to_string(),
                    });
                } else {
                    store.set_fire_level(&self.city_id, building.building_id, level)?;
                }
            } else if rng.chance(cfg.ignition_chance) {
                store.set_fire_level(&self.city_id, building.building_id, cfg.spread_per_hour)?;
                events.push(CityEvent::FireStarted { building_id: building.building_id });
            }
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
