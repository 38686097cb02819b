//! RCI demand.
//!
//! Each zone's demand is `2 x fill - 1`, clamped to -1..1, where fill is
//! housing occupancy (residential) or the share of job slots taken
//! (commercial, industrial). A zone with no capacity yet reads as full, so
//! an empty city asks for homes, and jobs once people arrive.

use crate::{
    clock::CityTime,
    config::{PopulationRule, SimConfig},
    error::SimResult,
    event::CityEvent,
    model::{ZoneClass, ZoneDemand},
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::CityId,
};
use std::{any::Any, sync::Arc};

pub struct DemandSubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

fn demand_from_fill(used: usize, capacity: usize, has_people: bool) -> f64 {
    if capacity == 0 {
        return if has_people { 1.0 } else { 0.0 };
    }
    (2.0 * used as f64 / capacity as f64 - 1.0).clamp(-1.0, 1.0)
}

impl DemandSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }

    pub fn compute(&self, store: &CityStore) -> SimResult<ZoneDemand> {
        let residents = store.resident_count(&self.city_id)?;
        let filled = store.employment_counts(&self.city_id)?;
        let mut housing = 0usize;
        let mut slots = [0usize; 2];
        let mut workers = [0usize; 2];

        for building in store.buildings(&self.city_id)?.iter().filter(|b| b.is_complete()) {
            let Some(kind) = self.config.building_type(&building.building_type) else {
                continue;
            };
            match kind.zone {
                Some(ZoneClass::Residential) => {
                    housing += match kind.population {
                        Some(PopulationRule::Range { max, .. }) => max as usize,
                        Some(PopulationRule::PerFloor { count }) => (count * building.floors.max(1)) as usize,
                        None => 0,
                    };
                }
                Some(zone) => {
                    let i = if zone == ZoneClass::Commercial { 0 } else { 1 };
                    slots[i] += kind.job_slots(building.floors) as usize;
                    workers[i] += filled.get(&building.building_id).copied().unwrap_or(0);
                }
                None => {}
            }
        }

        Ok(ZoneDemand {
            residential: demand_from_fill(residents, housing, true),
            commercial: demand_from_fill(workers[0], slots[0], residents > 0),
            industrial: demand_from_fill(workers[1], slots[1], residents > 0),
        })
    }
}

impl CitySubsystem for DemandSubsystem {
    fn name(&self) -> &'static str {
        "demand"
    }

    fn update(
        &mut self,
        _time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        let demand = self.compute(store)?;
        let previous = store.require_city(&self.city_id)?.demand;
        if previous == demand {
            return Ok(vec![]);
        }
        store.update_demand(&self.city_id, &demand)?;
        Ok(vec![CityEvent::DemandUpdated {
            residential: demand.residential,
            commercial: demand.commercial,
            industrial: demand.industrial,
        }])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_maps_onto_demand_range() {
        assert_eq!(demand_from_fill(0, 10, true), -1.0);
        assert_eq!(demand_from_fill(5, 10, true), 0.0);
        assert_eq!(demand_from_fill(10, 10, true), 1.0);
        assert_eq!(demand_from_fill(0, 0, true), 1.0);
        assert_eq!(demand_from_fill(0, 0, false), 0.0);
    }
}
