//! Crime: hourly per-building crime level and the city crime rate.
//!
//! Crime falls as land value rises and is zero inside the service radius of
//! a completed, operational police station. The city rate is the mean over
//! completed buildings.

use crate::{
    clock::CityTime,
    config::SimConfig,
    error::SimResult,
    event::CityEvent,
    grid::{chebyshev, Footprint},
    land_value_subsystem::MAX_LAND_VALUE,
    model::BuildingRecord,
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::{CityId, EntityId},
};
use std::{any::Any, collections::HashMap, sync::Arc};

pub const POLICE_DEPARTMENT: &str = "police";

/// Footprint and radius of every completed, operational building that
/// belongs to `department`.
pub(crate) fn coverage(config: &SimConfig, department: &str, buildings: &[BuildingRecord]) -> Vec<(Footprint, u32)> {
    let Some(dept) = config.economy.departments.get(department) else {
        return vec![];
    };
    buildings
        .iter()
        .filter(|b| b.is_complete() && b.is_operational())
        .filter(|b| dept.building_types.contains(&b.building_type))
        .filter_map(|b| {
            let radius = config.building_type(&b.building_type)?.service_radius?;
            Some((b.footprint(), radius))
        })
        .collect()
}

pub(crate) fn covered(stations: &[(Footprint, u32)], building: &BuildingRecord) -> bool {
    let target = building.footprint();
    stations.iter().any(|(fp, radius)| {
        fp.tiles().any(|s| target.tiles().any(|t| chebyshev(s, t) <= *radius))
    })
}

pub struct CrimeSubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

impl CrimeSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }
}

impl CitySubsystem for CrimeSubsystem {
    fn name(&self) -> &'static str {
        "crime"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        let buildings = store.buildings(&self.city_id)?;
        let stations = coverage(&self.config, POLICE_DEPARTMENT, &buildings);
        let land_value: HashMap<EntityId, f64> = store
            .parcels(&self.city_id)?
            .into_iter()
            .map(|p| (p.parcel_id, p.land_value))
            .collect();
        let base = self.config.sim.crime.base;

        let mut total = 0.0;
        let mut counted = 0usize;
        for building in buildings.iter().filter(|b| b.is_complete()) {
            let level = if covered(&stations, building) {
                0.0
            } else {
                let value = land_value.get(&building.parcel_id).copied().unwrap_or(0.0);
                (base * (1.0 - value / MAX_LAND_VALUE)).clamp(0.0, 100.0)
            };
            if (level - building.crime_level).abs() > f64::EPSILON {
                store.set_crime_level(&self.city_id, building.building_id, level)?;
            }
            total += level;
            counted += 1;
        }
        let rate = if counted == 0 { 0.0 } else { total / counted as f64 };
        store.update_crime_rate(&self.city_id, rate)?;
        log::debug!("tick={} crime: city rate {rate:.1}", time.tick);
        Ok(vec![])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
