//! Land value: daily re-appraisal of every parcel.
//!
//! value = base
//!       + utility bonus when the parcel's building is operational
//!       + park bonus when inside a completed park's service radius
//!       - industrial penalty when touching an industrial footprint
//!       - crime weight x the parcel building's crime level
//! clamped to 0..=255.

use crate::{
    clock::CityTime,
    config::{BuildingCategory, SimConfig},
    error::SimResult,
    event::CityEvent,
    grid::chebyshev,
    model::{BuildingRecord, ParcelRecord, ZoneClass},
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::{CityId, EntityId},
};
use std::{any::Any, collections::HashMap, sync::Arc};

pub const LAND_VALUE_JOB: &str = "land_value";
pub const MAX_LAND_VALUE: f64 = 255.0;

pub struct LandValueSubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

impl LandValueSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }

    pub fn appraise(&self, parcel: &ParcelRecord, buildings: &[BuildingRecord], on_parcel: Option<&BuildingRecord>) -> f64 {
        let cfg = &self.config.sim.land_value;
        let tile = (parcel.x, parcel.y);
        let mut value = cfg.base;

        if let Some(building) = on_parcel {
            if building.is_operational() {
                value += cfg.utility_bonus;
            }
            value -= cfg.crime_weight * building.crime_level;
        }

        let mut near_park = false;
        let mut near_industry = false;
        for other in buildings.iter().filter(|b| b.is_complete()) {
            let Some(kind) = self.config.building_type(&other.building_type) else {
                continue;
            };
            let fp = other.footprint();
            let distance = fp.tiles().map(|t| chebyshev(t, tile)).min().unwrap_or(u32::MAX);
            if kind.category == BuildingCategory::Park
                && distance <= kind.service_radius.unwrap_or(0)
            {
                near_park = true;
            }
            if kind.zone == Some(ZoneClass::Industrial) && distance == 1 {
                near_industry = true;
            }
        }
        if near_park {
            value += cfg.park_bonus;
        }
        if near_industry {
            value -= cfg.industrial_penalty;
        }
        value.clamp(0.0, MAX_LAND_VALUE)
    }
}

impl CitySubsystem for LandValueSubsystem {
    fn name(&self) -> &'static str {
        "land_value"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        if !store.claim_job_day(&self.city_id, LAND_VALUE_JOB, time.day_index())? {
            return Ok(vec![]);
        }
        let buildings = store.buildings(&self.city_id)?;
        let by_parcel: HashMap<EntityId, &BuildingRecord> =
            buildings.iter().map(|b| (b.parcel_id, b)).collect();

        let mut changed = 0;
        for parcel in store.parcels(&self.city_id)? {
            let value = self.appraise(&parcel, &buildings, by_parcel.get(&parcel.parcel_id).copied());
            if (value - parcel.land_value).abs() > f64::EPSILON {
                store.set_land_value(&self.city_id, parcel.parcel_id, value)?;
                changed += 1;
            }
        }
        log::debug!("tick={} land_value: {changed} parcels re-appraised", time.tick);
        Ok(vec![])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
