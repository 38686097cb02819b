//! Water. Same reach and rationing as power, walked over pipes instead of
//! lines; towers are the sources.

use crate::{
    clock::CityTime,
    config::SimConfig,
    error::SimResult,
    event::CityEvent,
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::{CityId, EntityId},
    utility_network::{Utility, UtilityNetwork},
};
use std::{any::Any, collections::BTreeMap, sync::Arc};

pub struct WaterSubsystem {
    network: UtilityNetwork,
}

impl WaterSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { network: UtilityNetwork::new(Utility::Water, city_id, config) }
    }

    pub fn simulate(&mut self, store: &CityStore) -> SimResult<BTreeMap<EntityId, bool>> {
        self.network.simulate(store)
    }

    pub fn apply(&mut self, store: &CityStore, status: &BTreeMap<EntityId, bool>) -> SimResult<Vec<CityEvent>> {
        self.network.apply(store, status)
    }
}

impl CitySubsystem for WaterSubsystem {
    fn name(&self) -> &'static str {
        "water"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        let status = self.simulate(store)?;
        let serviced = status.values().filter(|s| **s).count();
        let events = self.apply(store, &status)?;
        log::debug!(
            "tick={} water: {serviced}/{} buildings serviced",
            time.tick,
            status.len()
        );
        Ok(events)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
