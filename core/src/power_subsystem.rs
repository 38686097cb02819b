//! Power simulator: power reachability over power lines with all-or-nothing rationing.
//!
//! Execution: every `utility_interval_ticks` ticks.

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

pub struct PowerSubsystem {
    network: UtilityNetwork,
}

impl PowerSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { network: UtilityNetwork::new(Utility::Power, city_id, config) }
    }

    pub fn simulate(&mut self, store: &CityStore) -> SimResult<BTreeMap<EntityId, bool>> {
        self.network.simulate(store)
    }

    pub fn apply(&mut self, store: &CityStore, status: &BTreeMap<EntityId, bool>) -> SimResult<Vec<CityEvent>> {
        self.network.apply(store, status)
    }
}

impl CitySubsystem for PowerSubsystem {
    fn name(&self) -> &'static str {
        "power"
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
            "tick={} power: {serviced}/{} buildings serviced",
            time.tick,
            status.len()
        );
        Ok(events)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
