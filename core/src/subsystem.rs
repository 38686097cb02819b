//! Subsystem trait.
//!
//! RULE: Every city simulator implements CitySubsystem.
//! The bundle calls update() on each registered subsystem in registration
//! order, whenever that subsystem's cadence gate is due.
//! Execution order is fixed and documented in bundle.rs.

use crate::{
    clock::CityTime,
    error::SimResult,
    event::CityEvent,
    rng::SubsystemRng,
    store::CityStore,
};
use std::any::Any;

/// The contract every city simulator must fulfill.
pub trait CitySubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called by the bundle when the subsystem's cadence is due.
    ///
    /// - `time`:      derived wall time of the current tick
    /// - `store`:     repository, every call scoped by the subsystem's city id
    /// - `events_in`: events emitted earlier in this tick by the same city
    /// - `rng`:       this subsystem's deterministic RNG for this tick
    ///
    /// Returns the new events to append to the city's tick event list.
    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        events_in: &[CityEvent],
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>>;

    /// Roads changed; drop any cached road-derived graph.
    fn roads_changed(&mut self) {}

    /// For downcasting in tests and tooling only.
    fn as_any(&self) -> &dyn Any;
}
