//! One city's set of simulators.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   0. Queued admin commands       (before anything else)
//!   1. Construction                hourly
//!   2. Fire                        hourly
//!   3. Population                  every tick, reacts to 1, 2 and commands
//!   4. Power                       every `utility_interval_ticks`
//!   5. Water                       every `utility_interval_ticks`
//!   6. Waste                       every `utility_interval_ticks`
//!   7. Agents                      every tick
//!   8. Vehicles                    every tick
//!   9. Employment                  hourly (payroll daily inside)
//!  10. Taxation                    daily at `daily_job_hour`
//!  11. Tax penalties               daily at `daily_job_hour`, after 10
//!  12. Rent enforcement            daily at `rent_enforcement_hour`
//!  13. Land value                  daily at `daily_job_hour`
//!  14. Crime                       hourly
//!  15. Zone evolution              daily at `daily_job_hour`
//!  16. Demand                      hourly
//!  17. Zone auto-build             every `auto_build_interval_ticks`
//!
//! Each subsystem sees every event emitted earlier in the same city tick.

use crate::{
    agent_subsystem::AgentSubsystem,
    cadence::{Cadence, CadenceGate},
    clock::CityTime,
    command::QueuedCommand,
    config::SimConfig,
    construction_subsystem::ConstructionSubsystem,
    crime_subsystem::CrimeSubsystem,
    demand_subsystem::DemandSubsystem,
    employment_subsystem::EmploymentSubsystem,
    error::SimResult,
    event::CityEvent,
    fire_subsystem::FireSubsystem,
    land_value_subsystem::LandValueSubsystem,
    model::CityRecord,
    population_subsystem::PopulationSubsystem,
    power_subsystem::PowerSubsystem,
    rent_enforcement_subsystem::RentEnforcementSubsystem,
    rng::{RngBank, SubsystemSlot},
    store::CityStore,
    subsystem::CitySubsystem,
    tax_penalty_subsystem::TaxPenaltySubsystem,
    taxation_subsystem::TaxationSubsystem,
    types::CityId,
    vehicle_subsystem::VehicleSubsystem,
    waste_subsystem::WasteSubsystem,
    water_subsystem::WaterSubsystem,
    zone_build_subsystem::ZoneBuildSubsystem,
    zone_evolution_subsystem::ZoneEvolutionSubsystem,
};
use std::sync::Arc;

struct Scheduled {
    slot:      SubsystemSlot,
    gate:      CadenceGate,
    subsystem: Box<dyn CitySubsystem>,
}

/// Events of one city tick, each tagged with the subsystem that emitted it.
#[derive(Debug, Default)]
pub struct CityTick {
    pub events:  Vec<CityEvent>,
    pub sources: Vec<&'static str>,
}

impl CityTick {
    fn extend(&mut self, source: &'static str, events: Vec<CityEvent>) {
        self.sources.extend(std::iter::repeat(source).take(events.len()));
        self.events.extend(events);
    }
}

pub struct CityBundle {
    pub city_id: CityId,
    rng_bank:    RngBank,
    subsystems:  Vec<Scheduled>,
}

impl CityBundle {
    pub fn new(city_id: &str, seed: u64) -> Self {
        Self {
            city_id: city_id.to_string(),
            rng_bank: RngBank::new(seed, city_id),
            subsystems: Vec::new(),
        }
    }

    /// Build a fully wired bundle with every simulator registered.
    pub fn build(city: &CityRecord, seed: u64, config: Arc<SimConfig>) -> Self {
        let id = &city.city_id;
        let sim = &config.sim;
        let utility = Cadence::EveryTicks(sim.utility_interval_ticks.max(1));
        let daily = Cadence::DailyAt(sim.daily_job_hour);
        let rent = Cadence::DailyAt(sim.rent_enforcement_hour);
        let auto_build = Cadence::EveryTicks(sim.auto_build_interval_ticks.max(1));

        let mut bundle = Self::new(id, seed);
        bundle.register(SubsystemSlot::Construction, Cadence::Hourly,
            Box::new(ConstructionSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::Fire, Cadence::Hourly,
            Box::new(FireSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::Population, Cadence::EveryTick,
            Box::new(PopulationSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::Power, utility,
            Box::new(PowerSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::Water, utility,
            Box::new(WaterSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::Waste, utility,
            Box::new(WasteSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::Agents, Cadence::EveryTick,
            Box::new(AgentSubsystem::new(id.clone(), config.clone(), city.width, city.height)));
        bundle.register(SubsystemSlot::Vehicles, Cadence::EveryTick,
            Box::new(VehicleSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::Employment, Cadence::Hourly,
            Box::new(EmploymentSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::Taxation, daily,
            Box::new(TaxationSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::TaxPenalty, daily,
            Box::new(TaxPenaltySubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::RentEnforcement, rent,
            Box::new(RentEnforcementSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::LandValue, daily,
            Box::new(LandValueSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::Crime, Cadence::Hourly,
            Box::new(CrimeSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::ZoneEvolution, daily,
            Box::new(ZoneEvolutionSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::Demand, Cadence::Hourly,
            Box::new(DemandSubsystem::new(id.clone(), config.clone())));
        bundle.register(SubsystemSlot::ZoneBuild, auto_build,
            Box::new(ZoneBuildSubsystem::new(id.clone(), config)));
        bundle
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, slot: SubsystemSlot, cadence: Cadence, subsystem: Box<dyn CitySubsystem>) {
        self.subsystems.push(Scheduled { slot, gate: CadenceGate::new(cadence), subsystem });
    }

    /// Run one tick for this city: commands first, then every subsystem
    /// whose cadence is due.
    pub fn tick(&mut self, time: &CityTime, store: &CityStore, commands: Vec<QueuedCommand>) -> SimResult<CityTick> {
        let mut out = CityTick::default();
        for queued in commands {
            log::debug!("tick={} city={} command {}", time.tick, self.city_id, queued.command_id);
            let events = queued.command.apply(&self.city_id, store, time)?;
            out.extend("commands", events);
        }

        for entry in &mut self.subsystems {
            if !entry.gate.due(time) {
                continue;
            }
            let mut rng = self.rng_bank.for_subsystem(entry.slot, time.tick);
            let events = entry.subsystem.update(time, store, &out.events, &mut rng)?;
            out.extend(entry.subsystem.name(), events);
        }
        Ok(out)
    }

    /// Drop cached road graphs in every subsystem.
    pub fn roads_changed(&mut self) {
        for entry in &mut self.subsystems {
            entry.subsystem.roads_changed();
        }
    }

    /// Forget every cadence marker, e.g. after a time jump.
    pub fn reset_cadences(&mut self) {
        for entry in &mut self.subsystems {
            entry.gate.reset();
        }
    }

    pub fn subsystem_names(&self) -> Vec<&'static str> {
        self.subsystems.iter().map(|e| e.subsystem.name()).collect()
    }

    /// Typed access to a registered subsystem. Tests and tooling only.
    pub fn subsystem<T: 'static>(&self) -> Option<&T> {
        self.subsystems
            .iter()
            .find_map(|e| e.subsystem.as_any().downcast_ref::<T>())
    }
}
