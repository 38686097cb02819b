//! Tick-driven, multi-tenant city simulation core.
//!
//! `engine::SimEngine` owns the clock and the SQLite store and runs one
//! `bundle::CityBundle` of simulators per hosted city.

pub mod bundle;
pub mod cadence;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod grid;
pub mod model;
pub mod pathfinder;
pub mod rng;
pub mod store;
pub mod subsystem;
pub mod types;
pub mod utility_network;

pub mod agent_subsystem;
pub mod construction_subsystem;
pub mod crime_subsystem;
pub mod demand_subsystem;
pub mod employment_subsystem;
pub mod fire_subsystem;
pub mod land_value_subsystem;
pub mod population_subsystem;
pub mod power_subsystem;
pub mod rent_enforcement_subsystem;
pub mod tax_penalty_subsystem;
pub mod taxation_subsystem;
pub mod vehicle_subsystem;
pub mod waste_subsystem;
pub mod water_subsystem;
pub mod zone_build_subsystem;
pub mod zone_evolution_subsystem;
