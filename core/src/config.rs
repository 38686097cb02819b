use crate::{
    clock,
    error::{SimError, SimResult},
    model::{CreditRating, Economy, Ledger, TaxRates, ZoneClass},
    types::Tick,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const EMBEDDED_BUILDING_TYPES: &str = include_str!("../../data/building_types.json");
const EMBEDDED_ECONOMY: &str = include_str!("../../data/economy.json");
const EMBEDDED_SIMULATION: &str = include_str!("../../data/simulation.json");

// ── Building types ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BuildingCategory {
    Residential,
    Commercial,
    Industrial,
    Utility,
    Municipal,
    Park,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PopulationRule {
    /// Uniform roll in `[min, max]` once per building.
    Range { min: u32, max: u32 },
    /// `count` residents per floor.
    PerFloor { count: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingTypeConfig {
    pub id: String,
    pub label: String,
    pub category: BuildingCategory,
    #[serde(default)]
    pub zone: Option<ZoneClass>,
    pub width: u32,
    pub height: u32,
    pub max_floors: u32,
    #[serde(default)]
    pub power_required: f64,
    #[serde(default)]
    pub water_required: f64,
    #[serde(default)]
    pub power_capacity: f64,
    #[serde(default)]
    pub water_capacity: f64,
    /// Daily garbage a depot can absorb.
    #[serde(default)]
    pub garbage_capacity: f64,
    #[serde(default)]
    pub garbage_rate_per_floor: f64,
    #[serde(default)]
    pub max_garbage: f64,
    #[serde(default)]
    pub garbage_fee: f64,
    /// Always reports power and water service (parks, plazas).
    #[serde(default)]
    pub utility_exempt: bool,
    /// Always reports waste service (municipal and infrastructure).
    #[serde(default)]
    pub waste_exempt: bool,
    #[serde(default)]
    pub population: Option<PopulationRule>,
    #[serde(default)]
    pub jobs_per_floor: u32,
    #[serde(default)]
    pub salary: f64,
    #[serde(default)]
    pub rental_units_per_floor: u32,
    #[serde(default)]
    pub rent: f64,
    #[serde(default)]
    pub service_radius: Option<u32>,
    pub construction_cost: f64,
    /// Construction progress gained per in-game hour, in percent.
    pub build_rate: f64,
}

impl BuildingTypeConfig {
    pub fn is_power_source(&self) -> bool { self.power_capacity > 0.0 }
    pub fn is_water_source(&self) -> bool { self.water_capacity > 0.0 }
    pub fn is_depot(&self) -> bool { self.garbage_capacity > 0.0 }

    pub fn job_slots(&self, floors: u32) -> u32 {
        self.jobs_per_floor * floors.max(1)
    }

    pub fn daily_garbage(&self, floors: u32) -> f64 {
        self.garbage_rate_per_floor * floors.max(1) as f64
    }
}

#[derive(Debug, Clone, Deserialize)]
struct BuildingTypesFile {
    building_types: Vec<BuildingTypeConfig>,
    zone_defaults: HashMap<ZoneClass, String>,
}

// ── Economy ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdinanceConfig {
    pub revenue_per_capita: f64,
    pub cost_per_capita: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentConfig {
    pub cost_per_building: f64,
    pub building_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    pub road: f64,
    pub power_line: f64,
    pub water_pipe: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Annual per-capita property tax base at a 100% rate.
    pub tax_multiplier: f64,
    pub power_rate: f64,
    pub water_rate: f64,
    pub default_tax_rates: TaxRates,
    pub ordinances: BTreeMap<String, OrdinanceConfig>,
    pub departments: BTreeMap<String, DepartmentConfig>,
    pub default_funding: f64,
    pub maintenance: MaintenanceConfig,
    pub transit_department: String,
    /// Daily growth of unpaid fee arrears.
    pub tax_penalty_rate: f64,
}

impl EconomyConfig {
    /// Economy block of a freshly founded city.
    pub fn initial_economy(&self) -> Economy {
        Economy {
            tax_rates: self.default_tax_rates,
            ordinances: Vec::new(),
            bonds: Vec::new(),
            department_funding: self
                .departments
                .keys()
                .chain(std::iter::once(&self.transit_department))
                .map(|d| (d.clone(), self.default_funding))
                .collect(),
            ytd: Ledger::default(),
            ytd_year: clock::EPOCH_YEAR,
            credit_rating: CreditRating::Aaa,
        }
    }

    /// Funding percentage for a department, falling back to the default.
    pub fn funding(&self, economy: &Economy, department: &str) -> f64 {
        economy
            .department_funding
            .get(department)
            .copied()
            .unwrap_or(self.default_funding)
    }
}

// ── Simulation tunables ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentConfig {
    pub period_days: u64,
    pub warning_days: u64,
    pub hearing_days: u64,
    pub jail_days: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficConfig {
    pub reference_speed_limit: f64,
    pub vehicle_multipliers: HashMap<String, f64>,
}

impl TrafficConfig {
    pub fn multiplier(&self, vehicle_type: &str) -> f64 {
        self.vehicle_multipliers.get(vehicle_type).copied().unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandValueConfig {
    pub base: f64,
    pub utility_bonus: f64,
    pub park_bonus: f64,
    pub industrial_penalty: f64,
    pub crime_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneEvolutionConfig {
    pub upgrade_land_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrimeConfig {
    pub base: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireConfig {
    pub ignition_chance: f64,
    pub spread_per_hour: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub ticks_per_minute: u64,
    pub agent_speed: f64,
    pub utility_interval_ticks: Tick,
    pub auto_build_interval_ticks: Tick,
    pub auto_build_per_pass: usize,
    pub daily_job_hour: u32,
    pub rent_enforcement_hour: u32,
    pub rent: RentConfig,
    pub traffic: TrafficConfig,
    pub land_value: LandValueConfig,
    pub zone_evolution: ZoneEvolutionConfig,
    pub crime: CrimeConfig,
    pub fire: FireConfig,
}

// ── Top-level ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub building_types: HashMap<String, BuildingTypeConfig>,
    pub zone_defaults: HashMap<ZoneClass, String>,
    pub economy: EconomyConfig,
    pub sim: SimulationConfig,
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let read = |name: &str| -> anyhow::Result<String> {
            let path = format!("{data_dir}/{name}");
            std::fs::read_to_string(&path).map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))
        };
        Self::from_json(
            &read("building_types.json")?,
            &read("economy.json")?,
            &read("simulation.json")?,
        )
    }

    /// The configuration shipped with the crate.
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_json(EMBEDDED_BUILDING_TYPES, EMBEDDED_ECONOMY, EMBEDDED_SIMULATION)
    }

    fn from_json(building_types: &str, economy: &str, simulation: &str) -> anyhow::Result<Self> {
        let types_file: BuildingTypesFile = serde_json::from_str(building_types)
            .map_err(|e| anyhow::anyhow!("Invalid building_types.json: {e}"))?;
        let economy: EconomyConfig = serde_json::from_str(economy)
            .map_err(|e| anyhow::anyhow!("Invalid economy.json: {e}"))?;
        let sim: SimulationConfig = serde_json::from_str(simulation)
            .map_err(|e| anyhow::anyhow!("Invalid simulation.json: {e}"))?;

        let building_types: HashMap<String, BuildingTypeConfig> = types_file
            .building_types
            .into_iter()
            .map(|b| (b.id.clone(), b))
            .collect();

        for (zone, type_id) in &types_file.zone_defaults {
            if !building_types.contains_key(type_id) {
                anyhow::bail!("zone default for {} names unknown type {type_id}", zone.as_str());
            }
        }
        for (dept, cfg) in &economy.departments {
            if let Some(unknown) = cfg.building_types.iter().find(|t| !building_types.contains_key(*t)) {
                anyhow::bail!("department {dept} names unknown building type {unknown}");
            }
        }

        let config = Self {
            building_types,
            zone_defaults: types_file.zone_defaults,
            economy,
            sim,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject tunables that would stall the clock, divide by zero or keep a
    /// daily job from ever firing.
    pub fn validate(&self) -> SimResult<()> {
        let sim = &self.sim;
        let invalid = |msg: String| Err(SimError::Config(msg));
        if sim.ticks_per_minute == 0 {
            return invalid("ticks_per_minute must be at least 1".into());
        }
        for (name, hour) in [
            ("daily_job_hour", sim.daily_job_hour),
            ("rent_enforcement_hour", sim.rent_enforcement_hour),
        ] {
            if hour >= 24 {
                return invalid(format!("{name} must be below 24, got {hour}"));
            }
        }
        for (name, days) in [
            ("rent.period_days", sim.rent.period_days),
            ("rent.warning_days", sim.rent.warning_days),
            ("rent.jail_days", sim.rent.jail_days),
        ] {
            if days == 0 {
                return invalid(format!("{name} must be at least 1"));
            }
        }
        Ok(())
    }

    /// Embedded config with random hazards switched off, for tests.
    pub fn default_test() -> anyhow::Result<Self> {
        let mut config = Self::embedded()?;
        config.sim.fire.ignition_chance = 0.0;
        Ok(config)
    }

    pub fn building_type(&self, id: &str) -> Option<&BuildingTypeConfig> {
        self.building_types.get(id)
    }

    pub fn ticks_per_hour(&self) -> Tick {
        clock::ticks_per_hour(self.sim.ticks_per_minute)
    }

    pub fn ticks_per_day(&self) -> Tick {
        clock::ticks_per_day(self.sim.ticks_per_minute)
    }
}
