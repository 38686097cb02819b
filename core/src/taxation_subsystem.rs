//! Taxation: the daily fiscal close.
//!
//! Order of the close:
//!   1. Infrastructure fees from building owners (skipped when they cannot pay)
//!   2. Property tax per zone class, annual rate converted to a daily amount
//!   3. Ordinance revenue and cost per capita
//!   4. Department expenses, scaled by funding
//!   5. Road / line / pipe maintenance, scaled by transit funding
//!   6. Bond interest
//!
//! Net is added to the treasury without bounds. The YTD ledger resets when
//! the year changes and the credit rating is recomputed every close.
//!
//! Execution: daily at `daily_job_hour`, guarded by the `taxation` job marker.

use crate::{
    clock::{CityTime, DAYS_PER_YEAR},
    config::SimConfig,
    error::SimResult,
    event::CityEvent,
    model::{BuildingRecord, CreditRating, Economy, Ledger, ZoneClass},
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::CityId,
};
use std::{any::Any, collections::HashMap, sync::Arc};

pub const TAXATION_JOB: &str = "taxation";

/// Residents (residential) or workers (commercial, industrial) per zone.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ZonePopulation {
    pub residential: usize,
    pub commercial:  usize,
    pub industrial:  usize,
}

impl ZonePopulation {
    pub fn get(&self, zone: ZoneClass) -> usize {
        match zone {
            ZoneClass::Residential => self.residential,
            ZoneClass::Commercial  => self.commercial,
            ZoneClass::Industrial  => self.industrial,
        }
    }

    fn add(&mut self, zone: ZoneClass, n: usize) {
        match zone {
            ZoneClass::Residential => self.residential += n,
            ZoneClass::Commercial  => self.commercial += n,
            ZoneClass::Industrial  => self.industrial += n,
        }
    }
}

pub struct TaxationSubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

impl TaxationSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }

    pub fn zone_population(&self, store: &CityStore, buildings: &[BuildingRecord]) -> SimResult<ZonePopulation> {
        let homes = store.residents_by_home(&self.city_id)?;
        let workplaces = store.employment_counts(&self.city_id)?;
        let mut population = ZonePopulation::default();
        for building in buildings.iter().filter(|b| b.is_complete()) {
            let Some(zone) = self.config.building_type(&building.building_type).and_then(|k| k.zone) else {
                continue;
            };
            let counts = if zone == ZoneClass::Residential { &homes } else { &workplaces };
            population.add(zone, counts.get(&building.building_id).copied().unwrap_or(0));
        }
        Ok(population)
    }

    /// Step 1. Returns the fee revenue and an event per skipped fee.
    fn collect_fees(&self, store: &CityStore, buildings: &[BuildingRecord], ledger: &mut Ledger) -> SimResult<Vec<CityEvent>> {
        let economy = &self.config.economy;
        let mut skipped = Vec::new();
        for building in buildings.iter().filter(|b| b.is_complete()) {
            let (Some(kind), Some(owner)) = (self.config.building_type(&building.building_type), building.owner_id) else {
                continue;
            };
            let floors = building.floors.max(1) as f64;
            let fee = economy.power_rate * kind.power_required * floors
                + economy.water_rate * kind.water_required * floors
                + kind.garbage_fee;
            if fee <= 0.0 {
                continue;
            }
            if store.try_debit_wallet(&self.city_id, owner, fee)? {
                ledger.add_revenue("infrastructure_fees", fee);
            } else {
                skipped.push(CityEvent::FeeSkipped {
                    building_id: building.building_id,
                    owner_id: owner,
                    amount: fee,
                });
            }
        }
        Ok(skipped)
    }

    /// Steps 2 to 6 on an in-memory ledger.
    fn close_books(
        &self,
        economy: &Economy,
        population: &ZonePopulation,
        building_counts: &HashMap<String, usize>,
        networks: (usize, usize, usize),
        ledger: &mut Ledger,
    ) {
        let cfg = &self.config.economy;

        for zone in ZoneClass::ALL {
            let rate = economy.tax_rates.for_zone(zone);
            let tax = population.get(zone) as f64 * rate / 100.0 * cfg.tax_multiplier / DAYS_PER_YEAR as f64;
            if tax > 0.0 {
                ledger.add_revenue(&format!("property_tax_{}", zone.as_str()), tax);
            }
        }

        let capita = population.residential as f64;
        for name in &economy.ordinances {
            let Some(ordinance) = cfg.ordinances.get(name) else {
                continue;
            };
            if ordinance.revenue_per_capita > 0.0 {
                ledger.add_revenue(&format!("ordinance_{name}"), ordinance.revenue_per_capita * capita);
            }
            if ordinance.cost_per_capita > 0.0 {
                ledger.add_expense(&format!("ordinance_{name}"), ordinance.cost_per_capita * capita);
            }
        }

        for (name, department) in &cfg.departments {
            let count: usize = department
                .building_types
                .iter()
                .map(|t| building_counts.get(t).copied().unwrap_or(0))
                .sum();
            let cost = department.cost_per_building * count as f64 * cfg.funding(economy, name) / 100.0;
            if cost > 0.0 {
                ledger.add_expense(&format!("department_{name}"), cost);
            }
        }

        let (roads, lines, pipes) = networks;
        let maintenance = (roads as f64 * cfg.maintenance.road
            + lines as f64 * cfg.maintenance.power_line
            + pipes as f64 * cfg.maintenance.water_pipe)
            * cfg.funding(economy, &cfg.transit_department)
            / 100.0;
        if maintenance > 0.0 {
            ledger.add_expense("maintenance", maintenance);
        }

        let interest: f64 = economy
            .bonds
            .iter()
            .map(|b| b.principal * b.annual_rate / 100.0 / DAYS_PER_YEAR as f64)
            .sum();
        if interest > 0.0 {
            ledger.add_expense("bond_interest", interest);
        }
    }

    fn city_value(&self, buildings: &[BuildingRecord], treasury: f64) -> f64 {
        let built: f64 = buildings
            .iter()
            .filter(|b| b.is_complete())
            .filter_map(|b| {
                self.config
                    .building_type(&b.building_type)
                    .map(|k| k.construction_cost * b.floors.max(1) as f64)
            })
            .sum();
        built + treasury.max(0.0)
    }

    /// Run the close for `time`'s day. Returns no events if the day was
    /// already closed.
    pub fn collect(&self, store: &CityStore, time: &CityTime) -> SimResult<Vec<CityEvent>> {
        if !store.claim_job_day(&self.city_id, TAXATION_JOB, time.day_index())? {
            return Ok(vec![]);
        }
        let city = store.require_city(&self.city_id)?;
        let mut economy = city.economy;
        let buildings = store.buildings(&self.city_id)?;

        let mut today = Ledger::default();
        let mut events = self.collect_fees(store, &buildings, &mut today)?;
        let population = self.zone_population(store, &buildings)?;
        let counts = store.completed_building_counts(&self.city_id)?;
        let networks = store.network_counts(&self.city_id)?;
        self.close_books(&economy, &population, &counts, networks, &mut today);

        let revenue = today.total_revenue();
        let expenses = today.total_expenses();
        let net = revenue - expenses;
        store.adjust_treasury(&self.city_id, net)?;
        let treasury = city.treasury + net;

        if economy.ytd_year != time.year {
            economy.ytd = Ledger::default();
            economy.ytd_year = time.year;
        }
        economy.ytd.merge(&today);
        let debt: f64 = economy.bonds.iter().map(|b| b.principal).sum();
        economy.credit_rating = CreditRating::from_debt_ratio(debt, self.city_value(&buildings, treasury));
        store.update_economy(&self.city_id, &economy)?;

        log::debug!(
            "tick={} taxation: revenue {revenue:.2} expenses {expenses:.2} treasury {treasury:.2} rating {}",
            time.tick,
            economy.credit_rating.as_str()
        );
        events.push(CityEvent::TaxCollected {
            revenue,
            expenses,
            net,
            treasury,
            credit_rating: economy.credit_rating.as_str().to_string(),
        });
        Ok(events)
    }
}

impl CitySubsystem for TaxationSubsystem {
    fn name(&self) -> &'static str {
        "taxation"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        self.collect(store, time)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
