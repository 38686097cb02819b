//! Employment: hourly job matching and daily payroll.
//!
//! Matching walks unemployed residents in id order and gives each the first
//! completed workplace with an open slot (slots = jobs per floor x floors).
//! Payroll runs once per day at `daily_job_hour` and credits every salary
//! to the owner of the workplace.

use crate::{
    clock::CityTime,
    config::SimConfig,
    error::SimResult,
    event::CityEvent,
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::{CityId, EntityId},
};
use std::{any::Any, collections::HashMap, sync::Arc};

pub const PAYROLL_JOB: &str = "payroll";

pub struct EmploymentSubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

impl EmploymentSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }

    pub fn match_jobs(&self, store: &CityStore) -> SimResult<Vec<CityEvent>> {
        let seekers = store.unemployed_residents(&self.city_id)?;
        if seekers.is_empty() {
            return Ok(vec![]);
        }
        let filled = store.employment_counts(&self.city_id)?;

        // (building, open slots, salary) in building id order.
        let mut openings: Vec<(EntityId, usize, f64)> = store
            .buildings(&self.city_id)?
            .into_iter()
            .filter(|b| b.is_complete())
            .filter_map(|b| {
                let kind = self.config.building_type(&b.building_type)?;
                let slots = kind.job_slots(b.floors) as usize;
                let taken = filled.get(&b.building_id).copied().unwrap_or(0);
                (slots > taken).then_some((b.building_id, slots - taken, kind.salary))
            })
            .collect();

        let mut events = Vec::new();
        for resident in seekers {
            let Some(opening) = openings.iter_mut().find(|(_, open, _)| *open > 0) else {
                break;
            };
            let (building_id, open, salary) = opening;
            *open -= 1;
            store.employ_resident(&self.city_id, resident.resident_id, *building_id, *salary)?;
            events.push(CityEvent::ResidentEmployed {
                resident_id: resident.resident_id,
                building_id: *building_id,
                salary: *salary,
            });
        }
        Ok(events)
    }

    /// Pay every employed resident's salary into the workplace owner's
    /// wallet. Returns (employees paid, total paid).
    pub fn run_payroll(&self, store: &CityStore) -> SimResult<(usize, f64)> {
        let mut owners: HashMap<EntityId, Option<EntityId>> = HashMap::new();
        let mut employees = 0;
        let mut total = 0.0;
        for resident in store.employed_residents(&self.city_id)? {
            let Some(work_id) = resident.work_building_id else {
                continue;
            };
            let owner = match owners.get(&work_id) {
                Some(owner) => *owner,
                None => {
                    let owner = store.building(&self.city_id, work_id)?.and_then(|b| b.owner_id);
                    owners.insert(work_id, owner);
                    owner
                }
            };
            let Some(owner) = owner else {
                log::warn!(
                    "city={} employment: workplace {work_id} has no owner, salary of resident {} skipped",
                    self.city_id, resident.resident_id
                );
                continue;
            };
            store.adjust_wallet(&self.city_id, owner, resident.salary)?;
            employees += 1;
            total += resident.salary;
        }
        Ok((employees, total))
    }
}

impl CitySubsystem for EmploymentSubsystem {
    fn name(&self) -> &'static str {
        "employment"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        let mut events = self.match_jobs(store)?;

        // Employment runs hourly, so this is payroll's only hour gate.
        if time.hour >= self.config.sim.daily_job_hour
            && store.claim_job_day(&self.city_id, PAYROLL_JOB, time.day_index())?
        {
            let (employees, total) = self.run_payroll(store)?;
            log::debug!("tick={} employment: payroll {total:.2} to {employees} employees", time.tick);
            events.push(CityEvent::PayrollProcessed { employees, total });
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
