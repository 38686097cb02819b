//! Tax penalties on skipped infrastructure fees.
//!
//! Fees the taxation close could not collect arrive as `fee_skipped` events
//! on the same tick and are added to the building's arrears. Existing
//! arrears are collected into the treasury when the owner can cover them,
//! otherwise they grow by `tax_penalty_rate`.
//!
//! Execution: daily, after taxation.

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
use std::{any::Any, collections::BTreeMap, sync::Arc};

pub const TAX_PENALTY_JOB: &str = "tax_penalty";

pub struct TaxPenaltySubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

impl TaxPenaltySubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }
}

impl CitySubsystem for TaxPenaltySubsystem {
    fn name(&self) -> &'static str {
        "tax_penalty"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        if !store.claim_job_day(&self.city_id, TAX_PENALTY_JOB, time.day_index())? {
            return Ok(vec![]);
        }
        let mut skipped: BTreeMap<EntityId, f64> = BTreeMap::new();
        for event in events_in {
            if let CityEvent::FeeSkipped { building_id, amount, .. } = event {
                *skipped.entry(*building_id).or_insert(0.0) += amount;
            }
        }

        let rate = self.config.economy.tax_penalty_rate;
        let mut events = Vec::new();
        for building in store.buildings(&self.city_id)? {
            let new_fee = skipped.get(&building.building_id).copied().unwrap_or(0.0);
            if building.fee_arrears <= 0.0 && new_fee <= 0.0 {
                continue;
            }
            let mut arrears = building.fee_arrears;
            let mut penalised = false;
            if arrears > 0.0 {
                let paid = match building.owner_id {
                    Some(owner) => store.try_debit_wallet(&self.city_id, owner, arrears)?,
                    None => false,
                };
                if paid {
                    store.adjust_treasury(&self.city_id, arrears)?;
                    events.push(CityEvent::ArrearsCollected { building_id: building.building_id, amount: arrears });
                    arrears = 0.0;
                } else {
                    arrears *= 1.0 + rate;
                    penalised = true;
                }
            }
            arrears += new_fee;
            if penalised || new_fee > 0.0 {
                events.push(CityEvent::TaxPenaltyAssessed { building_id: building.building_id, arrears });
            }
            store.set_fee_arrears(&self.city_id, building.building_id, arrears)?;
        }
        if !events.is_empty() {
            log::debug!("tick={} tax_penalty: {} arrears events", time.tick, events.len());
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
