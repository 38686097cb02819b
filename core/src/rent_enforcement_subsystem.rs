//! Rent enforcement: the daily legal pipeline.
//!
//!   occupied unit, rent due every `period_days` since lease start
//!     -> pending warning, due `warning_days` later; a period whose due
//!        day was skipped is warned on the next pass
//!     -> unpaid at the due tick: warning escalated, court case opened with
//!        the hearing `hearing_days` later and the building owner as plaintiff
//!     -> at the hearing: paid warning => dismissed,
//!        otherwise guilty, lease terminated, `jail_days` in jail
//!     -> at the release tick the agent goes back to idle
//!
//! Each daily pass handles releases first, then hearings, then escalations,
//! then new warnings, so a step opened today is never judged today.
//!
//! Execution: daily at `rent_enforcement_hour`, guarded by the
//! `rent_enforcement` job marker.

use crate::{
    clock::CityTime,
    config::SimConfig,
    error::SimResult,
    event::CityEvent,
    model::{AgentState, CourtCaseRecord, Verdict, WarningStatus},
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::{CityId, EntityId, Tick},
};
use std::{any::Any, sync::Arc};

pub const RENT_JOB: &str = "rent_enforcement";
pub const JAIL_SENTENCE: &str = "jail";

pub struct RentEnforcementSubsystem {
    city_id: CityId,
    config:  Arc<SimConfig>,
}

impl RentEnforcementSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config }
    }

    fn days(&self, n: u64) -> Tick {
        n * self.config.ticks_per_day()
    }

    fn release_inmates(&self, store: &CityStore, tick: Tick) -> SimResult<Vec<EntityId>> {
        let mut released = Vec::new();
        for inmate in store.inmates_due_release(&self.city_id, tick)? {
            store.release_inmate(&self.city_id, inmate.inmate_id)?;
            store.set_agent_state(&self.city_id, inmate.agent_id, AgentState::Idle)?;
            released.push(inmate.agent_id);
        }
        Ok(released)
    }

    fn judge(&self, store: &CityStore, case: &CourtCaseRecord, jailed: &mut Vec<EntityId>) -> SimResult<CityEvent> {
        let warning = match case.warning_id {
            Some(id) => store.warning(&self.city_id, id)?,
            None => None,
        };
        let paid = warning.as_ref().is_some_and(|w| w.status == WarningStatus::Paid);
        if paid {
            store.close_case(&self.city_id, case.case_id, Verdict::Dismissed, None)?;
            log::info!("city={} rent: case {} dismissed, rent was paid", self.city_id, case.case_id);
            return Ok(CityEvent::VerdictReached {
                case_id: case.case_id,
                verdict: Verdict::Dismissed.as_str().to_string(),
            });
        }

        store.close_case(&self.city_id, case.case_id, Verdict::Guilty, Some(JAIL_SENTENCE))?;
        if let Some(warning) = &warning {
            match store.rental_unit(&self.city_id, warning.unit_id)? {
                Some(unit) if unit.tenant_id == Some(case.defendant_id) => {
                    store.vacate_unit(&self.city_id, unit.unit_id)?;
                }
                _ => {}
            }
        }
        if store.incarcerated(&self.city_id, case.defendant_id)? {
            log::warn!(
                "city={} rent: agent {} already incarcerated, case {} adds no term",
                self.city_id, case.defendant_id, case.case_id
            );
        } else {
            let release = case.hearing_tick + self.days(self.config.sim.rent.jail_days);
            store.insert_inmate(&self.city_id, case.defendant_id, case.case_id, case.hearing_tick, release)?;
            store.set_agent_state(&self.city_id, case.defendant_id, AgentState::InJail)?;
            store.clear_agent_trip(&self.city_id, case.defendant_id)?;
            jailed.push(case.defendant_id);
        }
        log::info!(
            "city={} rent: case {} guilty, agent {} jailed",
            self.city_id, case.case_id, case.defendant_id
        );
        Ok(CityEvent::VerdictReached {
            case_id: case.case_id,
            verdict: Verdict::Guilty.as_str().to_string(),
        })
    }

    fn escalate(&self, store: &CityStore, tick: Tick) -> SimResult<Vec<CityEvent>> {
        let mut events = Vec::new();
        for warning in store.pending_warnings(&self.city_id)? {
            if tick < warning.due_tick {
                continue;
            }
            store.set_warning_status(&self.city_id, warning.warning_id, WarningStatus::Escalated)?;
            let plaintiff = match store.rental_unit(&self.city_id, warning.unit_id)? {
                Some(unit) => store.building(&self.city_id, unit.building_id)?.and_then(|b| b.owner_id),
                None => None,
            };
            let hearing_tick = tick + self.days(self.config.sim.rent.hearing_days);
            let case_id = store.insert_court_case(
                &self.city_id,
                warning.warning_id,
                warning.tenant_id,
                plaintiff,
                warning.amount_owed,
                hearing_tick,
            )?;
            events.push(CityEvent::CourtCaseOpened {
                case_id,
                defendant_id: warning.tenant_id,
                hearing_tick,
            });
        }
        Ok(events)
    }

    fn issue_warnings(&self, store: &CityStore, tick: Tick) -> SimResult<Vec<CityEvent>> {
        let rent = &self.config.sim.rent;
        let tpd = self.config.ticks_per_day();
        let mut events = Vec::new();
        for unit in store.occupied_units(&self.city_id)? {
            let (Some(tenant), Some(lease_start)) = (unit.tenant_id, unit.lease_start) else {
                continue;
            };
            let periods = tick.saturating_sub(lease_start) / tpd / rent.period_days.max(1);
            if periods == 0 || store.pending_warning_for_unit(&self.city_id, unit.unit_id)?.is_some() {
                continue;
            }
            let warned = store.lease_warning_count(&self.city_id, unit.unit_id, tenant, lease_start)?;
            if warned >= periods {
                continue;
            }
            let due_tick = tick + self.days(rent.warning_days);
            let warning_id =
                store.insert_warning(&self.city_id, unit.unit_id, tenant, unit.rent, tick, due_tick)?;
            events.push(CityEvent::RentWarningIssued {
                warning_id,
                unit_id: unit.unit_id,
                tenant_id: tenant,
                amount: unit.rent,
                due_tick,
            });
        }
        Ok(events)
    }

    /// One enforcement pass. A second call on the same day does nothing.
    pub fn enforce(&self, store: &CityStore, time: &CityTime) -> SimResult<Vec<CityEvent>> {
        if !store.claim_job_day(&self.city_id, RENT_JOB, time.day_index())? {
            return Ok(vec![]);
        }
        let tick = time.tick;
        let mut events = Vec::new();

        let released = self.release_inmates(store, tick)?;
        let mut jailed = Vec::new();
        for case in store.cases_due(&self.city_id, tick)? {
            events.push(self.judge(store, &case, &mut jailed)?);
        }
        events.extend(self.escalate(store, tick)?);
        events.extend(self.issue_warnings(store, tick)?);

        if !jailed.is_empty() || !released.is_empty() {
            events.push(CityEvent::JailUpdate { jailed, released });
        }
        log::debug!("tick={tick} rent: {} legal events", events.len());
        Ok(events)
    }
}

impl CitySubsystem for RentEnforcementSubsystem {
    fn name(&self) -> &'static str {
        "rent_enforcement"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        self.enforce(store, time)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
