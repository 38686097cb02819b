use crate::{
    clock::CityTime,
    error::SimResult,
    event::CityEvent,
    model::{Bond, WarningStatus, ZoneClass},
    store::CityStore,
    types::{CityId, EntityId, Tick},
};
use serde::{Deserialize, Serialize};

/// Administrative commands, applied at the start of the target city's
/// next tick. Variants are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AdminCommand {
    // ── Land ──────────────────────────────────────
    DemolishBuilding {
        building_id: EntityId,
    },

    // ── Rent ──────────────────────────────────────
    LeaseUnit {
        unit_id:  EntityId,
        agent_id: EntityId,
    },
    /// Tenant pays the owed amount to the building owner.
    PayRentWarning {
        warning_id: EntityId,
    },

    // ── Budget ────────────────────────────────────
    SetTaxRate {
        zone: ZoneClass,
        rate: f64,
    },
    SetDepartmentFunding {
        department: String,
        percent:    f64,
    },
    SetOrdinance {
        name:    String,
        enabled: bool,
    },
    /// `annual_rate` is in percent.
    IssueBond {
        principal:   f64,
        annual_rate: f64,
    },
}

/// A queued command with its submission tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub city_id:    CityId,
    pub queued_at:  Tick,
    pub command_id: String,
    pub command:    AdminCommand,
}

impl QueuedCommand {
    pub fn new(city_id: &str, queued_at: Tick, command: AdminCommand) -> Self {
        Self {
            city_id: city_id.to_string(),
            queued_at,
            command_id: uuid::Uuid::new_v4().to_string(),
            command,
        }
    }
}

impl AdminCommand {
    /// Apply to `city_id`. Commands naming missing records are logged and
    /// dropped.
    pub fn apply(&self, city_id: &str, store: &CityStore, time: &CityTime) -> SimResult<Vec<CityEvent>> {
        match self {
            Self::DemolishBuilding { building_id } => {
                if !store.delete_building(city_id, *building_id)? {
                    log::warn!("city={city_id} commands: building {building_id} not found");
                    return Ok(vec![]);
                }
                log::info!("tick={} commands: building {building_id} demolished", time.tick);
                Ok(vec![CityEvent::BuildingDemolished {
                    building_id: *building_id,
                    cause: "demolished".to_string(),
                }])
            }

            Self::LeaseUnit { unit_id, agent_id } => {
                if store.agent(city_id, *agent_id)?.is_none() {
                    log::warn!("city={city_id} commands: agent {agent_id} not found");
                } else if !store.lease_unit(city_id, *unit_id, *agent_id, time.tick)? {
                    log::warn!("city={city_id} commands: unit {unit_id} is not vacant");
                }
                Ok(vec![])
            }

            Self::PayRentWarning { warning_id } => {
                pay_rent_warning(city_id, store, *warning_id)?;
                Ok(vec![])
            }

            Self::SetTaxRate { zone, rate } => {
                let mut economy = store.require_city(city_id)?.economy;
                economy.tax_rates.set(*zone, *rate);
                store.update_economy(city_id, &economy)?;
                Ok(vec![])
            }

            Self::SetDepartmentFunding { department, percent } => {
                let mut economy = store.require_city(city_id)?.economy;
                economy.department_funding.insert(department.clone(), percent.max(0.0));
                store.update_economy(city_id, &economy)?;
                Ok(vec![])
            }

            Self::SetOrdinance { name, enabled } => {
                let mut economy = store.require_city(city_id)?.economy;
                economy.ordinances.retain(|o| o != name);
                if *enabled {
                    economy.ordinances.push(name.clone());
                }
                store.update_economy(city_id, &economy)?;
                Ok(vec![])
            }

            Self::IssueBond { principal, annual_rate } => {
                let mut economy = store.require_city(city_id)?.economy;
                economy.bonds.push(Bond {
                    principal: *principal,
                    annual_rate: *annual_rate,
                    issued_day: time.day_index(),
                });
                store.update_economy(city_id, &economy)?;
                store.adjust_treasury(city_id, *principal)?;
                Ok(vec![])
            }
        }
    }
}

/// Move the owed amount from tenant to building owner and mark the warning
/// paid. Returns false, changing nothing, when the tenant is short.
pub fn pay_rent_warning(city_id: &str, store: &CityStore, warning_id: EntityId) -> SimResult<bool> {
    let Some(warning) = store.warning(city_id, warning_id)? else {
        log::warn!("city={city_id} commands: rent warning {warning_id} not found");
        return Ok(false);
    };
    if warning.status == WarningStatus::Paid {
        return Ok(true);
    }
    if !store.try_debit_wallet(city_id, warning.tenant_id, warning.amount_owed)? {
        log::debug!("city={city_id} commands: tenant {} cannot pay warning {warning_id}", warning.tenant_id);
        return Ok(false);
    }
    let owner = match store.rental_unit(city_id, warning.unit_id)? {
        Some(unit) => store.building(city_id, unit.building_id)?.and_then(|b| b.owner_id),
        None => None,
    };
    if let Some(owner) = owner {
        store.adjust_wallet(city_id, owner, warning.amount_owed)?;
    }
    store.set_warning_status(city_id, warning_id, WarningStatus::Paid)?;
    Ok(true)
}
