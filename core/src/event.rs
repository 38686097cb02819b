//! The event stream: everything the simulation tells the outside world.
//!
//! Subsystems emit `CityEvent`s; the engine wraps each city's list into a
//! single `EngineEvent::Tick` and forwards it to the broadcaster.
//! Subsystems also read the events emitted earlier in the same tick, which
//! is how the population lifecycle learns about completions and demolitions.

use crate::{
    clock::CityTime,
    types::{CityId, EntityId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildingStatus {
    pub building_id: EntityId,
    pub powered:     bool,
    pub has_water:   bool,
    pub has_waste:   bool,
}

/// Every per-city event emitted during simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CityEvent {
    // ── Movement ───────────────────────────────────
    AgentMoved {
        agent_id: EntityId,
        x: f64,
        y: f64,
    },
    AgentArrived {
        agent_id: EntityId,
        building_id: Option<EntityId>,
    },

    // ── Building lifecycle ─────────────────────────
    BuildingCompleted {
        building_id: EntityId,
        building_type: String,
    },
    BuildingDemolished {
        building_id: EntityId,
        cause: String,
    },
    BuildingUpgraded {
        building_id: EntityId,
        floors: u32,
    },
    BuildingsUpdated {
        utility: String,
        buildings: Vec<BuildingStatus>,
    },
    ZoneBuildingPlaced {
        building_id: EntityId,
        parcel_id: EntityId,
        building_type: String,
        cost: f64,
    },
    FireStarted {
        building_id: EntityId,
    },

    // ── Population & employment ────────────────────
    ResidentSpawned {
        resident_id: EntityId,
        building_id: EntityId,
    },
    ResidentsDisplaced {
        building_id: EntityId,
        count: usize,
    },
    ResidentEmployed {
        resident_id: EntityId,
        building_id: EntityId,
        salary: f64,
    },
    JobsLost {
        building_id: EntityId,
        count: usize,
    },
    PayrollProcessed {
        employees: usize,
        total: f64,
    },
    DemandUpdated {
        residential: f64,
        commercial: f64,
        industrial: f64,
    },

    // ── Fiscal ─────────────────────────────────────
    TaxCollected {
        revenue: f64,
        expenses: f64,
        net: f64,
        treasury: f64,
        credit_rating: String,
    },
    FeeSkipped {
        building_id: EntityId,
        owner_id: EntityId,
        amount: f64,
    },
    TaxPenaltyAssessed {
        building_id: EntityId,
        arrears: f64,
    },
    ArrearsCollected {
        building_id: EntityId,
        amount: f64,
    },

    // ── Legal pipeline ─────────────────────────────
    RentWarningIssued {
        warning_id: EntityId,
        unit_id: EntityId,
        tenant_id: EntityId,
        amount: f64,
        due_tick: Tick,
    },
    CourtCaseOpened {
        case_id: EntityId,
        defendant_id: EntityId,
        hearing_tick: Tick,
    },
    VerdictReached {
        case_id: EntityId,
        verdict: String,
    },
    JailUpdate {
        jailed: Vec<EntityId>,
        released: Vec<EntityId>,
    },
}

impl CityEvent {
    /// Stable string name of the variant, used for the event_type column.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgentMoved { .. }         => "agent_moved",
            Self::AgentArrived { .. }       => "agent_arrived",
            Self::BuildingCompleted { .. }  => "building_completed",
            Self::BuildingDemolished { .. } => "building_demolished",
            Self::BuildingUpgraded { .. }   => "building_upgraded",
            Self::BuildingsUpdated { .. }   => "buildings_updated",
            Self::ZoneBuildingPlaced { .. } => "zone_building_placed",
            Self::FireStarted { .. }        => "fire_started",
            Self::ResidentSpawned { .. }    => "resident_spawned",
            Self::ResidentsDisplaced { .. } => "residents_displaced",
            Self::ResidentEmployed { .. }   => "resident_employed",
            Self::JobsLost { .. }           => "jobs_lost",
            Self::PayrollProcessed { .. }   => "payroll_processed",
            Self::DemandUpdated { .. }      => "demand_updated",
            Self::TaxCollected { .. }       => "tax_collected",
            Self::FeeSkipped { .. }         => "fee_skipped",
            Self::TaxPenaltyAssessed { .. } => "tax_penalty_assessed",
            Self::ArrearsCollected { .. }   => "arrears_collected",
            Self::RentWarningIssued { .. }  => "rent_warning_issued",
            Self::CourtCaseOpened { .. }    => "court_case_opened",
            Self::VerdictReached { .. }     => "verdict_reached",
            Self::JailUpdate { .. }         => "jail_update",
        }
    }
}

/// Engine-level events handed to the external broadcaster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Started {
        tick: Tick,
    },
    Stopped {
        tick: Tick,
    },
    Tick {
        city_id: CityId,
        time: CityTime,
        events: Vec<CityEvent>,
    },
    DayStarted {
        time: CityTime,
    },
    NightStarted {
        time: CityTime,
    },
}

/// Receiver for the engine's event stream (websocket fan-out lives
/// outside this crate).
pub trait EventBroadcaster: Send {
    fn broadcast(&mut self, event: &EngineEvent);
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub city_id: CityId,
    pub tick: Tick,
    pub subsystem: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized CityEvent
}
