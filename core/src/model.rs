//! Typed records exchanged across the repository boundary.

use crate::{
    grid::Footprint,
    types::{CityId, EntityId, Tick, Tile},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── City ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityRecord {
    pub city_id:     CityId,
    pub name:        String,
    pub width:       u32,
    pub height:      u32,
    pub tick:        Tick,
    pub hour:        u32,
    pub day:         u32,
    pub year:        u32,
    pub is_daylight: bool,
    pub treasury:    f64,
    pub economy:     Economy,
    pub demand:      ZoneDemand,
    pub crime_rate:  f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Economy {
    pub tax_rates:          TaxRates,
    pub ordinances:         Vec<String>,
    pub bonds:              Vec<Bond>,
    pub department_funding: BTreeMap<String, f64>,
    pub ytd:                Ledger,
    pub ytd_year:           u32,
    pub credit_rating:      CreditRating,
}

/// Annual property tax rates in percent, per zone class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TaxRates {
    pub residential: f64,
    pub commercial:  f64,
    pub industrial:  f64,
}

impl TaxRates {
    pub fn for_zone(&self, zone: ZoneClass) -> f64 {
        match zone {
            ZoneClass::Residential => self.residential,
            ZoneClass::Commercial  => self.commercial,
            ZoneClass::Industrial  => self.industrial,
        }
    }

    pub fn set(&mut self, zone: ZoneClass, rate: f64) {
        let slot = match zone {
            ZoneClass::Residential => &mut self.residential,
            ZoneClass::Commercial  => &mut self.commercial,
            ZoneClass::Industrial  => &mut self.industrial,
        };
        *slot = rate.clamp(0.0, 100.0);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bond {
    pub principal:   f64,
    pub annual_rate: f64,
    pub issued_day:  u64,
}

/// Year-to-date revenue and expense categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    pub revenue:  BTreeMap<String, f64>,
    pub expenses: BTreeMap<String, f64>,
}

impl Ledger {
    pub fn add_revenue(&mut self, category: &str, amount: f64) {
        *self.revenue.entry(category.to_string()).or_insert(0.0) += amount;
    }

    pub fn add_expense(&mut self, category: &str, amount: f64) {
        *self.expenses.entry(category.to_string()).or_insert(0.0) += amount;
    }

    pub fn total_revenue(&self) -> f64 { self.revenue.values().sum() }
    pub fn total_expenses(&self) -> f64 { self.expenses.values().sum() }

    pub fn merge(&mut self, other: &Ledger) {
        for (k, v) in &other.revenue {
            self.add_revenue(k, *v);
        }
        for (k, v) in &other.expenses {
            self.add_expense(k, *v);
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum CreditRating {
    #[serde(rename = "AAA")] Aaa,
    #[serde(rename = "AA")]  Aa,
    #[serde(rename = "A")]   A,
    #[serde(rename = "BBB")] Bbb,
    #[serde(rename = "BB")]  Bb,
    #[serde(rename = "B")]   B,
    #[serde(rename = "CCC")] Ccc,
    #[serde(rename = "D")]   D,
}

impl CreditRating {
    /// Map a debt / city-value ratio onto the letter ladder.
    pub fn from_debt_ratio(debt: f64, city_value: f64) -> Self {
        if debt <= 0.0 {
            return Self::Aaa;
        }
        if city_value <= 0.0 {
            return Self::D;
        }
        match debt / city_value {
            r if r <= 0.10 => Self::Aaa,
            r if r <= 0.20 => Self::Aa,
            r if r <= 0.30 => Self::A,
            r if r <= 0.45 => Self::Bbb,
            r if r <= 0.60 => Self::Bb,
            r if r <= 0.80 => Self::B,
            r if r <= 1.00 => Self::Ccc,
            _ => Self::D,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aaa => "AAA",
            Self::Aa  => "AA",
            Self::A   => "A",
            Self::Bbb => "BBB",
            Self::Bb  => "BB",
            Self::B   => "B",
            Self::Ccc => "CCC",
            Self::D   => "D",
        }
    }
}

/// Residential / commercial / industrial demand, each in [-1, 1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ZoneDemand {
    pub residential: f64,
    pub commercial:  f64,
    pub industrial:  f64,
}

impl ZoneDemand {
    pub fn for_zone(&self, zone: ZoneClass) -> f64 {
        match zone {
            ZoneClass::Residential => self.residential,
            ZoneClass::Commercial  => self.commercial,
            ZoneClass::Industrial  => self.industrial,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ZoneClass {
    Residential,
    Commercial,
    Industrial,
}

impl ZoneClass {
    pub const ALL: [ZoneClass; 3] = [Self::Residential, Self::Commercial, Self::Industrial];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Commercial  => "commercial",
            Self::Industrial  => "industrial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "residential"          => Some(Self::Residential),
            "commercial" | "office" => Some(Self::Commercial),
            "industrial"           => Some(Self::Industrial),
            _ => None,
        }
    }
}

// ── Land ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelRecord {
    pub parcel_id:  EntityId,
    pub x:          i32,
    pub y:          i32,
    pub terrain:    String,
    pub zoning:     Option<ZoneClass>,
    pub owner_id:   Option<EntityId>,
    pub land_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub building_id:   EntityId,
    pub parcel_id:     EntityId,
    pub building_type: String,
    pub x:             i32,
    pub y:             i32,
    pub width:         u32,
    pub height:        u32,
    pub floors:        u32,
    pub owner_id:      Option<EntityId>,
    pub powered:       bool,
    pub has_water:     bool,
    pub has_waste:     bool,
    pub progress:      f64,
    pub garbage_level: f64,
    pub crime_level:   f64,
    pub fire_level:    f64,
    pub fee_arrears:   f64,
}

impl BuildingRecord {
    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.x, self.y, self.width, self.height)
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 100.0
    }

    pub fn is_operational(&self) -> bool {
        self.powered && self.has_water
    }

    pub fn origin(&self) -> Tile {
        (self.x, self.y)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadRecord {
    pub road_id:      EntityId,
    pub parcel_id:    EntityId,
    pub x:            i32,
    pub y:            i32,
    pub direction:    String,
    pub lanes:        u32,
    pub speed_limit:  f64,
    pub traffic_load: f64,
}

/// A power line or water pipe: an undirected edge between two tiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub edge_id:  EntityId,
    pub from:     Tile,
    pub to:       Tile,
    pub capacity: f64,
    pub load:     f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    PowerLine,
    WaterPipe,
}

impl NetworkKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::PowerLine => "power_line",
            Self::WaterPipe => "water_pipe",
        }
    }
}

// ── Agents & vehicles ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Idle,
    Traveling,
    Working,
    Shopping,
    Sleeping,
    Socializing,
    InJail,
}

impl AgentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle        => "idle",
            Self::Traveling   => "traveling",
            Self::Working     => "working",
            Self::Shopping    => "shopping",
            Self::Sleeping    => "sleeping",
            Self::Socializing => "socializing",
            Self::InJail      => "in_jail",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "traveling"   => Self::Traveling,
            "working"     => Self::Working,
            "shopping"    => Self::Shopping,
            "sleeping"    => Self::Sleeping,
            "socializing" => Self::Socializing,
            "in_jail"     => Self::InJail,
            _             => Self::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schedule {
    pub work_start: u32,
    pub work_end:   u32,
}

impl Default for Schedule {
    fn default() -> Self {
        Self { work_start: 8, work_end: 17 }
    }
}

impl Schedule {
    /// Whether `hour` falls inside the shift. Night shifts wrap past midnight.
    pub fn on_shift(&self, hour: u32) -> bool {
        if self.work_start <= self.work_end {
            (self.work_start..self.work_end).contains(&hour)
        } else {
            hour >= self.work_start || hour < self.work_end
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id:         EntityId,
    pub name:             String,
    pub home_building_id: Option<EntityId>,
    pub work_building_id: Option<EntityId>,
    pub x:                f64,
    pub y:                f64,
    pub destination:      Option<(f64, f64)>,
    pub destination_building_id: Option<EntityId>,
    pub path:             Vec<(f64, f64)>,
    pub state:            AgentState,
    pub schedule:         Schedule,
    pub wallet:           f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub vehicle_id:   EntityId,
    pub owner_id:     Option<EntityId>,
    pub vehicle_type: String,
    pub x:            f64,
    pub y:            f64,
    pub destination:  Option<(f64, f64)>,
    pub path:         Vec<(f64, f64)>,
    pub speed:        f64,
}

// ── Population ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidentRecord {
    pub resident_id:      EntityId,
    pub home_building_id: Option<EntityId>,
    pub work_building_id: Option<EntityId>,
    pub salary:           f64,
}

// ── Legal pipeline ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Vacant,
    Occupied,
    Reserved,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vacant   => "vacant",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "occupied" => Self::Occupied,
            "reserved" => Self::Reserved,
            _          => Self::Vacant,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalUnitRecord {
    pub unit_id:     EntityId,
    pub building_id: EntityId,
    pub floor:       u32,
    pub unit_number: u32,
    pub unit_type:   String,
    pub rent:        f64,
    pub tenant_id:   Option<EntityId>,
    pub lease_start: Option<Tick>,
    pub status:      UnitStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningStatus {
    Pending,
    Paid,
    Escalated,
}

impl WarningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending   => "pending",
            Self::Paid      => "paid",
            Self::Escalated => "escalated",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "paid"      => Self::Paid,
            "escalated" => Self::Escalated,
            _           => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentWarningRecord {
    pub warning_id:  EntityId,
    pub unit_id:     EntityId,
    pub tenant_id:   EntityId,
    pub amount_owed: f64,
    pub issued_tick: Tick,
    pub due_tick:    Tick,
    pub status:      WarningStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pending,
    InProgress,
    Closed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending    => "pending",
            Self::InProgress => "in_progress",
            Self::Closed     => "closed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "in_progress" => Self::InProgress,
            "closed"      => Self::Closed,
            _             => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Guilty,
    Dismissed,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guilty    => "guilty",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "guilty"    => Some(Self::Guilty),
            "dismissed" => Some(Self::Dismissed),
            _           => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtCaseRecord {
    pub case_id:      EntityId,
    pub warning_id:   Option<EntityId>,
    pub defendant_id: EntityId,
    pub plaintiff_id: Option<EntityId>,
    pub amount:       f64,
    pub hearing_tick: Tick,
    pub verdict:      Option<Verdict>,
    pub sentence:     Option<String>,
    pub status:       CaseStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InmateStatus {
    Incarcerated,
    Released,
}

impl InmateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incarcerated => "incarcerated",
            Self::Released     => "released",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "released" => Self::Released,
            _          => Self::Incarcerated,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JailInmateRecord {
    pub inmate_id:     EntityId,
    pub agent_id:      EntityId,
    pub case_id:       Option<EntityId>,
    pub check_in_tick: Tick,
    pub release_tick:  Tick,
    pub status:        InmateStatus,
}
