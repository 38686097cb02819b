//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SubsystemRng instances derived
//! from the engine seed, the city id and a stable subsystem slot.
//!
//! Each (city, subsystem) pair gets its own stream, so adding a city or a
//! subsystem never changes the streams of existing ones.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single subsystem of a single city.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    pub fn new(derived_seed: u64) -> Self {
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a u32 in [min, max] inclusive.
    pub fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        min + self.next_u64_below((max - min + 1) as u64) as u32
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Stream factory for one city. Streams advance with the tick so a
/// subsystem that skips a tick does not shift later draws.
pub struct RngBank {
    master_seed: u64,
    city_salt:   u64,
}

impl RngBank {
    pub fn new(master_seed: u64, city_id: &str) -> Self {
        Self { master_seed, city_salt: fnv1a(city_id.as_bytes()) }
    }

    pub fn for_subsystem(&self, slot: SubsystemSlot, tick: u64) -> SubsystemRng {
        let derived = self.master_seed
            ^ self.city_salt
            ^ (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
            ^ tick.wrapping_mul(0xbf58_476d_1ce4_e5b9);
        SubsystemRng::new(derived).with_name(slot.name())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325u64, |hash, b| {
        (hash ^ *b as u64).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Stable subsystem slot assignments.
/// Entries are only ever appended, never reordered or removed.
/// Reordering changes every subsystem's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum SubsystemSlot {
    Commands = 0,
    Construction = 1,
    Population = 2,
    Power = 3,
    Water = 4,
    Waste = 5,
    Agents = 6,
    Vehicles = 7,
    Employment = 8,
    Taxation = 9,
    RentEnforcement = 10,
    LandValue = 11,
    ZoneEvolution = 12,
    Demand = 13,
    Crime = 14,
    Fire = 15,
    ZoneBuild = 16,
    TaxPenalty = 17,
}

impl SubsystemSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Commands => "commands",
            Self::Construction => "construction",
            Self::Population => "population",
            Self::Power => "power",
            Self::Water => "water",
            Self::Waste => "waste",
            Self::Agents => "agents",
            Self::Vehicles => "vehicles",
            Self::Employment => "employment",
            Self::Taxation => "taxation",
            Self::RentEnforcement => "rent_enforcement",
            Self::LandValue => "land_value",
            Self::ZoneEvolution => "zone_evolution",
            Self::Demand => "demand",
            Self::Crime => "crime",
            Self::Fire => "fire",
            Self::ZoneBuild => "zone_build",
            Self::TaxPenalty => "tax_penalty",
        }
    }
}
