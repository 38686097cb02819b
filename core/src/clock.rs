//! Simulation clock. Owns the authoritative tick counter and derives
//! city time from it.
//!
//! Time is monotonic and derived solely from the tick. The only way to
//! move backwards is the administrative `SimEngine::set_time`.

use crate::{
    error::{SimError, SimResult},
    types::Tick,
};
use serde::{Deserialize, Serialize};

/// Hour of day at tick 0.
pub const START_HOUR: u64 = 8;
pub const HOURS_PER_DAY: u64 = 24;
pub const DAYS_PER_YEAR: u64 = 365;
pub const EPOCH_YEAR: u32 = 2000;
pub const DAYLIGHT_START_HOUR: u32 = 6;
pub const DAYLIGHT_END_HOUR: u32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub current_tick: Tick,
    pub speed:        SimSpeed,
    pub running:      bool,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            current_tick: 0,
            speed: SimSpeed::Normal,
            running: false,
        }
    }

    /// Advance one tick. Returns the new tick number.
    pub fn advance(&mut self) -> Tick {
        self.current_tick += 1;
        self.current_tick
    }

    pub fn stop(&mut self)  { self.running = false; }
    pub fn start(&mut self) { self.running = true;  }

    pub fn set_speed(&mut self, speed: SimSpeed) {
        self.speed = speed;
    }

    /// Overwrite the tick counter. Only the time-travel control uses this.
    pub fn jump_to(&mut self, tick: Tick) {
        self.current_tick = tick;
    }

    pub fn tick_interval_ms(&self) -> u64 {
        match self.speed {
            SimSpeed::Normal => 1000,
            SimSpeed::Fast   => 250,
            SimSpeed::Ultra  => 50,
        }
    }
}

impl Default for SimClock {
    fn default() -> Self { Self::new() }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    Normal,
    Fast,
    Ultra,
}

/// Wall time of every city at a given tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CityTime {
    pub tick:        Tick,
    pub hour:        u32,
    pub day:         u32,
    pub year:        u32,
    pub is_daylight: bool,
}

impl CityTime {
    pub fn from_tick(tick: Tick, ticks_per_minute: u64) -> Self {
        let minutes = tick / ticks_per_minute.max(1);
        let total_hours = START_HOUR + minutes / 60;
        let hour = (total_hours % HOURS_PER_DAY) as u32;
        let elapsed_days = total_hours / HOURS_PER_DAY;
        let day = (elapsed_days % DAYS_PER_YEAR) as u32 + 1;
        let year = EPOCH_YEAR + (elapsed_days / DAYS_PER_YEAR) as u32;
        Self {
            tick,
            hour,
            day,
            year,
            is_daylight: (DAYLIGHT_START_HOUR..DAYLIGHT_END_HOUR).contains(&hour),
        }
    }

    /// Absolute day number since the epoch (0-based).
    pub fn day_index(&self) -> u64 {
        (self.year - EPOCH_YEAR) as u64 * DAYS_PER_YEAR + (self.day as u64 - 1)
    }

    /// Absolute hour number since the epoch (0-based).
    pub fn hour_index(&self) -> u64 {
        self.day_index() * HOURS_PER_DAY + self.hour as u64
    }
}

pub fn ticks_per_hour(ticks_per_minute: u64) -> Tick {
    ticks_per_minute.max(1) * 60
}

pub fn ticks_per_day(ticks_per_minute: u64) -> Tick {
    ticks_per_hour(ticks_per_minute) * HOURS_PER_DAY
}

/// Reverse-derive the first tick of `hour` on `day` of `year`.
pub fn tick_for(hour: u32, day: u32, year: u32, ticks_per_minute: u64) -> SimResult<Tick> {
    let invalid = || SimError::InvalidTime { hour, day, year };
    if hour >= HOURS_PER_DAY as u32 || day == 0 || day as u64 > DAYS_PER_YEAR || year < EPOCH_YEAR {
        return Err(invalid());
    }
    let total_hours = ((year - EPOCH_YEAR) as u64 * DAYS_PER_YEAR + (day as u64 - 1))
        * HOURS_PER_DAY
        + hour as u64;
    let elapsed = total_hours.checked_sub(START_HOUR).ok_or_else(invalid)?;
    Ok(elapsed * ticks_per_hour(ticks_per_minute))
}
