//! Cadence gates for bundle jobs.
//!
//! Each gate remembers the last tick, hour or day it ran on, so a job
//! fires once per period even if ticks are skipped or the interval changes.

use crate::{clock::CityTime, types::Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    EveryTick,
    /// At least `n` ticks after the previous run.
    EveryTicks(Tick),
    /// Once per in-game hour.
    Hourly,
    /// Once per in-game day, at the first tick at or after `hour`.
    DailyAt(u32),
}

#[derive(Debug, Clone)]
pub struct CadenceGate {
    pub cadence: Cadence,
    last:        Option<u64>,
}

impl CadenceGate {
    pub fn new(cadence: Cadence) -> Self {
        Self { cadence, last: None }
    }

    /// Returns true (and records the run) when the job is due.
    pub fn due(&mut self, time: &CityTime) -> bool {
        let marker = match self.cadence {
            Cadence::EveryTick => return true,
            Cadence::EveryTicks(n) => {
                if let Some(last) = self.last {
                    if time.tick < last + n && time.tick >= last {
                        return false;
                    }
                }
                time.tick
            }
            Cadence::Hourly => {
                let hour = time.hour_index();
                if self.last == Some(hour) {
                    return false;
                }
                hour
            }
            Cadence::DailyAt(at) => {
                let day = time.day_index();
                if time.hour < at || self.last == Some(day) {
                    return false;
                }
                day
            }
        };
        self.last = Some(marker);
        true
    }

    /// Forget the last run, e.g. after a time jump.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
