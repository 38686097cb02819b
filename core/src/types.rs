//! Shared primitive types used across the entire simulation.

/// A simulation tick. One tick = `1 / ticks_per_minute` in-game minutes.
pub type Tick = u64;

/// Stable identifier of a hosted city instance.
pub type CityId = String;

/// Row identifier for any persisted entity (building, agent, case, ...).
pub type EntityId = i64;

/// A grid tile coordinate `(x, y)`.
pub type Tile = (i32, i32);
