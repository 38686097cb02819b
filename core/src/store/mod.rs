//! SQLite persistence layer, the repository boundary.
//!
//! RULE: Only store/ talks to the database.
//! Subsystems call store methods; they never execute SQL directly.
//! Every query is scoped by city id.

use crate::{error::SimResult, event::EventLogEntry, types::Tick};
use rusqlite::{params, Connection, OptionalExtension};

mod agent;
mod city;
mod land;
mod legal;
mod network;
mod resident;

pub use land::ServiceFlag;

pub struct CityStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl CityStore {
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_land.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_agents.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_legal.sql"))?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (city_id, tick, subsystem, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.city_id,
                entry.tick as i64,
                entry.subsystem,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_tick(&self, city_id: &str, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, city_id, tick, subsystem, event_type, payload
             FROM event_log WHERE city_id = ?1 AND tick = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![city_id, tick as i64], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    city_id: row.get(1)?,
                    tick: row.get::<_, i64>(2)? as u64,
                    subsystem: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// All persisted event payloads for a city, in emission order.
    pub fn event_payloads(&self, city_id: &str) -> SimResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM event_log WHERE city_id = ?1 ORDER BY id ASC",
        )?;
        let payloads = stmt
            .query_map(params![city_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(payloads)
    }

    pub fn event_count(&self, city_id: &str, event_type: &str) -> SimResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE city_id = ?1 AND event_type = ?2",
            params![city_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Daily job markers ──────────────────────────────────────

    /// Last day index a daily job completed for this city.
    pub fn job_last_day(&self, city_id: &str, job: &str) -> SimResult<Option<u64>> {
        let day = self
            .conn
            .query_row(
                "SELECT last_day FROM job_marker WHERE city_id = ?1 AND job = ?2",
                params![city_id, job],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(day.map(|d| d as u64))
    }

    pub fn set_job_last_day(&self, city_id: &str, job: &str, day: u64) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO job_marker (city_id, job, last_day) VALUES (?1, ?2, ?3)
             ON CONFLICT (city_id, job) DO UPDATE SET last_day = excluded.last_day",
            params![city_id, job, day as i64],
        )?;
        Ok(())
    }

    /// Claim `day` for a daily job. Returns false if the job already ran that day.
    pub fn claim_job_day(&self, city_id: &str, job: &str, day: u64) -> SimResult<bool> {
        if self.job_last_day(city_id, job)? == Some(day) {
            return Ok(false);
        }
        self.set_job_last_day(city_id, job, day)?;
        Ok(true)
    }
}
