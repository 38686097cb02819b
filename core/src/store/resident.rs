use super::CityStore;
use crate::{error::SimResult, model::ResidentRecord, types::EntityId};
use rusqlite::{params, Row};
use std::collections::HashMap;

fn resident_from_row(row: &Row<'_>) -> rusqlite::Result<ResidentRecord> {
    Ok(ResidentRecord {
        resident_id: row.get(0)?,
        home_building_id: row.get(1)?,
        work_building_id: row.get(2)?,
        salary: row.get(3)?,
    })
}

impl CityStore {
    pub fn insert_resident(&self, city_id: &str, home_building_id: EntityId) -> SimResult<EntityId> {
        self.conn.execute(
            "INSERT INTO resident (city_id, home_building_id) VALUES (?1, ?2)",
            params![city_id, home_building_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn residents(&self, city_id: &str) -> SimResult<Vec<ResidentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT resident_id, home_building_id, work_building_id, salary
             FROM resident WHERE city_id = ?1 ORDER BY resident_id",
        )?;
        let rows = stmt.query_map(params![city_id], resident_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn resident_count(&self, city_id: &str) -> SimResult<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM resident WHERE city_id = ?1",
            params![city_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Resident counts keyed by home building.
    pub fn residents_by_home(&self, city_id: &str) -> SimResult<HashMap<EntityId, usize>> {
        let mut stmt = self.conn.prepare(
            "SELECT home_building_id, COUNT(*) FROM resident
             WHERE city_id = ?1 AND home_building_id IS NOT NULL GROUP BY home_building_id",
        )?;
        let rows = stmt.query_map(params![city_id], |row| {
            Ok((row.get::<_, EntityId>(0)?, row.get::<_, i64>(1)? as usize))
        })?;
        rows.collect::<Result<HashMap<_, _>, _>>().map_err(Into::into)
    }

    /// Remove everyone living in `building_id`. Returns how many were removed.
    pub fn delete_residents_homed_at(&self, city_id: &str, building_id: EntityId) -> SimResult<usize> {
        let n = self.conn.execute(
            "DELETE FROM resident WHERE city_id = ?1 AND home_building_id = ?2",
            params![city_id, building_id],
        )?;
        Ok(n)
    }

    /// Unassign everyone working at `building_id`. Returns how many lost their job.
    pub fn clear_work_at(&self, city_id: &str, building_id: EntityId) -> SimResult<usize> {
        let n = self.conn.execute(
            "UPDATE resident SET work_building_id = NULL, salary = 0
             WHERE city_id = ?1 AND work_building_id = ?2",
            params![city_id, building_id],
        )?;
        Ok(n)
    }

    pub fn unemployed_residents(&self, city_id: &str) -> SimResult<Vec<ResidentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT resident_id, home_building_id, work_building_id, salary
             FROM resident WHERE city_id = ?1 AND work_building_id IS NULL ORDER BY resident_id",
        )?;
        let rows = stmt.query_map(params![city_id], resident_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn employed_residents(&self, city_id: &str) -> SimResult<Vec<ResidentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT resident_id, home_building_id, work_building_id, salary
             FROM resident WHERE city_id = ?1 AND work_building_id IS NOT NULL ORDER BY resident_id",
        )?;
        let rows = stmt.query_map(params![city_id], resident_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn employ_resident(
        &self,
        city_id: &str,
        resident_id: EntityId,
        work_building_id: EntityId,
        salary: f64,
    ) -> SimResult<()> {
        self.conn.execute(
            "UPDATE resident SET work_building_id = ?1, salary = ?2
             WHERE city_id = ?3 AND resident_id = ?4",
            params![work_building_id, salary, city_id, resident_id],
        )?;
        Ok(())
    }

    /// Filled job slots keyed by workplace.
    pub fn employment_counts(&self, city_id: &str) -> SimResult<HashMap<EntityId, usize>> {
        let mut stmt = self.conn.prepare(
            "SELECT work_building_id, COUNT(*) FROM resident
             WHERE city_id = ?1 AND work_building_id IS NOT NULL GROUP BY work_building_id",
        )?;
        let rows = stmt.query_map(params![city_id], |row| {
            Ok((row.get::<_, EntityId>(0)?, row.get::<_, i64>(1)? as usize))
        })?;
        rows.collect::<Result<HashMap<_, _>, _>>().map_err(Into::into)
    }
}
