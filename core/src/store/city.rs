//! City records: dimensions, time, treasury and the economy block.

use super::CityStore;
use crate::{
    clock::CityTime,
    error::{SimError, SimResult},
    model::{CityRecord, Economy, ZoneDemand},
    types::{CityId, Tick},
};
use rusqlite::{params, OptionalExtension, Row};

const CITY_COLUMNS: &str = "city_id, name, width, height, tick, hour, day, year, is_daylight,
     treasury, economy_json, demand_r, demand_c, demand_i, crime_rate";

fn city_from_row(row: &Row<'_>) -> rusqlite::Result<CityRecord> {
    let economy_json: String = row.get(10)?;
    let economy: Economy = serde_json::from_str(&economy_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(CityRecord {
        city_id: row.get(0)?,
        name: row.get(1)?,
        width: row.get::<_, i64>(2)? as u32,
        height: row.get::<_, i64>(3)? as u32,
        tick: row.get::<_, i64>(4)? as u64,
        hour: row.get::<_, i64>(5)? as u32,
        day: row.get::<_, i64>(6)? as u32,
        year: row.get::<_, i64>(7)? as u32,
        is_daylight: row.get(8)?,
        treasury: row.get(9)?,
        economy,
        demand: ZoneDemand {
            residential: row.get(11)?,
            commercial: row.get(12)?,
            industrial: row.get(13)?,
        },
        crime_rate: row.get(14)?,
    })
}

impl CityStore {
    /// Create a city with a generated id.
    pub fn insert_city(
        &self,
        name: &str,
        width: u32,
        height: u32,
        treasury: f64,
        economy: &Economy,
    ) -> SimResult<CityId> {
        let city_id = format!("city-{}", uuid::Uuid::new_v4());
        self.insert_city_with_id(&city_id, name, width, height, treasury, economy)?;
        Ok(city_id)
    }

    pub fn insert_city_with_id(
        &self,
        city_id: &str,
        name: &str,
        width: u32,
        height: u32,
        treasury: f64,
        economy: &Economy,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO city (city_id, name, width, height, treasury, economy_json, year)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                city_id,
                name,
                width as i64,
                height as i64,
                treasury,
                serde_json::to_string(economy)?,
                economy.ytd_year as i64,
            ],
        )?;
        Ok(())
    }

    pub fn city_ids(&self) -> SimResult<Vec<CityId>> {
        let mut stmt = self.conn.prepare("SELECT city_id FROM city ORDER BY city_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// Highest persisted tick over all cities, used to resume the clock.
    pub fn max_city_tick(&self) -> SimResult<Tick> {
        let tick: i64 = self.conn.query_row("SELECT COALESCE(MAX(tick), 0) FROM city", [], |row| row.get(0))?;
        Ok(tick as Tick)
    }

    pub fn get_city(&self, city_id: &str) -> SimResult<Option<CityRecord>> {
        let city = self
            .conn
            .query_row(
                &format!("SELECT {CITY_COLUMNS} FROM city WHERE city_id = ?1"),
                params![city_id],
                city_from_row,
            )
            .optional()?;
        Ok(city)
    }

    pub fn require_city(&self, city_id: &str) -> SimResult<CityRecord> {
        self.get_city(city_id)?.ok_or_else(|| SimError::CityNotFound {
            city_id: city_id.to_string(),
        })
    }

    pub fn update_city_time(&self, city_id: &str, time: &CityTime) -> SimResult<()> {
        self.conn.execute(
            "UPDATE city SET tick = ?1, hour = ?2, day = ?3, year = ?4, is_daylight = ?5
             WHERE city_id = ?6",
            params![
                time.tick as i64,
                time.hour as i64,
                time.day as i64,
                time.year as i64,
                time.is_daylight,
                city_id,
            ],
        )?;
        Ok(())
    }

    pub fn treasury(&self, city_id: &str) -> SimResult<f64> {
        let treasury: f64 = self.conn.query_row(
            "SELECT treasury FROM city WHERE city_id = ?1",
            params![city_id],
            |row| row.get(0),
        )?;
        Ok(treasury)
    }

    /// Add `delta` to the treasury. The treasury is unbounded in both directions.
    pub fn adjust_treasury(&self, city_id: &str, delta: f64) -> SimResult<()> {
        self.conn.execute(
            "UPDATE city SET treasury = treasury + ?1 WHERE city_id = ?2",
            params![delta, city_id],
        )?;
        Ok(())
    }

    pub fn update_economy(&self, city_id: &str, economy: &Economy) -> SimResult<()> {
        self.conn.execute(
            "UPDATE city SET economy_json = ?1 WHERE city_id = ?2",
            params![serde_json::to_string(economy)?, city_id],
        )?;
        Ok(())
    }

    pub fn update_demand(&self, city_id: &str, demand: &ZoneDemand) -> SimResult<()> {
        self.conn.execute(
            "UPDATE city SET demand_r = ?1, demand_c = ?2, demand_i = ?3 WHERE city_id = ?4",
            params![demand.residential, demand.commercial, demand.industrial, city_id],
        )?;
        Ok(())
    }

    pub fn update_crime_rate(&self, city_id: &str, crime_rate: f64) -> SimResult<()> {
        self.conn.execute(
            "UPDATE city SET crime_rate = ?1 WHERE city_id = ?2",
            params![crime_rate, city_id],
        )?;
        Ok(())
    }
}
