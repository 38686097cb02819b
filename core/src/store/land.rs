use super::CityStore;
use crate::{
    error::SimResult,
    model::{BuildingRecord, ParcelRecord, ZoneClass},
    types::{EntityId, Tile},
};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashMap;

/// Which service flag a utility simulator owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceFlag {
    Power,
    Water,
    Waste,
}

impl ServiceFlag {
    fn column(&self) -> &'static str {
        match self {
            Self::Power => "powered",
            Self::Water => "has_water",
            Self::Waste => "has_waste",
        }
    }
}

const BUILDING_SELECT: &str =
    "SELECT b.building_id, b.parcel_id, b.building_type, p.x, p.y, b.width, b.height, b.floors,
            p.owner_id, b.powered, b.has_water, b.has_waste, b.progress, b.garbage_level,
            b.crime_level, b.fire_level, b.fee_arrears
     FROM building b JOIN parcel p ON p.parcel_id = b.parcel_id";

fn building_from_row(row: &Row<'_>) -> rusqlite::Result<BuildingRecord> {
    Ok(BuildingRecord {
        building_id: row.get(0)?,
        parcel_id: row.get(1)?,
        building_type: row.get(2)?,
        x: row.get(3)?,
        y: row.get(4)?,
        width: row.get::<_, i64>(5)? as u32,
        height: row.get::<_, i64>(6)? as u32,
        floors: row.get::<_, i64>(7)? as u32,
        owner_id: row.get(8)?,
        powered: row.get(9)?,
        has_water: row.get(10)?,
        has_waste: row.get(11)?,
        progress: row.get(12)?,
        garbage_level: row.get(13)?,
        crime_level: row.get(14)?,
        fire_level: row.get(15)?,
        fee_arrears: row.get(16)?,
    })
}

fn parcel_from_row(row: &Row<'_>) -> rusqlite::Result<ParcelRecord> {
    let zoning: Option<String> = row.get(4)?;
    Ok(ParcelRecord {
        parcel_id: row.get(0)?,
        x: row.get(1)?,
        y: row.get(2)?,
        terrain: row.get(3)?,
        zoning: zoning.as_deref().and_then(ZoneClass::parse),
        owner_id: row.get(5)?,
        land_value: row.get(6)?,
    })
}

impl CityStore {
    // ── Parcel ─────────────────────────────────────────────────────

    pub fn insert_parcel(
        &self,
        city_id: &str,
        (x, y): Tile,
        terrain: &str,
        zoning: Option<ZoneClass>,
        owner_id: Option<EntityId>,
    ) -> SimResult<EntityId> {
        self.conn.execute(
            "INSERT INTO parcel (city_id, x, y, terrain, zoning, owner_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![city_id, x, y, terrain, zoning.map(|z| z.as_str()), owner_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn parcels(&self, city_id: &str) -> SimResult<Vec<ParcelRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT parcel_id, x, y, terrain, zoning, owner_id, land_value
             FROM parcel WHERE city_id = ?1 ORDER BY parcel_id",
        )?;
        let rows = stmt.query_map(params![city_id], parcel_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn parcel_at(&self, city_id: &str, (x, y): Tile) -> SimResult<Option<ParcelRecord>> {
        let parcel = self
            .conn
            .query_row(
                "SELECT parcel_id, x, y, terrain, zoning, owner_id, land_value
                 FROM parcel WHERE city_id = ?1 AND x = ?2 AND y = ?3",
                params![city_id, x, y],
                parcel_from_row,
            )
            .optional()?;
        Ok(parcel)
    }

    pub fn set_land_value(&self, city_id: &str, parcel_id: EntityId, value: f64) -> SimResult<()> {
        self.conn.execute(
            "UPDATE parcel SET land_value = ?1 WHERE city_id = ?2 AND parcel_id = ?3",
            params![value, city_id, parcel_id],
        )?;
        Ok(())
    }

    pub fn set_parcel_owner(
        &self,
        city_id: &str,
        parcel_id: EntityId,
        owner_id: Option<EntityId>,
    ) -> SimResult<()> {
        self.conn.execute(
            "UPDATE parcel SET owner_id = ?1 WHERE city_id = ?2 AND parcel_id = ?3",
            params![owner_id, city_id, parcel_id],
        )?;
        Ok(())
    }

    // ── Building ───────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub fn insert_building(
        &self,
        city_id: &str,
        parcel_id: EntityId,
        building_type: &str,
        width: u32,
        height: u32,
        floors: u32,
        progress: f64,
    ) -> SimResult<EntityId> {
        self.conn.execute(
            "INSERT INTO building (city_id, parcel_id, building_type, width, height, floors, progress)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                city_id,
                parcel_id,
                building_type,
                width.max(1) as i64,
                height.max(1) as i64,
                floors.max(1) as i64,
                progress.clamp(0.0, 100.0),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn buildings(&self, city_id: &str) -> SimResult<Vec<BuildingRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BUILDING_SELECT} WHERE b.city_id = ?1 ORDER BY b.building_id"
        ))?;
        let rows = stmt.query_map(params![city_id], building_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn building(&self, city_id: &str, building_id: EntityId) -> SimResult<Option<BuildingRecord>> {
        let building = self
            .conn
            .query_row(
                &format!("{BUILDING_SELECT} WHERE b.city_id = ?1 AND b.building_id = ?2"),
                params![city_id, building_id],
                building_from_row,
            )
            .optional()?;
        Ok(building)
    }

    /// Remove a building. Its rental units cascade with it.
    pub fn delete_building(&self, city_id: &str, building_id: EntityId) -> SimResult<bool> {
        let n = self.conn.execute(
            "DELETE FROM building WHERE city_id = ?1 AND building_id = ?2",
            params![city_id, building_id],
        )?;
        Ok(n > 0)
    }

    /// Advance construction. Progress never decreases.
    pub fn set_building_progress(&self, city_id: &str, building_id: EntityId, progress: f64) -> SimResult<()> {
        self.conn.execute(
            "UPDATE building SET progress = MAX(progress, ?1) WHERE city_id = ?2 AND building_id = ?3",
            params![progress.clamp(0.0, 100.0), city_id, building_id],
        )?;
        Ok(())
    }

    pub fn set_service_flag(
        &self,
        city_id: &str,
        building_id: EntityId,
        flag: ServiceFlag,
        value: bool,
    ) -> SimResult<()> {
        self.conn.execute(
            &format!(
                "UPDATE building SET {} = ?1 WHERE city_id = ?2 AND building_id = ?3",
                flag.column()
            ),
            params![value, city_id, building_id],
        )?;
        Ok(())
    }

    pub fn set_garbage_level(&self, city_id: &str, building_id: EntityId, level: f64) -> SimResult<()> {
        self.conn.execute(
            "UPDATE building SET garbage_level = ?1 WHERE city_id = ?2 AND building_id = ?3",
            params![level, city_id, building_id],
        )?;
        Ok(())
    }

    pub fn set_floors(&self, city_id: &str, building_id: EntityId, floors: u32) -> SimResult<()> {
        self.conn.execute(
            "UPDATE building SET floors = ?1 WHERE city_id = ?2 AND building_id = ?3",
            params![floors.max(1) as i64, city_id, building_id],
        )?;
        Ok(())
    }

    pub fn set_crime_level(&self, city_id: &str, building_id: EntityId, level: f64) -> SimResult<()> {
        self.conn.execute(
            "UPDATE building SET crime_level = ?1 WHERE city_id = ?2 AND building_id = ?3",
            params![level, city_id, building_id],
        )?;
        Ok(())
    }

    pub fn set_fire_level(&self, city_id: &str, building_id: EntityId, level: f64) -> SimResult<()> {
        self.conn.execute(
            "UPDATE building SET fire_level = ?1 WHERE city_id = ?2 AND building_id = ?3",
            params![level, city_id, building_id],
        )?;
        Ok(())
    }

    pub fn set_fee_arrears(&self, city_id: &str, building_id: EntityId, arrears: f64) -> SimResult<()> {
        self.conn.execute(
            "UPDATE building SET fee_arrears = ?1 WHERE city_id = ?2 AND building_id = ?3",
            params![arrears.max(0.0), city_id, building_id],
        )?;
        Ok(())
    }

    /// Completed building count per type.
    pub fn completed_building_counts(&self, city_id: &str) -> SimResult<HashMap<String, usize>> {
        let mut stmt = self.conn.prepare(
            "SELECT building_type, COUNT(*) FROM building
             WHERE city_id = ?1 AND progress >= 100 GROUP BY building_type",
        )?;
        let rows = stmt.query_map(params![city_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;
        rows.collect::<Result<HashMap<_, _>, _>>().map_err(Into::into)
    }
}
