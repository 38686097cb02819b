use super::CityStore;
use crate::{
    error::SimResult,
    model::{NetworkEdge, NetworkKind, RoadRecord},
    types::{EntityId, Tile},
};
use rusqlite::params;

impl CityStore {
    // ── Road ───────────────────────────────────────────────────────

    pub fn insert_road(
        &self,
        city_id: &str,
        parcel_id: EntityId,
        direction: &str,
        lanes: u32,
        speed_limit: f64,
    ) -> SimResult<EntityId> {
        self.conn.execute(
            "INSERT INTO road (city_id, parcel_id, direction, lanes, speed_limit)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![city_id, parcel_id, direction, lanes.max(1) as i64, speed_limit],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn roads(&self, city_id: &str) -> SimResult<Vec<RoadRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.road_id, r.parcel_id, p.x, p.y, r.direction, r.lanes, r.speed_limit, r.traffic_load
             FROM road r JOIN parcel p ON p.parcel_id = r.parcel_id
             WHERE r.city_id = ?1 ORDER BY r.road_id",
        )?;
        let rows = stmt.query_map(params![city_id], |row| {
            Ok(RoadRecord {
                road_id: row.get(0)?,
                parcel_id: row.get(1)?,
                x: row.get(2)?,
                y: row.get(3)?,
                direction: row.get(4)?,
                lanes: row.get::<_, i64>(5)? as u32,
                speed_limit: row.get(6)?,
                traffic_load: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete_road(&self, city_id: &str, road_id: EntityId) -> SimResult<bool> {
        let n = self.conn.execute(
            "DELETE FROM road WHERE city_id = ?1 AND road_id = ?2",
            params![city_id, road_id],
        )?;
        Ok(n > 0)
    }

    pub fn set_traffic_load(&self, city_id: &str, road_id: EntityId, load: f64) -> SimResult<()> {
        self.conn.execute(
            "UPDATE road SET traffic_load = ?1 WHERE city_id = ?2 AND road_id = ?3",
            params![load.clamp(0.0, 1.0), city_id, road_id],
        )?;
        Ok(())
    }

    // ── Power lines / water pipes ──────────────────────────────────

    pub fn insert_edge(
        &self,
        kind: NetworkKind,
        city_id: &str,
        from: Tile,
        to: Tile,
        capacity: f64,
    ) -> SimResult<EntityId> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} (city_id, from_x, from_y, to_x, to_y, capacity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                kind.table()
            ),
            params![city_id, from.0, from.1, to.0, to.1, capacity],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn edges(&self, kind: NetworkKind, city_id: &str) -> SimResult<Vec<NetworkEdge>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT edge_id, from_x, from_y, to_x, to_y, capacity, load
             FROM {} WHERE city_id = ?1 ORDER BY edge_id",
            kind.table()
        ))?;
        let rows = stmt.query_map(params![city_id], |row| {
            Ok(NetworkEdge {
                edge_id: row.get(0)?,
                from: (row.get(1)?, row.get(2)?),
                to: (row.get(3)?, row.get(4)?),
                capacity: row.get(5)?,
                load: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete_edge(&self, kind: NetworkKind, city_id: &str, edge_id: EntityId) -> SimResult<bool> {
        let n = self.conn.execute(
            &format!("DELETE FROM {} WHERE city_id = ?1 AND edge_id = ?2", kind.table()),
            params![city_id, edge_id],
        )?;
        Ok(n > 0)
    }

    pub fn set_edge_load(
        &self,
        kind: NetworkKind,
        city_id: &str,
        edge_id: EntityId,
        load: f64,
    ) -> SimResult<()> {
        self.conn.execute(
            &format!("UPDATE {} SET load = ?1 WHERE city_id = ?2 AND edge_id = ?3", kind.table()),
            params![load, city_id, edge_id],
        )?;
        Ok(())
    }

    /// (roads, power lines, water pipes) counts for maintenance.
    pub fn network_counts(&self, city_id: &str) -> SimResult<(usize, usize, usize)> {
        let count = |table: &str| -> SimResult<usize> {
            let n: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE city_id = ?1"),
                params![city_id],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        };
        Ok((count("road")?, count("power_line")?, count("water_pipe")?))
    }
}
