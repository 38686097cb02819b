use super::CityStore;
use crate::{
    error::SimResult,
    model::{AgentRecord, AgentState, Schedule, VehicleRecord},
    types::EntityId,
};
use rusqlite::{params, OptionalExtension, Row};

const AGENT_COLUMNS: &str = "agent_id, name, home_building_id, work_building_id, x, y,
     dest_x, dest_y, dest_building_id, path_json, state, work_start, work_end, wallet";

fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<AgentRecord> {
    let dest_x: Option<f64> = row.get(6)?;
    let dest_y: Option<f64> = row.get(7)?;
    let path_json: String = row.get(9)?;
    let state: String = row.get(10)?;
    Ok(AgentRecord {
        agent_id: row.get(0)?,
        name: row.get(1)?,
        home_building_id: row.get(2)?,
        work_building_id: row.get(3)?,
        x: row.get(4)?,
        y: row.get(5)?,
        destination: dest_x.zip(dest_y),
        destination_building_id: row.get(8)?,
        path: serde_json::from_str(&path_json).unwrap_or_default(),
        state: AgentState::parse(&state),
        schedule: Schedule {
            work_start: row.get::<_, i64>(11)? as u32,
            work_end: row.get::<_, i64>(12)? as u32,
        },
        wallet: row.get(13)?,
    })
}

impl CityStore {
    // ── Agent ──────────────────────────────────────────────────────

    pub fn insert_agent(
        &self,
        city_id: &str,
        name: &str,
        home_building_id: Option<EntityId>,
        work_building_id: Option<EntityId>,
        position: (f64, f64),
        wallet: f64,
    ) -> SimResult<EntityId> {
        let schedule = Schedule::default();
        self.conn.execute(
            "INSERT INTO agent (city_id, name, home_building_id, work_building_id, x, y,
                                work_start, work_end, wallet)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                city_id,
                name,
                home_building_id,
                work_building_id,
                position.0,
                position.1,
                schedule.work_start as i64,
                schedule.work_end as i64,
                wallet,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn agents(&self, city_id: &str) -> SimResult<Vec<AgentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {AGENT_COLUMNS} FROM agent WHERE city_id = ?1 ORDER BY agent_id"
        ))?;
        let rows = stmt.query_map(params![city_id], agent_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn agent(&self, city_id: &str, agent_id: EntityId) -> SimResult<Option<AgentRecord>> {
        let agent = self
            .conn
            .query_row(
                &format!("SELECT {AGENT_COLUMNS} FROM agent WHERE city_id = ?1 AND agent_id = ?2"),
                params![city_id, agent_id],
                agent_from_row,
            )
            .optional()?;
        Ok(agent)
    }

    /// Persist position, destination, path and state after a movement step.
    pub fn update_agent_motion(&self, city_id: &str, agent: &AgentRecord) -> SimResult<()> {
        self.conn.execute(
            "UPDATE agent SET x = ?1, y = ?2, dest_x = ?3, dest_y = ?4, dest_building_id = ?5,
                              path_json = ?6, state = ?7
             WHERE city_id = ?8 AND agent_id = ?9",
            params![
                agent.x,
                agent.y,
                agent.destination.map(|d| d.0),
                agent.destination.map(|d| d.1),
                agent.destination_building_id,
                serde_json::to_string(&agent.path)?,
                agent.state.as_str(),
                city_id,
                agent.agent_id,
            ],
        )?;
        Ok(())
    }

    pub fn set_agent_state(&self, city_id: &str, agent_id: EntityId, state: AgentState) -> SimResult<()> {
        self.conn.execute(
            "UPDATE agent SET state = ?1 WHERE city_id = ?2 AND agent_id = ?3",
            params![state.as_str(), city_id, agent_id],
        )?;
        Ok(())
    }

    /// Drop any trip in progress (used when an agent is jailed).
    pub fn clear_agent_trip(&self, city_id: &str, agent_id: EntityId) -> SimResult<()> {
        self.conn.execute(
            "UPDATE agent SET dest_x = NULL, dest_y = NULL, dest_building_id = NULL, path_json = '[]'
             WHERE city_id = ?1 AND agent_id = ?2",
            params![city_id, agent_id],
        )?;
        Ok(())
    }

    pub fn set_agent_schedule(&self, city_id: &str, agent_id: EntityId, schedule: Schedule) -> SimResult<()> {
        self.conn.execute(
            "UPDATE agent SET work_start = ?1, work_end = ?2 WHERE city_id = ?3 AND agent_id = ?4",
            params![schedule.work_start as i64, schedule.work_end as i64, city_id, agent_id],
        )?;
        Ok(())
    }

    pub fn wallet(&self, city_id: &str, agent_id: EntityId) -> SimResult<Option<f64>> {
        let wallet = self
            .conn
            .query_row(
                "SELECT wallet FROM agent WHERE city_id = ?1 AND agent_id = ?2",
                params![city_id, agent_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(wallet)
    }

    pub fn adjust_wallet(&self, city_id: &str, agent_id: EntityId, delta: f64) -> SimResult<()> {
        self.conn.execute(
            "UPDATE agent SET wallet = wallet + ?1 WHERE city_id = ?2 AND agent_id = ?3",
            params![delta, city_id, agent_id],
        )?;
        Ok(())
    }

    /// Deduct `amount` only if the agent can cover it. Returns whether it was taken.
    pub fn try_debit_wallet(&self, city_id: &str, agent_id: EntityId, amount: f64) -> SimResult<bool> {
        let n = self.conn.execute(
            "UPDATE agent SET wallet = wallet - ?1
             WHERE city_id = ?2 AND agent_id = ?3 AND wallet >= ?1",
            params![amount, city_id, agent_id],
        )?;
        Ok(n > 0)
    }

    // ── Vehicle ────────────────────────────────────────────────────

    pub fn insert_vehicle(
        &self,
        city_id: &str,
        owner_id: Option<EntityId>,
        vehicle_type: &str,
        position: (f64, f64),
        speed: f64,
    ) -> SimResult<EntityId> {
        self.conn.execute(
            "INSERT INTO vehicle (city_id, owner_id, vehicle_type, x, y, speed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![city_id, owner_id, vehicle_type, position.0, position.1, speed],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn vehicles(&self, city_id: &str) -> SimResult<Vec<VehicleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT vehicle_id, owner_id, vehicle_type, x, y, dest_x, dest_y, path_json, speed
             FROM vehicle WHERE city_id = ?1 ORDER BY vehicle_id",
        )?;
        let rows = stmt.query_map(params![city_id], |row| {
            let dest_x: Option<f64> = row.get(5)?;
            let dest_y: Option<f64> = row.get(6)?;
            let path_json: String = row.get(7)?;
            Ok(VehicleRecord {
                vehicle_id: row.get(0)?,
                owner_id: row.get(1)?,
                vehicle_type: row.get(2)?,
                x: row.get(3)?,
                y: row.get(4)?,
                destination: dest_x.zip(dest_y),
                path: serde_json::from_str(&path_json).unwrap_or_default(),
                speed: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_vehicle_motion(&self, city_id: &str, vehicle: &VehicleRecord) -> SimResult<()> {
        self.conn.execute(
            "UPDATE vehicle SET x = ?1, y = ?2, dest_x = ?3, dest_y = ?4, path_json = ?5
             WHERE city_id = ?6 AND vehicle_id = ?7",
            params![
                vehicle.x,
                vehicle.y,
                vehicle.destination.map(|d| d.0),
                vehicle.destination.map(|d| d.1),
                serde_json::to_string(&vehicle.path)?,
                city_id,
                vehicle.vehicle_id,
            ],
        )?;
        Ok(())
    }

    /// Send every vehicle owned by `owner_id` toward `destination`, dropping
    /// any route in progress. Returns how many were dispatched.
    pub fn dispatch_owned_vehicles(&self, city_id: &str, owner_id: EntityId, destination: (f64, f64)) -> SimResult<usize> {
        let n = self.conn.execute(
            "UPDATE vehicle SET dest_x = ?1, dest_y = ?2, path_json = '[]'
             WHERE city_id = ?3 AND owner_id = ?4",
            params![destination.0, destination.1, city_id, owner_id],
        )?;
        Ok(n)
    }
}
