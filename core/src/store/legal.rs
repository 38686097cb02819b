use super::CityStore;
use crate::{
    error::SimResult,
    model::{
        CaseStatus, CourtCaseRecord, InmateStatus, JailInmateRecord, RentWarningRecord,
        RentalUnitRecord, UnitStatus, Verdict, WarningStatus,
    },
    types::{EntityId, Tick},
};
use rusqlite::{params, OptionalExtension, Row};

fn unit_from_row(row: &Row<'_>) -> rusqlite::Result<RentalUnitRecord> {
    let status: String = row.get(8)?;
    Ok(RentalUnitRecord {
        unit_id: row.get(0)?,
        building_id: row.get(1)?,
        floor: row.get::<_, i64>(2)? as u32,
        unit_number: row.get::<_, i64>(3)? as u32,
        unit_type: row.get(4)?,
        rent: row.get(5)?,
        tenant_id: row.get(6)?,
        lease_start: row.get::<_, Option<i64>>(7)?.map(|t| t as Tick),
        status: UnitStatus::parse(&status),
    })
}

fn warning_from_row(row: &Row<'_>) -> rusqlite::Result<RentWarningRecord> {
    let status: String = row.get(6)?;
    Ok(RentWarningRecord {
        warning_id: row.get(0)?,
        unit_id: row.get(1)?,
        tenant_id: row.get(2)?,
        amount_owed: row.get(3)?,
        issued_tick: row.get::<_, i64>(4)? as Tick,
        due_tick: row.get::<_, i64>(5)? as Tick,
        status: WarningStatus::parse(&status),
    })
}

fn case_from_row(row: &Row<'_>) -> rusqlite::Result<CourtCaseRecord> {
    let verdict: Option<String> = row.get(6)?;
    let status: String = row.get(8)?;
    Ok(CourtCaseRecord {
        case_id: row.get(0)?,
        warning_id: row.get(1)?,
        defendant_id: row.get(2)?,
        plaintiff_id: row.get(3)?,
        amount: row.get(4)?,
        hearing_tick: row.get::<_, i64>(5)? as Tick,
        verdict: verdict.as_deref().and_then(Verdict::parse),
        sentence: row.get(7)?,
        status: CaseStatus::parse(&status),
    })
}

fn inmate_from_row(row: &Row<'_>) -> rusqlite::Result<JailInmateRecord> {
    let status: String = row.get(5)?;
    Ok(JailInmateRecord {
        inmate_id: row.get(0)?,
        agent_id: row.get(1)?,
        case_id: row.get(2)?,
        check_in_tick: row.get::<_, i64>(3)? as Tick,
        release_tick: row.get::<_, i64>(4)? as Tick,
        status: InmateStatus::parse(&status),
    })
}

const UNIT_COLUMNS: &str =
    "unit_id, building_id, floor, unit_number, unit_type, rent, tenant_id, lease_start, status";
const WARNING_COLUMNS: &str =
    "warning_id, unit_id, tenant_id, amount_owed, issued_tick, due_tick, status";
const CASE_COLUMNS: &str =
    "case_id, warning_id, defendant_id, plaintiff_id, amount, hearing_tick, verdict, sentence, status";
const INMATE_COLUMNS: &str =
    "inmate_id, agent_id, case_id, check_in_tick, release_tick, status";

impl CityStore {
    // ── Rental units ───────────────────────────────────────────────

    pub fn insert_rental_unit(
        &self,
        city_id: &str,
        building_id: EntityId,
        floor: u32,
        unit_number: u32,
        unit_type: &str,
        rent: f64,
    ) -> SimResult<EntityId> {
        self.conn.execute(
            "INSERT INTO rental_unit (city_id, building_id, floor, unit_number, unit_type, rent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![city_id, building_id, floor as i64, unit_number as i64, unit_type, rent],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn rental_unit(&self, city_id: &str, unit_id: EntityId) -> SimResult<Option<RentalUnitRecord>> {
        let unit = self
            .conn
            .query_row(
                &format!("SELECT {UNIT_COLUMNS} FROM rental_unit WHERE city_id = ?1 AND unit_id = ?2"),
                params![city_id, unit_id],
                unit_from_row,
            )
            .optional()?;
        Ok(unit)
    }

    pub fn units_for_building(&self, city_id: &str, building_id: EntityId) -> SimResult<Vec<RentalUnitRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {UNIT_COLUMNS} FROM rental_unit
             WHERE city_id = ?1 AND building_id = ?2 ORDER BY unit_id"
        ))?;
        let rows = stmt.query_map(params![city_id, building_id], unit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn occupied_units(&self, city_id: &str) -> SimResult<Vec<RentalUnitRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {UNIT_COLUMNS} FROM rental_unit
             WHERE city_id = ?1 AND status = 'occupied' ORDER BY unit_id"
        ))?;
        let rows = stmt.query_map(params![city_id], unit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Occupy a vacant unit. Returns false if the unit was not vacant.
    pub fn lease_unit(&self, city_id: &str, unit_id: EntityId, tenant_id: EntityId, tick: Tick) -> SimResult<bool> {
        let n = self.conn.execute(
            "UPDATE rental_unit SET tenant_id = ?1, lease_start = ?2, status = 'occupied'
             WHERE city_id = ?3 AND unit_id = ?4 AND status = 'vacant'",
            params![tenant_id, tick as i64, city_id, unit_id],
        )?;
        Ok(n > 0)
    }

    pub fn vacate_unit(&self, city_id: &str, unit_id: EntityId) -> SimResult<()> {
        self.conn.execute(
            "UPDATE rental_unit SET tenant_id = NULL, lease_start = NULL, status = 'vacant'
             WHERE city_id = ?1 AND unit_id = ?2",
            params![city_id, unit_id],
        )?;
        Ok(())
    }

    // ── Rent warnings ──────────────────────────────────────────────

    pub fn insert_warning(
        &self,
        city_id: &str,
        unit_id: EntityId,
        tenant_id: EntityId,
        amount_owed: f64,
        issued_tick: Tick,
        due_tick: Tick,
    ) -> SimResult<EntityId> {
        self.conn.execute(
            "INSERT INTO rent_warning (city_id, unit_id, tenant_id, amount_owed, issued_tick, due_tick)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![city_id, unit_id, tenant_id, amount_owed, issued_tick as i64, due_tick as i64],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn pending_warning_for_unit(&self, city_id: &str, unit_id: EntityId) -> SimResult<Option<RentWarningRecord>> {
        let warning = self
            .conn
            .query_row(
                &format!(
                    "SELECT {WARNING_COLUMNS} FROM rent_warning
                     WHERE city_id = ?1 AND unit_id = ?2 AND status = 'pending'"
                ),
                params![city_id, unit_id],
                warning_from_row,
            )
            .optional()?;
        Ok(warning)
    }

    /// Warnings issued to `tenant_id` for `unit_id` since the lease began.
    pub fn lease_warning_count(
        &self,
        city_id: &str,
        unit_id: EntityId,
        tenant_id: EntityId,
        lease_start: Tick,
    ) -> SimResult<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM rent_warning
             WHERE city_id = ?1 AND unit_id = ?2 AND tenant_id = ?3 AND issued_tick >= ?4",
            params![city_id, unit_id, tenant_id, lease_start as i64],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    pub fn pending_warnings(&self, city_id: &str) -> SimResult<Vec<RentWarningRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WARNING_COLUMNS} FROM rent_warning
             WHERE city_id = ?1 AND status = 'pending' ORDER BY warning_id"
        ))?;
        let rows = stmt.query_map(params![city_id], warning_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn warning(&self, city_id: &str, warning_id: EntityId) -> SimResult<Option<RentWarningRecord>> {
        let warning = self
            .conn
            .query_row(
                &format!("SELECT {WARNING_COLUMNS} FROM rent_warning WHERE city_id = ?1 AND warning_id = ?2"),
                params![city_id, warning_id],
                warning_from_row,
            )
            .optional()?;
        Ok(warning)
    }

    pub fn warnings(&self, city_id: &str) -> SimResult<Vec<RentWarningRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WARNING_COLUMNS} FROM rent_warning WHERE city_id = ?1 ORDER BY warning_id"
        ))?;
        let rows = stmt.query_map(params![city_id], warning_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn set_warning_status(&self, city_id: &str, warning_id: EntityId, status: WarningStatus) -> SimResult<()> {
        self.conn.execute(
            "UPDATE rent_warning SET status = ?1 WHERE city_id = ?2 AND warning_id = ?3",
            params![status.as_str(), city_id, warning_id],
        )?;
        Ok(())
    }

    // ── Court cases ────────────────────────────────────────────────

    pub fn insert_court_case(
        &self,
        city_id: &str,
        warning_id: EntityId,
        defendant_id: EntityId,
        plaintiff_id: Option<EntityId>,
        amount: f64,
        hearing_tick: Tick,
    ) -> SimResult<EntityId> {
        self.conn.execute(
            "INSERT INTO court_case (city_id, warning_id, defendant_id, plaintiff_id, amount, hearing_tick)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![city_id, warning_id, defendant_id, plaintiff_id, amount, hearing_tick as i64],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Cases not yet closed whose hearing is at or before `tick`.
    pub fn cases_due(&self, city_id: &str, tick: Tick) -> SimResult<Vec<CourtCaseRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CASE_COLUMNS} FROM court_case
             WHERE city_id = ?1 AND status != 'closed' AND hearing_tick <= ?2 ORDER BY case_id"
        ))?;
        let rows = stmt.query_map(params![city_id, tick as i64], case_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn court_cases(&self, city_id: &str) -> SimResult<Vec<CourtCaseRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CASE_COLUMNS} FROM court_case WHERE city_id = ?1 ORDER BY case_id"
        ))?;
        let rows = stmt.query_map(params![city_id], case_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn close_case(
        &self,
        city_id: &str,
        case_id: EntityId,
        verdict: Verdict,
        sentence: Option<&str>,
    ) -> SimResult<()> {
        self.conn.execute(
            "UPDATE court_case SET verdict = ?1, sentence = ?2, status = ?3
             WHERE city_id = ?4 AND case_id = ?5",
            params![verdict.as_str(), sentence, CaseStatus::Closed.as_str(), city_id, case_id],
        )?;
        Ok(())
    }

    // ── Jail ───────────────────────────────────────────────────────

    pub fn insert_inmate(
        &self,
        city_id: &str,
        agent_id: EntityId,
        case_id: EntityId,
        check_in_tick: Tick,
        release_tick: Tick,
    ) -> SimResult<EntityId> {
        self.conn.execute(
            "INSERT INTO jail_inmate (city_id, agent_id, case_id, check_in_tick, release_tick)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![city_id, agent_id, case_id, check_in_tick as i64, release_tick as i64],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn incarcerated(&self, city_id: &str, agent_id: EntityId) -> SimResult<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM jail_inmate
             WHERE city_id = ?1 AND agent_id = ?2 AND status = 'incarcerated'",
            params![city_id, agent_id],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    /// Incarcerated inmates whose release tick has arrived.
    pub fn inmates_due_release(&self, city_id: &str, tick: Tick) -> SimResult<Vec<JailInmateRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {INMATE_COLUMNS} FROM jail_inmate
             WHERE city_id = ?1 AND status = 'incarcerated' AND release_tick <= ?2 ORDER BY inmate_id"
        ))?;
        let rows = stmt.query_map(params![city_id, tick as i64], inmate_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn inmates(&self, city_id: &str) -> SimResult<Vec<JailInmateRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {INMATE_COLUMNS} FROM jail_inmate WHERE city_id = ?1 ORDER BY inmate_id"
        ))?;
        let rows = stmt.query_map(params![city_id], inmate_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn release_inmate(&self, city_id: &str, inmate_id: EntityId) -> SimResult<()> {
        self.conn.execute(
            "UPDATE jail_inmate SET status = ?1 WHERE city_id = ?2 AND inmate_id = ?3",
            params![InmateStatus::Released.as_str(), city_id, inmate_id],
        )?;
        Ok(())
    }
}
