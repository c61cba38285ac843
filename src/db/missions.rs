//! Queries for the `missions` table and the `mission_contacts` join table.
//!
//! The CC list is stored as a JSON array in a text column; linked contact
//! codes live in the join table and are loaded with every mission row.

use rusqlite::{params, Row};

use super::{CrmDb, DbError, DbMission};
use crate::types::MissionStatus;

const MISSION_COLUMNS: &str = "code, title, description, amount, probability, deadline,
     status, assignee, cc, created_at, updated_at";

fn map_mission(row: &Row<'_>) -> rusqlite::Result<DbMission> {
    let cc_json: String = row.get(8)?;
    let cc = serde_json::from_str(&cc_json).unwrap_or_default();
    Ok(DbMission {
        code: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        probability: row.get(4)?,
        deadline: row.get(5)?,
        status: row.get(6)?,
        assignee: row.get(7)?,
        cc,
        contacts: Vec::new(),
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl CrmDb {
    /// Insert or replace a mission row and synchronize its contact links.
    pub fn upsert_mission(&self, mission: &DbMission) -> Result<(), DbError> {
        let cc_json = serde_json::to_string(&mission.cc)?;
        self.conn.execute(
            "INSERT INTO missions (code, title, description, amount, probability,
                deadline, status, assignee, cc, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(code) DO UPDATE SET
                title = ?2, description = ?3, amount = ?4, probability = ?5,
                deadline = ?6, status = ?7, assignee = ?8, cc = ?9, updated_at = ?11",
            params![
                mission.code,
                mission.title,
                mission.description,
                mission.amount,
                mission.probability,
                mission.deadline,
                mission.status,
                mission.assignee,
                cc_json,
                mission.created_at,
                mission.updated_at,
            ],
        )?;
        self.set_mission_contacts(&mission.code, &mission.contacts)?;
        Ok(())
    }

    /// Replace the contact links of a mission.
    pub fn set_mission_contacts(
        &self,
        mission_code: &str,
        contacts: &[String],
    ) -> Result<(), DbError> {
        self.conn.execute(
            "DELETE FROM mission_contacts WHERE mission_code = ?1",
            params![mission_code],
        )?;
        let mut stmt = self.conn.prepare(
            "INSERT OR IGNORE INTO mission_contacts (mission_code, contact_code)
             VALUES (?1, ?2)",
        )?;
        for contact in contacts {
            stmt.execute(params![mission_code, contact])?;
        }
        Ok(())
    }

    fn load_contacts(&self, mission_code: &str) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT contact_code FROM mission_contacts
             WHERE mission_code = ?1 ORDER BY contact_code",
        )?;
        let rows = stmt.query_map(params![mission_code], |row| row.get(0))?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row?);
        }
        Ok(contacts)
    }

    /// Look up a single mission by code, contact links included.
    pub fn get_mission(&self, code: &str) -> Result<Option<DbMission>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MISSION_COLUMNS} FROM missions WHERE code = ?1"
        ))?;
        let mut rows = stmt.query_map(params![code], map_mission)?;
        let mission = match rows.next() {
            Some(row) => row?,
            None => return Ok(None),
        };
        drop(rows);
        let contacts = self.load_contacts(code)?;
        Ok(Some(DbMission { contacts, ..mission }))
    }

    /// List missions ordered by code, optionally filtered by status.
    pub fn list_missions(
        &self,
        status: Option<MissionStatus>,
    ) -> Result<Vec<DbMission>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MISSION_COLUMNS} FROM missions
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY code"
        ))?;
        let rows = stmt.query_map(params![status], map_mission)?;

        let mut missions = Vec::new();
        for row in rows {
            missions.push(row?);
        }
        for mission in &mut missions {
            mission.contacts = self.load_contacts(&mission.code)?;
        }
        Ok(missions)
    }

    /// Missions linked to a contact, ordered by code. The rollup scans
    /// this set from scratch; there is no cached aggregate to maintain.
    pub fn missions_for_contact(&self, contact_code: &str) -> Result<Vec<DbMission>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MISSION_COLUMNS} FROM missions
             WHERE code IN (SELECT mission_code FROM mission_contacts
                            WHERE contact_code = ?1)
             ORDER BY code"
        ))?;
        let rows = stmt.query_map(params![contact_code], map_mission)?;

        let mut missions = Vec::new();
        for row in rows {
            missions.push(row?);
        }
        for mission in &mut missions {
            mission.contacts = self.load_contacts(&mission.code)?;
        }
        Ok(missions)
    }

    /// All mission codes, for code allocation.
    pub fn mission_codes(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare("SELECT code FROM missions")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut codes = Vec::new();
        for row in rows {
            codes.push(row?);
        }
        Ok(codes)
    }
}
