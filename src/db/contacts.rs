//! Queries for the `contacts` table.

use rusqlite::{params, Row};

use super::{CrmDb, DbContact, DbError};
use crate::types::ContactStatus;

const CONTACT_COLUMNS: &str = "code, company, lastname, firstname, phone, mobile, email,
     position, description, status, created_at, updated_at";

fn map_contact(row: &Row<'_>) -> rusqlite::Result<DbContact> {
    Ok(DbContact {
        code: row.get(0)?,
        company: row.get(1)?,
        lastname: row.get(2)?,
        firstname: row.get(3)?,
        phone: row.get(4)?,
        mobile: row.get(5)?,
        email: row.get(6)?,
        position: row.get(7)?,
        description: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

impl CrmDb {
    /// Insert or replace a contact row.
    pub fn upsert_contact(&self, contact: &DbContact) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO contacts (code, company, lastname, firstname, phone, mobile,
                email, position, description, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(code) DO UPDATE SET
                company = ?2, lastname = ?3, firstname = ?4, phone = ?5, mobile = ?6,
                email = ?7, position = ?8, description = ?9, status = ?10,
                updated_at = ?12",
            params![
                contact.code,
                contact.company,
                contact.lastname,
                contact.firstname,
                contact.phone,
                contact.mobile,
                contact.email,
                contact.position,
                contact.description,
                contact.status,
                contact.created_at,
                contact.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Look up a single contact by code.
    pub fn get_contact(&self, code: &str) -> Result<Option<DbContact>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE code = ?1"
        ))?;
        let mut rows = stmt.query_map(params![code], map_contact)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List contacts, optionally filtered by status, ordered by lastname.
    pub fn list_contacts(
        &self,
        status: Option<ContactStatus>,
    ) -> Result<Vec<DbContact>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY lastname, firstname"
        ))?;
        let rows = stmt.query_map(params![status], map_contact)?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row?);
        }
        Ok(contacts)
    }

    /// Contacts attached to a company, ordered by lastname.
    pub fn contacts_for_company(&self, company: &str) -> Result<Vec<DbContact>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE company = ?1
             ORDER BY lastname, firstname"
        ))?;
        let rows = stmt.query_map(params![company], map_contact)?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row?);
        }
        Ok(contacts)
    }

    /// All contact codes, for code allocation.
    pub fn contact_codes(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare("SELECT code FROM contacts")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut codes = Vec::new();
        for row in rows {
            codes.push(row?);
        }
        Ok(codes)
    }
}
