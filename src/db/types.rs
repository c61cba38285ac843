//! Row types for the SQLite store. One struct per table, mirroring the
//! column order used by the query modules.

use serde::Serialize;

use crate::types::{ContactStatus, EntityKind, MissionStatus};

/// A row from the `companies` table.
#[derive(Debug, Clone, Serialize)]
pub struct DbCompany {
    pub code: String,
    pub title: String,
    pub address_1: Option<String>,
    pub address_2: Option<String>,
    pub zipcode: Option<String>,
    pub town: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub website: Option<String>,
    pub activity: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `contacts` table.
#[derive(Debug, Clone, Serialize)]
pub struct DbContact {
    pub code: String,
    pub company: Option<String>,
    pub lastname: String,
    pub firstname: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub description: Option<String>,
    pub status: ContactStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl DbContact {
    /// Display title: "Lastname Firstname", used in lists and emails.
    pub fn display_name(&self) -> String {
        match &self.firstname {
            Some(first) if !first.is_empty() => format!("{} {}", self.lastname, first),
            _ => self.lastname.clone(),
        }
    }
}

/// A row from the `missions` table. Linked contact codes live in the
/// `mission_contacts` join table and are loaded alongside.
#[derive(Debug, Clone, Serialize)]
pub struct DbMission {
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub probability: Option<i64>,
    pub deadline: Option<String>,
    pub status: MissionStatus,
    pub assignee: Option<String>,
    pub cc: Vec<String>,
    pub contacts: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `comments` table.
#[derive(Debug, Clone, Serialize)]
pub struct DbComment {
    pub id: i64,
    #[serde(skip)]
    pub entity_kind: EntityKind,
    pub entity_code: String,
    pub author: String,
    pub body: String,
    pub attachment: Option<String>,
    pub alert_at: Option<String>,
    pub next_action: Option<String>,
    pub created_at: String,
}

/// A row from the `users` table.
#[derive(Debug, Clone, Serialize)]
pub struct DbUser {
    pub id: String,
    pub name: String,
    pub email: String,
}
