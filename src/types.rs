//! Enumerated domain types: mission and contact statuses, the CSV editor
//! presets, and the entity kinds that share the comment log.
//!
//! Each enum has a stable wire code (stored in SQLite and accepted on the
//! CLI) and a display label used in lists, changelogs and CSV exports.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a mission (a tracked sales opportunity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    Opportunity,
    Project,
    Finished,
    NoGo,
}

impl MissionStatus {
    pub const ALL: [MissionStatus; 4] = [
        MissionStatus::Opportunity,
        MissionStatus::Project,
        MissionStatus::Finished,
        MissionStatus::NoGo,
    ];

    /// Stable storage code.
    pub fn as_code(self) -> &'static str {
        match self {
            MissionStatus::Opportunity => "opportunity",
            MissionStatus::Project => "project",
            MissionStatus::Finished => "finished",
            MissionStatus::NoGo => "nogo",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "opportunity" => Some(MissionStatus::Opportunity),
            "project" => Some(MissionStatus::Project),
            "finished" => Some(MissionStatus::Finished),
            "nogo" => Some(MissionStatus::NoGo),
            _ => None,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            MissionStatus::Opportunity => "Opportunity",
            MissionStatus::Project => "Project",
            MissionStatus::Finished => "Finished",
            MissionStatus::NoGo => "NoGo",
        }
    }

    /// Compact label for dense tables ("project" reads as a win).
    pub fn short_label(self) -> &'static str {
        match self {
            MissionStatus::Project => "Win",
            other => other.label(),
        }
    }

    /// A won mission: its amount counts as assured revenue.
    pub fn is_assured(self) -> bool {
        matches!(self, MissionStatus::Project | MissionStatus::Finished)
    }
}

impl ToSql for MissionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_code().into())
    }
}

impl FromSql for MissionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_str()?;
        MissionStatus::from_code(code)
            .ok_or_else(|| FromSqlError::Other(format!("unknown mission status: {code}").into()))
    }
}

/// Lifecycle status of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Lead,
    Client,
    Dead,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 3] = [
        ContactStatus::Lead,
        ContactStatus::Client,
        ContactStatus::Dead,
    ];

    pub fn as_code(self) -> &'static str {
        match self {
            ContactStatus::Lead => "lead",
            ContactStatus::Client => "client",
            ContactStatus::Dead => "dead",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "lead" => Some(ContactStatus::Lead),
            "client" => Some(ContactStatus::Client),
            "dead" => Some(ContactStatus::Dead),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContactStatus::Lead => "Lead",
            ContactStatus::Client => "Client",
            ContactStatus::Dead => "Dead",
        }
    }
}

impl ToSql for ContactStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_code().into())
    }
}

impl FromSql for ContactStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_str()?;
        ContactStatus::from_code(code)
            .ok_or_else(|| FromSqlError::Other(format!("unknown contact status: {code}").into()))
    }
}

/// Target spreadsheet application for CSV exports. Each preset pins the
/// byte encoding and the field separator the application expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvEditor {
    /// OpenOffice.org / LibreOffice: UTF-8, comma.
    OpenOffice,
    /// MS Excel: Windows-1252, semicolon.
    Excel,
}

impl CsvEditor {
    pub fn as_code(self) -> &'static str {
        match self {
            CsvEditor::OpenOffice => "oo",
            CsvEditor::Excel => "excel",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "oo" => Some(CsvEditor::OpenOffice),
            "excel" => Some(CsvEditor::Excel),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CsvEditor::OpenOffice => "OpenOffice.org / LibreOffice",
            CsvEditor::Excel => "MS Excel",
        }
    }

    pub fn separator(self) -> char {
        match self {
            CsvEditor::OpenOffice => ',',
            CsvEditor::Excel => ';',
        }
    }

    /// True when rows must be encoded as Windows-1252 rather than UTF-8.
    pub fn windows_1252(self) -> bool {
        matches!(self, CsvEditor::Excel)
    }
}

/// The entity kinds sharing the append-only comment log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Company,
    Contact,
    Mission,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Company => "company",
            EntityKind::Contact => "contact",
            EntityKind::Mission => "mission",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "company" => Some(EntityKind::Company),
            "contact" => Some(EntityKind::Contact),
            "mission" => Some(EntityKind::Mission),
            _ => None,
        }
    }
}

impl ToSql for EntityKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for EntityKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        EntityKind::from_str(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown entity kind: {s}").into()))
    }
}
