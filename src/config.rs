//! Optional configuration file at `~/.pipecrm/config.json`.
//!
//! Everything has a default: a missing file means default database path
//! and the "admin" user. A present but malformed file is an error rather
//! than a silent fallback.

use std::path::PathBuf;

use serde::Deserialize;

use crate::db::CrmDb;
use crate::error::CrmError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Override for the database file location.
    pub db_path: Option<PathBuf>,
    /// User id recorded as comment author and excluded from notifications.
    pub user: Option<String>,
}

impl Config {
    /// Load the config file, or defaults when it does not exist.
    pub fn load() -> Result<Config, CrmError> {
        let Some(home) = dirs::home_dir() else {
            return Ok(Config::default());
        };
        let path = home.join(".pipecrm").join("config.json");
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(&path)?;
        Self::from_json(&text)
    }

    /// Parse a config document.
    pub fn from_json(text: &str) -> Result<Config, CrmError> {
        serde_json::from_str(text).map_err(|e| CrmError::Config(format!("invalid config: {e}")))
    }

    /// Open the database this config points at.
    pub fn open_db(&self) -> Result<CrmDb, CrmError> {
        let db = match &self.db_path {
            Some(path) => CrmDb::open_at(path.clone())?,
            None => CrmDb::open()?,
        };
        Ok(db)
    }

    /// The acting user id.
    pub fn user_id(&self) -> &str {
        self.user.as_deref().unwrap_or("admin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.user_id(), "admin");
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_from_json() {
        let config =
            Config::from_json(r#"{"db_path": "/tmp/crm.db", "user": "jdoe"}"#).expect("parse");
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/crm.db")));
        assert_eq!(config.user_id(), "jdoe");
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(CrmError::Config(_))
        ));
        // Unknown keys are rejected so typos do not silently fall back.
        assert!(Config::from_json(r#"{"db_pth": "/tmp/x"}"#).is_err());
    }
}
