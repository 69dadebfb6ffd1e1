//! Destination connection configuration.
//!
//! A single JSON document describes the destination server. It is loaded
//! once at startup and overwritten on save; the core never mutates it.
//!
//! # Examples
//!
//! ```
//! use shamela::loader::DestinationConfig;
//!
//! let config: DestinationConfig = serde_json::from_str(
//!     r#"{ "host": "127.0.0.1", "database": "library", "user": "loader" }"#,
//! ).unwrap();
//! assert_eq!(config.port, 3306);
//! assert_eq!(config.password, "");
//! ```

use std::path::Path;
use std::time::Duration;

use mysql::{Opts, OptsBuilder};
use serde::{Deserialize, Serialize};

use crate::Result;

fn default_port() -> u16 {
    3306
}

/// Connection settings for the destination database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Server hostname or address
    pub host: String,
    /// TCP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Schema holding the library tables
    pub database: String,
    /// Account name
    pub user: String,
    /// Account password; empty means "omit from connect"
    #[serde(default)]
    pub password: String,
}

impl DestinationConfig {
    /// Reads a configuration document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Writes the configuration document, replacing any previous one.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Builds driver options: utf8mb4 from the first statement, and a
    /// bounded connect timeout.
    pub(crate) fn to_opts(&self) -> Opts {
        let mut builder = OptsBuilder::new()
            .ip_or_hostname(Some(self.host.clone()))
            .tcp_port(self.port)
            .db_name(Some(self.database.clone()))
            .user(Some(self.user.clone()))
            .init(vec!["SET NAMES utf8mb4".to_string()])
            .tcp_connect_timeout(Some(Duration::from_secs(10)));
        if !self.password.is_empty() {
            builder = builder.pass(Some(self.password.clone()));
        }
        Opts::from(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_optional_keys() {
        let config: DestinationConfig = serde_json::from_str(
            r#"{ "host": "db.local", "database": "library", "user": "loader" }"#,
        )
        .unwrap();
        assert_eq!(config.port, 3306);
        assert_eq!(config.password, "");
    }

    #[test]
    fn test_empty_password_is_omitted_from_opts() {
        let config = DestinationConfig {
            host: "db.local".to_string(),
            port: 3307,
            database: "library".to_string(),
            user: "loader".to_string(),
            password: String::new(),
        };
        let opts = config.to_opts();
        assert_eq!(opts.get_tcp_port(), 3307);
        assert_eq!(opts.get_user(), Some("loader"));
        assert_eq!(opts.get_pass(), None);
        assert_eq!(opts.get_db_name(), Some("library"));
    }

    #[test]
    fn test_password_is_kept_when_present() {
        let config = DestinationConfig {
            host: "db.local".to_string(),
            port: 3306,
            database: "library".to_string(),
            user: "loader".to_string(),
            password: "secret".to_string(),
        };
        assert_eq!(config.to_opts().get_pass(), Some("secret"));
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("destination.json");
        let config = DestinationConfig {
            host: "db.local".to_string(),
            port: 3310,
            database: "library".to_string(),
            user: "loader".to_string(),
            password: "secret".to_string(),
        };
        config.save(&path).unwrap();
        let loaded = DestinationConfig::load(&path).unwrap();
        assert_eq!(loaded.port, 3310);
        assert_eq!(loaded.password, "secret");
    }
}
