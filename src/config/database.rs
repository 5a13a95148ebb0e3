use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum DatabaseConfig {
    /// No document store. The janitor refuses to start.
    #[default]
    None,

    /// SQLite document store, one table per collection.
    #[cfg(feature = "database-sqlite")]
    Sqlite(SqliteConfig),
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            DatabaseConfig::None => Err(ConfigError::Validation(
                "A [database] section is required".into(),
            )),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(c) => c.validate(),
        }
    }
}

/// SQLite configuration.
#[cfg(feature = "database-sqlite")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
    /// Connection URL (`sqlite://path/to/diary.db`) or plain file path.
    pub url: String,

    /// Create the database file if it doesn't exist.
    #[serde(default)]
    pub create_if_missing: bool,

    /// Create missing collection tables on startup.
    #[serde(default = "default_true")]
    pub ensure_schema: bool,

    /// Enable WAL mode for better concurrency.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_sqlite_max_connections")]
    pub max_connections: u32,
}

#[cfg(feature = "database-sqlite")]
impl SqliteConfig {
    /// Configuration with defaults for everything but the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            create_if_missing: false,
            ensure_schema: true,
            wal_mode: true,
            busy_timeout_ms: default_busy_timeout(),
            max_connections: default_sqlite_max_connections(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "SQLite url cannot be empty".into(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Validation(
                "SQLite max_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Build driver connect options from this configuration.
    pub fn connect_options(&self) -> Result<sqlx::sqlite::SqliteConnectOptions, sqlx::Error> {
        use std::str::FromStr;

        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};

        let options = if self.url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(&self.url)?
        } else {
            SqliteConnectOptions::new().filename(&self.url)
        };

        Ok(options
            .create_if_missing(self.create_if_missing)
            .journal_mode(if self.wal_mode {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Delete
            })
            .busy_timeout(std::time::Duration::from_millis(self.busy_timeout_ms)))
    }
}

#[cfg(feature = "database-sqlite")]
fn default_busy_timeout() -> u64 {
    5000 // 5 seconds
}

#[cfg(feature = "database-sqlite")]
fn default_sqlite_max_connections() -> u32 {
    5
}

#[cfg(feature = "database-sqlite")]
fn default_true() -> bool {
    true
}

#[cfg(all(test, feature = "database-sqlite"))]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_rejected() {
        assert!(DatabaseConfig::None.validate().is_err());
    }

    #[test]
    fn test_sqlite_defaults() {
        let config: DatabaseConfig = toml::from_str(
            r#"
            type = "sqlite"
            url = "sqlite://diary.db"
        "#,
        )
        .unwrap();
        match config {
            DatabaseConfig::Sqlite(c) => {
                assert!(c.ensure_schema);
                assert!(c.wal_mode);
                assert!(!c.create_if_missing);
                assert_eq!(c.max_connections, 5);
                assert_eq!(c.busy_timeout_ms, 5000);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let config = DatabaseConfig::Sqlite(SqliteConfig::new("  "));
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_connect_options_accepts_url_and_path() {
        assert!(SqliteConfig::new("sqlite::memory:").connect_options().is_ok());

        let from_path = SqliteConfig::new("data/diary.db").connect_options().unwrap();
        assert_eq!(from_path.get_filename().to_string_lossy(), "data/diary.db");
    }
}
