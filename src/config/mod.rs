//! Configuration module for the diary janitor.
//!
//! The janitor is configured either from environment variables alone
//! ([`JanitorConfig::from_env`]) or from a TOML file with support for
//! environment variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [database]
//! type = "sqlite"
//! url = "${DATABASE_URL}"
//!
//! [storage.s3]
//! bucket = "${S3_BUCKET}"
//! access_key_id = "${AWS_ACCESS_KEY_ID}"
//! secret_access_key = "${AWS_SECRET_ACCESS_KEY}"
//!
//! [retention]
//! base_image_key = "${USER_BASE_IMAGE}"
//! ```

mod database;
mod observability;
mod retention;
mod server;
mod storage;

use std::path::Path;

pub use database::*;
pub use observability::*;
pub use retention::*;
use serde::{Deserialize, Serialize};
pub use server::*;
pub use storage::*;

/// Environment variables read by [`JanitorConfig::from_env`].
pub mod env_vars {
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
    pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
    pub const S3_BUCKET: &str = "S3_BUCKET";
    pub const USER_BASE_IMAGE: &str = "USER_BASE_IMAGE";
    pub const AWS_REGION: &str = "AWS_REGION";
    pub const S3_ENDPOINT: &str = "S3_ENDPOINT";
    pub const PORT: &str = "PORT";
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
    pub const METRICS_ENABLED: &str = "METRICS_ENABLED";
}

/// Root configuration for the janitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JanitorConfig {
    /// HTTP trigger configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Document store holding the diary collections.
    pub database: DatabaseConfig,

    /// Object store holding uploaded images.
    pub storage: StorageConfig,

    /// Retention windows and the protected base image.
    pub retention: RetentionConfig,

    /// Observability configuration (logging, metrics).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl JanitorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: JanitorConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from environment variables only.
    ///
    /// `DATABASE_URL`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
    /// `S3_BUCKET` and `USER_BASE_IMAGE` are required; an unset or empty
    /// value is an error. `AWS_REGION`, `S3_ENDPOINT`, `PORT`, `LOG_FORMAT`
    /// and `METRICS_ENABLED` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required_env(env_vars::DATABASE_URL)?;
        let storage = StorageConfig {
            s3: S3StorageConfig {
                bucket: required_env(env_vars::S3_BUCKET)?,
                region: optional_env(env_vars::AWS_REGION),
                endpoint: optional_env(env_vars::S3_ENDPOINT),
                access_key_id: Some(required_env(env_vars::AWS_ACCESS_KEY_ID)?),
                secret_access_key: Some(required_env(env_vars::AWS_SECRET_ACCESS_KEY)?),
                force_path_style: false,
                delete_batch_size: MAX_DELETE_BATCH_SIZE,
            },
        };
        let retention = RetentionConfig::new(required_env(env_vars::USER_BASE_IMAGE)?);

        let mut server = ServerConfig::default();
        if let Some(port) = optional_env(env_vars::PORT) {
            server.port = port.parse().map_err(|_| {
                ConfigError::Validation(format!("{} is not a valid port: {}", env_vars::PORT, port))
            })?;
        }

        let config = Self {
            server,
            database: database_from_url(database_url)?,
            storage,
            retention,
            observability: observability_from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.storage.validate().map_err(ConfigError::Validation)?;
        self.retention.validate().map_err(ConfigError::Validation)?;
        Ok(())
    }
}

#[cfg(feature = "database-sqlite")]
fn database_from_url(url: String) -> Result<DatabaseConfig, ConfigError> {
    Ok(DatabaseConfig::Sqlite(SqliteConfig::new(url)))
}

#[cfg(not(feature = "database-sqlite"))]
fn database_from_url(_url: String) -> Result<DatabaseConfig, ConfigError> {
    Err(ConfigError::Validation(
        "No document store backend compiled in. Rebuild with: cargo build --features database-sqlite"
            .into(),
    ))
}

fn observability_from_env() -> Result<ObservabilityConfig, ConfigError> {
    let mut observability = ObservabilityConfig::default();
    if let Some(format) = optional_env(env_vars::LOG_FORMAT) {
        observability.logging.format = match format.trim().to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Validation(format!(
                    "{} must be one of pretty, compact, json: {}",
                    env_vars::LOG_FORMAT,
                    other
                )));
            }
        };
    }
    if let Some(enabled) = optional_env(env_vars::METRICS_ENABLED) {
        observability.metrics.enabled = match enabled.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            other => {
                return Err(ConfigError::Validation(format!(
                    "{} is not a boolean: {}",
                    env_vars::METRICS_ENABLED,
                    other
                )));
            }
        };
    }
    Ok(observability)
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    optional_env(name).ok_or_else(|| ConfigError::EnvVarNotFound(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand environment variables in the format `${VAR_NAME}`.
/// Skips commented lines (lines where content before the variable is a comment).
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ConfigError::Validation(format!("Invalid interpolation pattern: {}", e)))?;
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let Some(whole) = cap.get(0) else {
                continue;
            };

            // Skip if this variable is inside a comment
            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            line_result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = optional_env(var_name)
                .ok_or_else(|| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = whole.end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    // Remove trailing newline if input didn't have one
    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const REQUIRED_VARS: [(&str, Option<&str>); 5] = [
        (env_vars::DATABASE_URL, Some("sqlite://diary.db")),
        (env_vars::AWS_ACCESS_KEY_ID, Some("AKIAEXAMPLE")),
        (env_vars::AWS_SECRET_ACCESS_KEY, Some("secret")),
        (env_vars::S3_BUCKET, Some("diary-images")),
        (env_vars::USER_BASE_IMAGE, Some("profile/base.png")),
    ];

    fn with_required_vars_except<F: FnOnce()>(missing: Option<&str>, f: F) {
        let vars: Vec<(&str, Option<&str>)> = REQUIRED_VARS
            .iter()
            .map(|(k, v)| (*k, if Some(*k) == missing { None } else { *v }))
            .chain([
                (env_vars::AWS_REGION, None),
                (env_vars::S3_ENDPOINT, None),
                (env_vars::PORT, None),
                (env_vars::LOG_FORMAT, None),
                (env_vars::METRICS_ENABLED, None),
            ])
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_minimal_file_config() {
        let config = JanitorConfig::from_str(
            r#"
            [database]
            type = "sqlite"
            url = "sqlite::memory:"

            [storage.s3]
            bucket = "diary-images"

            [retention]
            base_image_key = "profile/base.png"
        "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.s3.bucket, "diary-images");
        assert_eq!(config.retention.periods.notification_log_days, 14);
        assert_eq!(config.observability.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_missing_base_image_key_is_parse_error() {
        let result = JanitorConfig::from_str(
            r#"
            [database]
            type = "sqlite"
            url = "sqlite::memory:"

            [storage.s3]
            bucket = "diary-images"

            [retention]
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_database_section_is_error() {
        let result = JanitorConfig::from_str(
            r#"
            [storage.s3]
            bucket = "diary-images"

            [retention]
            base_image_key = "profile/base.png"
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_env_var_expansion() {
        temp_env::with_var("TEST_BUCKET_NAME", Some("bucket-a"), || {
            let result = expand_env_vars("bucket = \"${TEST_BUCKET_NAME}\"").unwrap();
            assert_eq!(result, "bucket = \"bucket-a\"");
        });
    }

    #[test]
    fn test_env_var_in_comment_ignored() {
        let result = expand_env_vars("# bucket = \"${NONEXISTENT_VAR}\"").unwrap();
        assert_eq!(result, "# bucket = \"${NONEXISTENT_VAR}\"");
    }

    #[test]
    fn test_missing_env_var_in_file_is_fatal() {
        temp_env::with_var_unset("JANITOR_TEST_UNSET", || {
            let result = expand_env_vars("url = \"${JANITOR_TEST_UNSET}\"");
            assert!(
                matches!(result, Err(ConfigError::EnvVarNotFound(ref name)) if name == "JANITOR_TEST_UNSET")
            );
        });
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("janitor.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            port = 9090

            [database]
            type = "sqlite"
            url = "diary.db"

            [storage.s3]
            bucket = "diary-images"
            region = "ap-northeast-2"

            [retention]
            base_image_key = "profile/base.png"

            [retention.periods]
            temp_user_days = 3
        "#,
        )
        .unwrap();

        let config = JanitorConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.retention.periods.temp_user_days, 3);
        assert_eq!(config.retention.periods.inactive_onboarding_days, 7);
    }

    #[test]
    fn test_from_file_missing_path() {
        let result = JanitorConfig::from_file("/nonexistent/janitor.toml");
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_required_vars() {
        with_required_vars_except(None, || {
            let config = JanitorConfig::from_env().unwrap();
            assert_eq!(config.storage.s3.bucket, "diary-images");
            assert_eq!(config.storage.s3.access_key_id.as_deref(), Some("AKIAEXAMPLE"));
            assert_eq!(config.retention.base_image_key, "profile/base.png");
            assert!(config.storage.s3.region.is_none());
            match config.database {
                DatabaseConfig::Sqlite(sqlite) => assert_eq!(sqlite.url, "sqlite://diary.db"),
                other => panic!("unexpected database config {:?}", other),
            }
        });
    }

    #[test]
    #[serial]
    fn test_from_env_missing_var_is_fatal() {
        for (name, _) in REQUIRED_VARS {
            with_required_vars_except(Some(name), || {
                let err = JanitorConfig::from_env().unwrap_err();
                assert!(
                    matches!(err, ConfigError::EnvVarNotFound(ref missing) if missing == name),
                    "expected {} to be reported missing, got {}",
                    name,
                    err
                );
            });
        }
    }

    #[test]
    #[serial]
    fn test_from_env_empty_var_is_fatal() {
        with_required_vars_except(None, || {
            temp_env::with_var(env_vars::USER_BASE_IMAGE, Some(""), || {
                assert!(matches!(
                    JanitorConfig::from_env(),
                    Err(ConfigError::EnvVarNotFound(_))
                ));
            });
        });
    }

    #[test]
    #[serial]
    fn test_from_env_port_override() {
        with_required_vars_except(None, || {
            temp_env::with_var(env_vars::PORT, Some("3000"), || {
                assert_eq!(JanitorConfig::from_env().unwrap().server.port, 3000);
            });
            temp_env::with_var(env_vars::PORT, Some("http"), || {
                assert!(matches!(
                    JanitorConfig::from_env(),
                    Err(ConfigError::Validation(_))
                ));
            });
        });
    }

    #[test]
    #[serial]
    fn test_from_env_observability_defaults() {
        with_required_vars_except(None, || {
            let config = JanitorConfig::from_env().unwrap();
            assert!(!config.observability.metrics.enabled);
            assert_eq!(config.observability.logging.format, LogFormat::Compact);
        });
    }

    #[test]
    #[serial]
    fn test_from_env_observability_overrides() {
        with_required_vars_except(None, || {
            temp_env::with_vars(
                [
                    (env_vars::LOG_FORMAT, Some("json")),
                    (env_vars::METRICS_ENABLED, Some("true")),
                ],
                || {
                    let config = JanitorConfig::from_env().unwrap();
                    assert!(config.observability.metrics.enabled);
                    assert_eq!(config.observability.logging.format, LogFormat::Json);
                },
            );
            temp_env::with_var(env_vars::LOG_FORMAT, Some("xml"), || {
                assert!(matches!(
                    JanitorConfig::from_env(),
                    Err(ConfigError::Validation(_))
                ));
            });
            temp_env::with_var(env_vars::METRICS_ENABLED, Some("maybe"), || {
                assert!(matches!(
                    JanitorConfig::from_env(),
                    Err(ConfigError::Validation(_))
                ));
            });
        });
    }
}
