//! Data retention configuration.
//!
//! # Example
//!
//! ```toml
//! [retention]
//! base_image_key = "profile/default.png"
//!
//! [retention.periods]
//! inactive_onboarding_days = 7
//! temp_user_days = 7
//! notification_log_days = 14
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Data retention configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Age windows for the age-based purges.
    #[serde(default)]
    pub periods: RetentionPeriods,

    /// Object key of the shared default profile image.
    /// It is never deleted from the object store.
    pub base_image_key: String,
}

impl RetentionConfig {
    pub fn new(base_image_key: impl Into<String>) -> Self {
        Self {
            periods: RetentionPeriods::default(),
            base_image_key: base_image_key.into(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_image_key.trim().is_empty() {
            return Err("retention.base_image_key cannot be empty".to_string());
        }
        self.periods.validate()
    }
}

/// Retention periods, in days.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionPeriods {
    /// Days an unfinished social onboarding may linger before its user is purged.
    /// Default: 7 days
    #[serde(default = "default_inactive_onboarding_days")]
    pub inactive_onboarding_days: u32,

    /// Days a temporary user record is kept.
    /// Default: 7 days
    #[serde(default = "default_temp_user_days")]
    pub temp_user_days: u32,

    /// Days notification logs are kept.
    /// Default: 14 days
    #[serde(default = "default_notification_log_days")]
    pub notification_log_days: u32,
}

impl Default for RetentionPeriods {
    fn default() -> Self {
        Self {
            inactive_onboarding_days: default_inactive_onboarding_days(),
            temp_user_days: default_temp_user_days(),
            notification_log_days: default_notification_log_days(),
        }
    }
}

impl RetentionPeriods {
    pub fn inactive_onboarding(&self) -> Duration {
        Duration::days(i64::from(self.inactive_onboarding_days))
    }

    pub fn temp_user(&self) -> Duration {
        Duration::days(i64::from(self.temp_user_days))
    }

    pub fn notification_log(&self) -> Duration {
        Duration::days(i64::from(self.notification_log_days))
    }

    fn validate(&self) -> Result<(), String> {
        for (name, days) in [
            ("inactive_onboarding_days", self.inactive_onboarding_days),
            ("temp_user_days", self.temp_user_days),
            ("notification_log_days", self.notification_log_days),
        ] {
            if days == 0 {
                return Err(format!("retention.periods.{} must be at least 1", name));
            }
        }
        Ok(())
    }
}

fn default_inactive_onboarding_days() -> u32 {
    7
}

fn default_temp_user_days() -> u32 {
    7
}

fn default_notification_log_days() -> u32 {
    14
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_periods() {
        let periods = RetentionPeriods::default();
        assert_eq!(periods.inactive_onboarding(), Duration::weeks(1));
        assert_eq!(periods.temp_user(), Duration::weeks(1));
        assert_eq!(periods.notification_log(), Duration::weeks(2));
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut config = RetentionConfig::new("default.png");
        assert!(config.validate().is_ok());
        config.periods.temp_user_days = 0;
        assert!(config.validate().unwrap_err().contains("temp_user_days"));
    }

    #[test]
    fn test_blank_base_image_rejected() {
        assert!(RetentionConfig::new(" ").validate().is_err());
    }
}
