use chrono::Duration;
use serde::Deserialize;

use crate::domain::account::LockoutPolicy;
use crate::domain::DomainError;
use crate::infrastructure::account::DeletePolicy;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub lockout: LockoutConfig,
    pub storage: StorageConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    pub max_failed_attempts: u32,
    pub lockout_duration_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// What happens to claims and role assignments when an account row is
    /// removed
    pub related_on_delete: DeletePolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub owner_username: String,
    pub owner_email: String,
    pub owner_mobile: String,
    /// A random credential is generated and logged when unset
    pub owner_password: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_duration_secs: 900,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            related_on_delete: DeletePolicy::default(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            owner_username: "owner".to_string(),
            owner_email: "owner@example.com".to_string(),
            owner_mobile: "09000000000".to_string(),
            owner_password: None,
        }
    }
}

impl LockoutConfig {
    /// Validate the configured values and build the policy the guard enforces
    pub fn policy(&self) -> Result<LockoutPolicy, DomainError> {
        let secs = i64::try_from(self.lockout_duration_secs).map_err(|_| {
            DomainError::configuration(format!(
                "lockout_duration_secs {} is out of range",
                self.lockout_duration_secs
            ))
        })?;
        let duration = Duration::try_seconds(secs).ok_or_else(|| {
            DomainError::configuration(format!("lockout_duration_secs {} is out of range", secs))
        })?;

        LockoutPolicy::new(self.max_failed_attempts, duration)
    }
}

impl StorageConfig {
    pub fn database_url(&self) -> Result<&str, DomainError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| DomainError::configuration("storage.database_url is not set"))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.lockout.max_failed_attempts, 5);
        assert_eq!(config.storage.related_on_delete, DeletePolicy::Restrict);
        assert!(config.storage.database_url().is_err());
        assert_eq!(config.seed.owner_username, "owner");
    }

    #[test]
    fn test_lockout_policy_from_config() {
        let config = LockoutConfig {
            max_failed_attempts: 3,
            lockout_duration_secs: 900,
        };

        let policy = config.policy().unwrap();
        assert_eq!(policy.max_failed_attempts(), 3);
        assert_eq!(policy.lockout_duration(), Duration::minutes(15));
    }

    #[test]
    fn test_invalid_lockout_config() {
        let zero_attempts = LockoutConfig {
            max_failed_attempts: 0,
            lockout_duration_secs: 900,
        };
        assert!(zero_attempts.policy().is_err());

        let zero_duration = LockoutConfig {
            max_failed_attempts: 3,
            lockout_duration_secs: 0,
        };
        assert!(zero_duration.policy().is_err());

        let huge = LockoutConfig {
            max_failed_attempts: 3,
            lockout_duration_secs: u64::MAX,
        };
        assert!(huge.policy().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = from_toml(
            r#"
            [lockout]
            max_failed_attempts = 3

            [storage]
            database_url = "postgres://localhost/keyvan"
            related_on_delete = "cascade"

            [logging]
            format = "json"
            "#,
        );

        assert_eq!(config.lockout.max_failed_attempts, 3);
        assert_eq!(config.lockout.lockout_duration_secs, 900);
        assert_eq!(config.storage.database_url().unwrap(), "postgres://localhost/keyvan");
        assert_eq!(config.storage.related_on_delete, DeletePolicy::Cascade);
        assert_eq!(config.storage.max_connections, 5);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }
}
