use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string, or `memory` for the in-process store
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == "memory"
    }
}

/// Cadence of the booking expiry sweep
#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl SchedulerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

fn default_max_connections() -> u32 { 5 }
fn default_interval_secs() -> u64 { 60 }
fn default_shutdown_timeout_secs() -> u64 { 5 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load `default`, then the `RUN_MODE` file, then `local`, then `INNKEEP__*` env vars
    pub fn load_from(dir: &str) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name(&format!("{}/default", dir)))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("{}/{}", dir, run_mode)).required(false))
            // Developer overrides, not checked in
            .add_source(config::File::with_name(&format!("{}/local", dir)).required(false))
            // Eg. `INNKEEP__SCHEDULER__INTERVAL_SECS=30`
            .add_source(config::Environment::with_prefix("INNKEEP").separator("__"))
            .build()?;

        let config: Config = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.scheduler.interval_secs == 0 {
            return Err(config::ConfigError::Message(
                "scheduler.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(config::ConfigError::Message(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_defaults() {
        let config = Config::from_toml_str(
            r#"
            [database]
            url = "postgres://localhost/innkeep"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.max_connections, 5);
        assert!(!config.database.is_memory());
        assert_eq!(config.scheduler.interval(), Duration::from_secs(60));
        assert_eq!(config.scheduler.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_scheduler_overrides() {
        let config = Config::from_toml_str(
            r#"
            [database]
            url = "memory"

            [scheduler]
            interval_secs = 15
            shutdown_timeout_secs = 2
            "#,
        )
        .unwrap();

        assert!(config.database.is_memory());
        assert_eq!(config.scheduler.interval(), Duration::from_secs(15));
        assert_eq!(config.scheduler.shutdown_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = Config::from_toml_str(
            r#"
            [database]
            url = "memory"

            [scheduler]
            interval_secs = 0
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn test_missing_database_section_rejected() {
        assert!(Config::from_toml_str("[scheduler]\ninterval_secs = 10\n").is_err());
    }
}
