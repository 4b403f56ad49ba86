use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::content::ValidationPolicy;
use crate::error::ConfigError;
use crate::processing::DEFAULT_STALE_AFTER;
use crate::scheduler::{DEFAULT_BATCH_SIZE, DEFAULT_INTERVAL};
use crate::secrets;

/// Environment variable holding the generation API key unless overridden.
pub const DEFAULT_API_KEY_ENV_VAR: &str = "CURRICULA_GENERATION_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculaConfig {
    pub version: String,
    /// Relative storage paths are resolved against this directory.
    #[serde(default)]
    pub upload_root: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub validation: ValidationPolicy,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub generation: Option<GenerationServiceConfig>,
}

impl Default for CurriculaConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            upload_root: None,
            database: DatabaseConfig::default(),
            validation: ValidationPolicy::default(),
            scheduler: SchedulerConfig::default(),
            generation: None,
        }
    }
}

impl CurriculaConfig {
    pub fn upload_root_path(&self) -> Option<PathBuf> {
        self.upload_root.as_deref().map(PathBuf::from)
    }

    /// Configured database path, or `~/.curricula/data/curricula.db`.
    pub fn database_path(&self) -> Option<PathBuf> {
        match &self.database.path {
            Some(path) => Some(PathBuf::from(path)),
            None => crate::db::default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Age after which a `processing` claim may be taken over by a manual
    /// re-trigger.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL.as_secs()
}

fn default_stale_after_secs() -> u64 {
    DEFAULT_STALE_AFTER.as_secs()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: DEFAULT_BATCH_SIZE,
            interval_secs: default_interval_secs(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationServiceConfig {
    pub base_url: String,
    #[serde(default = "default_api_key_env_var")]
    pub api_key_env_var: String,
    /// Takes priority over the environment variable when set.
    #[serde(default)]
    pub api_key_file: Option<String>,
    /// No timeout unless set.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_key_env_var() -> String {
    DEFAULT_API_KEY_ENV_VAR.to_string()
}

impl GenerationServiceConfig {
    pub fn api_key(&self) -> Result<SecretString, ConfigError> {
        Ok(secrets::resolve_secret(
            self.api_key_file.as_deref(),
            Some(&self.api_key_env_var),
        )?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CurriculaConfig::default();
        assert_eq!(config.scheduler.batch_size, 10);
        assert_eq!(config.scheduler.interval(), Duration::from_secs(300));
        assert_eq!(config.scheduler.stale_after(), Duration::from_secs(1800));
        assert_eq!(config.validation.min_chars, 100);
        assert_eq!(config.validation.min_words, 50);
        assert!(config.generation.is_none());
        assert!(config.upload_root_path().is_none());
    }

    #[test]
    fn test_database_path_override() {
        let mut config = CurriculaConfig::default();
        assert!(config
            .database_path()
            .is_some_and(|p| p.ends_with("curricula.db")));

        config.database.path = Some("/var/lib/curricula/app.db".to_string());
        assert_eq!(
            config.database_path(),
            Some(PathBuf::from("/var/lib/curricula/app.db"))
        );
    }

    #[test]
    fn test_generation_defaults() {
        let generation: GenerationServiceConfig =
            serde_json::from_str(r#"{"base_url": "https://gen.example.com"}"#).unwrap();
        assert_eq!(generation.api_key_env_var, DEFAULT_API_KEY_ENV_VAR);
        assert!(generation.timeout().is_none());
    }
}
