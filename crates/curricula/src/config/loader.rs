use std::path::Path;

use crate::config::schema::CurriculaConfig;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CurriculaConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = load_config_from_str(&content)?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

pub fn load_config_from_str(content: &str) -> Result<CurriculaConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: CurriculaConfig = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &CurriculaConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.scheduler.batch_size == 0 {
        return Err(ConfigError::Validation {
            message: "scheduler.batch_size must be at least 1".to_string(),
        });
    }

    if config.scheduler.interval_secs == 0 {
        return Err(ConfigError::Validation {
            message: "scheduler.interval_secs must be at least 1".to_string(),
        });
    }

    if config.scheduler.stale_after_secs == 0 {
        return Err(ConfigError::Validation {
            message: "scheduler.stale_after_secs must be at least 1".to_string(),
        });
    }

    if config.validation.min_chars == 0 || config.validation.min_words == 0 {
        return Err(ConfigError::Validation {
            message: "validation thresholds must be positive".to_string(),
        });
    }

    if let Some(root) = &config.upload_root {
        if root.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "upload_root must not be blank".to_string(),
            });
        }
    }

    if let Some(generation) = &config.generation {
        let url = generation.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation {
                message: format!("generation.base_url must be an http(s) URL: {}", url),
            });
        }
    }

    Ok(())
}
