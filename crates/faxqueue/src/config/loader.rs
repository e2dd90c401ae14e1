use std::path::{Component, Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;

pub const CONFIG_ENV_VAR: &str = "FAXQUEUE_CONFIG";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Returns the canonical config path: `<config dir>/faxqueue/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("faxqueue").join("config.json"))
}

/// Resolves the config file to use: explicit path, then `FAXQUEUE_CONFIG`,
/// then the default location if it exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    default_config_path().filter(|p| p.is_file())
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Validate version
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.base_directory.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "base_directory must not be empty".to_string(),
        });
    }

    for (key, dir) in config.directories.all() {
        if !is_relative_subpath(dir) {
            return Err(ConfigError::Validation {
                message: format!(
                    "directories.{} must be a relative path below the base: '{}'",
                    key, dir
                ),
            });
        }
    }

    if config.sources.is_empty() {
        return Err(ConfigError::Validation {
            message: "At least one source bucket is required".to_string(),
        });
    }

    for (name, dir) in &config.sources {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::InvalidSource {
                name: name.clone(),
                reason: "Bucket names may only contain letters, digits, '-' and '_'".to_string(),
            });
        }
        if dir.trim().is_empty() {
            return Err(ConfigError::InvalidSource {
                name: name.clone(),
                reason: "Directory must not be empty".to_string(),
            });
        }
    }

    let limits = &config.limits;
    for (key, value) in [
        ("max_list_files", limits.max_list_files),
        ("max_active_jobs", limits.max_active_jobs),
        ("max_fail_list", limits.max_fail_list),
        ("max_archive_list", limits.max_archive_list),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation {
                message: format!("limits.{} must be greater than zero", key),
            });
        }
    }

    if config.country_code.is_empty() || !config.country_code.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ConfigError::Validation {
            message: format!("country_code must be digits only: '{}'", config.country_code),
        });
    }

    Ok(())
}

fn is_relative_subpath(dir: &str) -> bool {
    let path = Path::new(dir);
    !dir.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}
