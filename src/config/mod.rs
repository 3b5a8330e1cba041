mod init;
mod schema;

pub use init::{default_config, write_default_config};
pub use schema::Config;

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::scoring::validate_engine_config;

/// Get the config directory path (~/.config/exit-value/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("exit-value"))
}

/// Get the default config file path (~/.config/exit-value/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path
///   (~/.config/exit-value/config.yaml), falling back to built-in defaults
///   when that file does not exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found at {}", p.display());
            }
            p
        }
        None => {
            let p = get_config_path()?;
            if !p.exists() {
                tracing::debug!(path = %p.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            p
        }
    };

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!("Failed to parse config: invalid YAML in {}", config_path.display())
    })?;

    tracing::debug!(
        path = %config_path.display(),
        industries = config.engine.industries.len(),
        "loaded config"
    );
    Ok(config)
}

/// Check a loaded configuration, returning every problem found.
pub fn validate(config: &Config) -> Result<(), Vec<String>> {
    validate_engine_config(&config.engine)
}
