//! Configuration resolution for census-ingest
//!
//! Priority per setting: environment variable, then the TOML config file,
//! then the compiled default. A missing config file is not an error; a
//! malformed one is.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

const DEFAULT_PORT: u16 = 5725;

/// Optional overrides read from census.toml.
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    port: Option<u16>,
    database_path: Option<String>,
}

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
}

impl Config {
    /// Resolve configuration: ENV → TOML → defaults.
    pub fn resolve() -> Result<Self> {
        let toml = load_toml_config()?;

        let port = match std::env::var("CENSUS_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("CENSUS_PORT '{}': {}", raw, e)))?,
            Err(_) => toml.port.unwrap_or(DEFAULT_PORT),
        };

        let database_path = std::env::var("CENSUS_DB")
            .map(PathBuf::from)
            .ok()
            .or_else(|| toml.database_path.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_database_path);

        Ok(Self {
            port,
            database_path,
        })
    }
}

/// Read the TOML config file if one exists at the platform config location.
fn load_toml_config() -> Result<TomlConfig> {
    let Some(path) = config_file_path() else {
        return Ok(TomlConfig::default());
    };
    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("read {}: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("parse {}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), "Loaded TOML config");
    Ok(config)
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("census").join("census.toml"))
}

/// OS-dependent default database location.
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("census"))
        .unwrap_or_else(|| PathBuf::from("./census_data"))
        .join("census.db")
}
