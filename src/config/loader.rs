//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Command-line and environment overrides applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<std::path::PathBuf>,
    pub log_dir: Option<std::path::PathBuf>,
    pub bind_address: Option<String>,
    pub retention_hours: Option<u64>,
    pub timezone: Option<String>,
}

impl Overrides {
    /// Write every set override into `config`.
    pub fn apply(self, config: &mut ServerConfig) {
        if let Some(root) = self.root {
            config.files.root = root;
        }
        if let Some(dir) = self.log_dir {
            config.access_log.directory = dir;
        }
        if let Some(addr) = self.bind_address {
            config.listener.bind_address = addr;
        }
        if let Some(hours) = self.retention_hours {
            config.access_log.retention_hours = hours;
        }
        if let Some(tz) = self.timezone {
            config.access_log.timezone = tz;
        }
    }
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    resolve_config(Some(path), Overrides::default())
}

/// Build the effective configuration: file (or defaults), then overrides, then validation.
pub fn resolve_config(path: Option<&Path>, overrides: Overrides) -> Result<ServerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ServerConfig::default(),
    };
    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
