use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::config::Config;
use crate::core::lib::ConfigError;

pub const CONFIG_ENV: &str = "OPSH_CONFIG";
const APP_DIR: &str = "opsh";
const CONFIG_FILE: &str = "config.json";
const HISTORY_FILE: &str = "history.txt";

/// Reads and writes the per-user config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `--config` wins, then `$OPSH_CONFIG`, then `<config dir>/opsh/config.json`.
    pub fn locate(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Ok(Self::new(path));
        }
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(dir.join(APP_DIR).join(CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Line-editor history lives beside the config file.
    pub fn history_path(&self) -> PathBuf {
        self.path.with_file_name(HISTORY_FILE)
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ConfigError::Missing(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        config.validate()?;
        debug!(path = %self.path.display(), provider = %config.provider, "loaded config");
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        config.validate()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json + "\n")?;
        restrict_permissions(&self.path)?;
        info!(path = %self.path.display(), provider = %config.provider, "saved config");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}
