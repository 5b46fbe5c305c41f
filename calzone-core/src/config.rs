//! Calzone configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{CalzoneError, CalzoneResult};
use crate::event::Categories;

static DEFAULT_STORAGE_ROOT: &str = "/var/lib/calzone";
static DEFAULT_STATIC_DIR: &str = "./websource/static";
const DEFAULT_PORT: u16 = 8090;

fn default_storage_root() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_ROOT)
}

fn default_static_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STATIC_DIR)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Configuration loaded from ~/.config/calzone/config.toml, overridden by
/// `CALZONE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct CalzoneConfig {
    /// Directory holding the `MM_YYYY.csv` ledgers.
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,

    #[serde(default)]
    pub categories: Categories,

    /// Front end assets served by the HTTP layer.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for CalzoneConfig {
    fn default() -> Self {
        CalzoneConfig {
            storage_root: default_storage_root(),
            categories: Categories::default(),
            static_dir: default_static_dir(),
            port: DEFAULT_PORT,
        }
    }
}

impl CalzoneConfig {
    pub fn config_path() -> CalzoneResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalzoneError::Config("Could not determine config directory".into()))?
            .join("calzone");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from `path` (or the default location). A missing
    /// file is not an error; every key has a default.
    pub fn load(path: Option<&Path>) -> CalzoneResult<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let config: CalzoneConfig = Config::builder()
            .add_source(File::from(config_path).required(path.is_some()))
            .add_source(
                Environment::with_prefix("CALZONE")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("categories"),
            )
            .build()
            .map_err(|e| CalzoneError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalzoneError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CalzoneResult<()> {
        if self.categories.is_empty() {
            return Err(CalzoneError::Config("categories must not be empty".into()));
        }
        // evType is submitted as a single digit
        if self.categories.len() > 10 {
            return Err(CalzoneError::Config(format!(
                "at most 10 categories are supported, found {}",
                self.categories.len()
            )));
        }
        Ok(())
    }

    /// Storage root with `~` expanded.
    pub fn storage_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.storage_root.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }
}
