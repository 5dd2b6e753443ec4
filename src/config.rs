//! qfilter configuration.
//!
//! Loaded from `qfilter.toml` in the working directory, falling back to
//! `<config dir>/qfilter/config.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{FilterError, FilterResult};
use crate::transpiler::{CompilerOptions, Dialect};

pub const LOCAL_CONFIG: &str = "qfilter.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub compiler: CompilerConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL for the sqlx executor.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub dialect: Dialect,
    #[serde(flatten)]
    pub options: CompilerOptions,
}

impl Config {
    pub fn from_toml(content: &str) -> FilterResult<Self> {
        toml::from_str(content).map_err(|e| FilterError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> FilterResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// First existing config file, if any.
    pub fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("qfilter").join("config.toml"))
            .filter(|path| path.is_file())
    }

    /// Load the located config file, or defaults when there is none.
    pub fn load() -> FilterResult<Self> {
        match Self::locate() {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }
}
