//! Server configuration loaded from TOML.
//!
//! The file path comes from `ANONVOTE_CONFIG`; without it, or when the file
//! does not exist, every field takes its default.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use anonvote_circuits::DEFAULT_HEIGHT;

pub const CONFIG_ENV: &str = "ANONVOTE_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_tree_height")]
    pub tree_height: usize,
    #[serde(default = "default_keys_dir")]
    pub keys_dir: PathBuf,
    #[serde(default = "default_proposals")]
    pub proposals: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            tree_height: default_tree_height(),
            keys_dir: default_keys_dir(),
            proposals: default_proposals(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3001))
}

fn default_tree_height() -> usize {
    DEFAULT_HEIGHT
}

fn default_keys_dir() -> PathBuf {
    PathBuf::from("keys")
}

fn default_proposals() -> Vec<String> {
    vec![
        "eat fruit for lunch".to_string(),
        "eat vegetable for lunch".to_string(),
    ]
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults when the file is missing; a file that exists must parse.
    pub fn load_from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from the path in `ANONVOTE_CONFIG`, or defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_from_file_or_default(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}
