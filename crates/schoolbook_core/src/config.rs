//! Runtime configuration for the school store.
//!
//! Loaded from an optional JSON file; every field has a default so a
//! partial file (or none at all) is valid.

use crate::logging::default_log_level;
use crate::repo::kv_repo::DEFAULT_QUOTA_BYTES;
use crate::repo::school_store::StoreKeys;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable naming a config file for the CLI.
pub const CONFIG_ENV_VAR: &str = "SCHOOLBOOK_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolbookConfig {
    /// SQLite file backing the key/value store.
    pub db_path: PathBuf,
    pub data_key: String,
    pub session_key: String,
    pub credentials_key: String,
    /// Largest accepted stored document, in bytes.
    pub quota_bytes: usize,
    pub log_level: String,
    /// Absolute directory for rolling log files; logging is off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for SchoolbookConfig {
    fn default() -> Self {
        let keys = StoreKeys::default();
        Self {
            db_path: PathBuf::from("schoolbook.sqlite3"),
            data_key: keys.data,
            session_key: keys.session,
            credentials_key: keys.credentials,
            quota_bytes: DEFAULT_QUOTA_BYTES,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

impl SchoolbookConfig {
    /// Reads `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn store_keys(&self) -> StoreKeys {
        StoreKeys {
            data: self.data_key.clone(),
            session: self.session_key.clone(),
            credentials: self.credentials_key.clone(),
        }
    }
}
