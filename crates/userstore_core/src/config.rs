//! Repository configuration loading.
//!
//! # Responsibility
//! - Parse the backend selector and backend-specific options from JSON.
//!
//! # Invariants
//! - Unknown backend names and unreadable files are errors; there is no
//!   silent fallback to a default backend.

use crate::repo::factory::BackendKind;
use crate::repo::slot_repo::SlotLayout;
use log::{error, info};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Backend selection plus the options that backend needs.
///
/// ```json
/// {"backend": "slots", "max_records": 16, "record_width": 64}
/// ```
///
/// The `backend` value goes through `BackendKind::from_str`, so file
/// configuration accepts the same names and aliases as every other caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRepositoryConfig")]
pub enum RepositoryConfig {
    Ram,
    Slots(SlotLayout),
    Sqlite { path: PathBuf },
}

/// On-disk shape before the backend name is resolved.
#[derive(Debug, Deserialize)]
struct RawRepositoryConfig {
    backend: String,
    max_records: Option<usize>,
    record_width: Option<usize>,
    path: Option<PathBuf>,
}

impl TryFrom<RawRepositoryConfig> for RepositoryConfig {
    type Error = String;

    fn try_from(raw: RawRepositoryConfig) -> Result<Self, Self::Error> {
        let kind = raw
            .backend
            .parse::<BackendKind>()
            .map_err(|err| err.to_string())?;
        match kind {
            BackendKind::Ram => Ok(Self::Ram),
            BackendKind::Slots => {
                let defaults = SlotLayout::default();
                Ok(Self::Slots(SlotLayout {
                    max_records: raw.max_records.unwrap_or(defaults.max_records),
                    record_width: raw.record_width.unwrap_or(defaults.record_width),
                }))
            }
            BackendKind::Sqlite => raw
                .path
                .map(|path| Self::Sqlite { path })
                .ok_or_else(|| "sqlite backend requires `path`".to_string()),
        }
    }
}

impl RepositoryConfig {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Ram => BackendKind::Ram,
            Self::Slots(_) => BackendKind::Slots,
            Self::Sqlite { .. } => BackendKind::Sqlite,
        }
    }

    /// Parses configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Parse)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid repository config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

/// Reads and parses a JSON config file.
///
/// # Errors
/// - `Io` when the file cannot be read.
/// - `Parse` when the JSON is malformed or names an unknown backend.
pub fn load_config(path: impl AsRef<Path>) -> Result<RepositoryConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| {
        error!(
            "event=config_load module=config status=error error_code=config_read_failed path={}",
            path.display()
        );
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let config = RepositoryConfig::from_json(&text)?;
    info!(
        "event=config_load module=config status=ok backend={} path={}",
        config.kind(),
        path.display()
    );
    Ok(config)
}
