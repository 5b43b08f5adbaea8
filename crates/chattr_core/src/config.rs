//! Core configuration.
//!
//! # Responsibility
//! - Describe where store files live and the tunables of the chat feed.
//! - Load settings from an optional JSON document with defaults for every
//!   omitted key.
//!
//! # Invariants
//! - `validate()` must pass before a config is used to open stores.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DECISIONS_FILE: &str = "decisions.json";
pub const DEFAULT_MESSAGES_FILE: &str = "messages.json";
pub const DEFAULT_PRESENCE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_READ_LIMIT: usize = 20;
pub const DEFAULT_RESYNC_LIMIT: usize = 50;
pub const LOG_DIR_NAME: &str = "logs";

/// Settings for one application context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Directory holding every store file.
    pub data_dir: PathBuf,
    pub decisions_file: String,
    pub messages_file: String,
    /// Seconds after the last activity before a name counts as offline.
    pub presence_timeout_secs: u64,
    /// Page size for cursor reads when the caller gives none.
    pub default_read_limit: usize,
    /// Page size for resync when the caller gives none.
    pub resync_limit: usize,
    /// Level passed to `init_logging`.
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            decisions_file: DEFAULT_DECISIONS_FILE.to_string(),
            messages_file: DEFAULT_MESSAGES_FILE.to_string(),
            presence_timeout_secs: DEFAULT_PRESENCE_TIMEOUT_SECS,
            default_read_limit: DEFAULT_READ_LIMIT,
            resync_limit: DEFAULT_RESYNC_LIMIT,
            log_level: crate::logging::default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    /// Default settings rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Reads a JSON config file. Missing keys take default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn decisions_path(&self) -> PathBuf {
        self.data_dir.join(&self.decisions_file)
    }

    pub fn messages_path(&self) -> PathBuf {
        self.data_dir.join(&self.messages_file)
    }

    /// Absolute directory for rolling log files, `<data_dir>/logs`.
    ///
    /// A relative `data_dir` is resolved against the working directory.
    pub fn log_dir(&self) -> io::Result<PathBuf> {
        let dir = self.data_dir.join(LOG_DIR_NAME);
        if dir.is_absolute() {
            Ok(dir)
        } else {
            Ok(std::env::current_dir()?.join(dir))
        }
    }

    pub fn presence_timeout(&self) -> Duration {
        Duration::from_secs(self.presence_timeout_secs)
    }

    /// Rejects settings that cannot produce a working context.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decisions_file.trim().is_empty() {
            return Err(ConfigError::Invalid("decisions_file cannot be empty"));
        }
        if self.messages_file.trim().is_empty() {
            return Err(ConfigError::Invalid("messages_file cannot be empty"));
        }
        if self.decisions_file == self.messages_file {
            return Err(ConfigError::Invalid(
                "decisions_file and messages_file must differ",
            ));
        }
        if self.default_read_limit == 0 {
            return Err(ConfigError::Invalid("default_read_limit must be positive"));
        }
        if self.resync_limit == 0 {
            return Err(ConfigError::Invalid("resync_limit must be positive"));
        }
        if crate::logging::parse_level(&self.log_level).is_err() {
            return Err(ConfigError::Invalid(
                "log_level must be one of trace|debug|info|warn|error",
            ));
        }
        Ok(())
    }
}

/// Config loading failure.
#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: io::Error },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}
