//! Config loading and persistence.
//!
//! Precedence, lowest first: built-in defaults, the TOML file, `CARRETERA_*`
//! environment variables, command-line flags ([`ConfigOverride`]).

mod load;
mod merge;
mod schema;

use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};

pub use load::{DEFAULT_CONFIG_FILE, load, load_from_path, load_unvalidated, write_config};
pub use merge::{apply_env_overrides, apply_env_overrides_from};
pub use schema::{
    ClockConfig, Config, ConfigOverride, FileLoggingConfig, LogFormat, LogRotation, LoggingConfig,
    TravelTicks, VehicleConfig,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn transience(&self) -> Transience {
        match self {
            ConfigError::Read { .. } | ConfigError::Write { .. } => Transience::Retryable,
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            ConfigError::Write { .. } => Effect::Unknown,
            _ => Effect::None,
        }
    }
}
