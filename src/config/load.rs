use std::fs;
use std::path::Path;

use super::merge::apply_env_overrides;
use super::{Config, ConfigError};

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "carretera.toml";

pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the effective config: the file (explicit, or `carretera.toml` if
/// present), then env overrides. The result is validated.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config = load_unvalidated(path)?;
    config.validate()?;
    Ok(config)
}

/// Same layers as [`load`] without the final validation, for callers that
/// still have command-line overrides to apply on top.
pub fn load_unvalidated(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => load_from_path(path)?,
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.exists() {
                load_from_path(fallback)?
            } else {
                tracing::debug!("no {DEFAULT_CONFIG_FILE}, using defaults");
                Config::default()
            }
        }
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn write_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let contents = toml::to_string_pretty(cfg)?;
    atomic_write(path, contents.as_bytes())
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let temp = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    fs::write(temp.path(), data).map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}
