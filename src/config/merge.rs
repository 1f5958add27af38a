use std::str::FromStr;

use super::Config;
use crate::highway::Strategy;

pub const ENV_SEGMENTS: &str = "CARRETERA_SEGMENTS";
pub const ENV_LANES: &str = "CARRETERA_LANES";
pub const ENV_STRATEGY: &str = "CARRETERA_STRATEGY";
pub const ENV_TICK_MS: &str = "CARRETERA_TICK_MS";

pub fn apply_env_overrides(config: &mut Config) {
    apply_env_overrides_from(config, |key| std::env::var(key).ok());
}

/// Same as [`apply_env_overrides`], reading variables through `lookup`.
pub fn apply_env_overrides_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(value) = parse_var::<usize>(&lookup, ENV_SEGMENTS) {
        config.highway.segments = value;
    }
    if let Some(value) = parse_var::<usize>(&lookup, ENV_LANES) {
        config.highway.lanes = value;
    }
    if let Some(value) = parse_var::<Strategy>(&lookup, ENV_STRATEGY) {
        config.strategy = value;
    }
    if let Some(value) = parse_var::<u64>(&lookup, ENV_TICK_MS) {
        config.clock.tick_interval_ms = value;
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("invalid {key}, ignoring: {err}");
            None
        }
    }
}
