use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::{HighwayConfig, VehicleId};
use crate::highway::Strategy;
use crate::sim::{SimPlan, VehiclePlan};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub highway: HighwayConfig,
    pub strategy: Strategy,
    pub clock: ClockConfig,
    pub vehicles: Vec<VehicleConfig>,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            highway: HighwayConfig::default(),
            strategy: Strategy::default(),
            clock: ClockConfig::default(),
            vehicles: (1..=4)
                .filter_map(|n| VehicleId::new(format!("car-{n}")).ok())
                .map(|id| VehicleConfig {
                    id,
                    ticks_per_segment: TravelTicks::Uniform(2),
                })
                .collect(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.highway
            .validate()
            .map_err(|e| ConfigError::invalid("highway", e.to_string()))?;
        let mut seen = BTreeSet::new();
        for vehicle in &self.vehicles {
            if !seen.insert(&vehicle.id) {
                return Err(ConfigError::invalid(
                    "vehicles",
                    format!("vehicle `{}` listed twice", vehicle.id),
                ));
            }
            vehicle.ticks_per_segment.expand(self.highway.segments).map_err(|reason| {
                ConfigError::invalid(format!("vehicles.{}.ticks_per_segment", vehicle.id), reason)
            })?;
        }
        Ok(())
    }

    /// Turn the vehicle list into a simulation plan.
    pub fn to_plan(&self) -> Result<SimPlan, ConfigError> {
        self.validate()?;
        let vehicles = self
            .vehicles
            .iter()
            .map(|vehicle| {
                let ticks_per_segment = vehicle
                    .ticks_per_segment
                    .expand(self.highway.segments)
                    .map_err(|reason| ConfigError::invalid("vehicles", reason))?;
                Ok(VehiclePlan {
                    id: vehicle.id.clone(),
                    ticks_per_segment,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(SimPlan {
            vehicles,
            tick_interval: self.clock.tick_interval(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub tick_interval_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
        }
    }
}

impl ClockConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleConfig {
    pub id: VehicleId,
    pub ticks_per_segment: TravelTicks,
}

/// Travel ticks per segment: one value for every segment, or one per segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TravelTicks {
    Uniform(u32),
    PerSegment(Vec<u32>),
}

impl TravelTicks {
    pub fn expand(&self, segments: usize) -> Result<Vec<u32>, String> {
        match self {
            TravelTicks::Uniform(ticks) => Ok(vec![*ticks; segments]),
            TravelTicks::PerSegment(ticks) if ticks.len() == segments => Ok(ticks.clone()),
            TravelTicks::PerSegment(ticks) => Err(format!(
                "expected {segments} entries, got {}",
                ticks.len()
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Tree,
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    Daily,
    Hourly,
    Minutely,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stdout: bool,
    pub stdout_format: LogFormat,
    pub filter: Option<String>,
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            stdout_format: LogFormat::Tree,
            filter: None,
            file: FileLoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub rotation: LogRotation,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            format: LogFormat::Json,
            rotation: LogRotation::Daily,
        }
    }
}

/// Values given on the command line; `None` keeps what the file/env set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverride {
    pub segments: Option<usize>,
    pub lanes: Option<usize>,
    pub strategy: Option<Strategy>,
    pub tick_interval_ms: Option<u64>,
}

impl ConfigOverride {
    pub fn apply_to(&self, target: &mut Config) {
        if let Some(segments) = self.segments {
            target.highway.segments = segments;
        }
        if let Some(lanes) = self.lanes {
            target.highway.lanes = lanes;
        }
        if let Some(strategy) = self.strategy {
            target.strategy = strategy;
        }
        if let Some(ms) = self.tick_interval_ms {
            target.clock.tick_interval_ms = ms;
        }
    }
}
