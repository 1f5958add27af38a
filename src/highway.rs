//! The highway contract shared by both synchronization strategies.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{HighwayConfig, HighwayError, HighwaySnapshot, Position, VehicleId};
use crate::monitor::MonitorHighway;
use crate::server::ServerHighway;

/// A shared highway.
///
/// Lifecycle expected from a vehicle's owner: `enter` once, then
/// `circulate`/`advance` per segment, then `circulate` and `exit` once.
/// `tick` is called by an independent clock driver. Only one call per
/// vehicle may be in flight at a time.
///
/// `enter` and `advance` block while the target segment is full; nothing
/// times out.
pub trait Highway: Send + Sync {
    fn layout(&self) -> HighwayConfig;

    /// Take a lane in segment 1. Blocks until one is granted.
    fn enter(&self, vehicle: &VehicleId, travel_ticks: u32) -> Result<Position, HighwayError>;

    /// Move to the next segment, resetting the travel ticks. Blocks until a
    /// lane there is granted.
    fn advance(&self, vehicle: &VehicleId, travel_ticks: u32) -> Result<Position, HighwayError>;

    /// Wait until the vehicle's remaining ticks reach 0.
    fn circulate(&self, vehicle: &VehicleId) -> Result<(), HighwayError>;

    /// Leave the highway. Never blocks.
    fn exit(&self, vehicle: &VehicleId) -> Result<(), HighwayError>;

    /// Advance simulated time by one tick for every vehicle.
    ///
    /// Returns once every `circulate` call released by this tick has
    /// acknowledged the release.
    fn tick(&self) -> Result<(), HighwayError>;

    fn snapshot(&self) -> Result<HighwaySnapshot, HighwayError>;
}

impl<H: Highway + ?Sized> Highway for Arc<H> {
    fn layout(&self) -> HighwayConfig {
        (**self).layout()
    }

    fn enter(&self, vehicle: &VehicleId, travel_ticks: u32) -> Result<Position, HighwayError> {
        (**self).enter(vehicle, travel_ticks)
    }

    fn advance(&self, vehicle: &VehicleId, travel_ticks: u32) -> Result<Position, HighwayError> {
        (**self).advance(vehicle, travel_ticks)
    }

    fn circulate(&self, vehicle: &VehicleId) -> Result<(), HighwayError> {
        (**self).circulate(vehicle)
    }

    fn exit(&self, vehicle: &VehicleId) -> Result<(), HighwayError> {
        (**self).exit(vehicle)
    }

    fn tick(&self) -> Result<(), HighwayError> {
        (**self).tick()
    }

    fn snapshot(&self) -> Result<HighwaySnapshot, HighwayError> {
        (**self).snapshot()
    }
}

/// Which synchronization discipline backs the highway.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One state thread, reached over channels.
    #[default]
    Server,
    /// Shared state behind a mutex with condition variables.
    Monitor,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Server, Strategy::Monitor];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Server => "server",
            Strategy::Monitor => "monitor",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "server" | "csp" | "actor" => Ok(Strategy::Server),
            "monitor" => Ok(Strategy::Monitor),
            other => Err(format!(
                "unknown strategy `{other}` (expected `server` or `monitor`)"
            )),
        }
    }
}

/// Build a highway of the given dimensions backed by `strategy`.
pub fn build(strategy: Strategy, layout: HighwayConfig) -> Result<Arc<dyn Highway>, HighwayError> {
    Ok(match strategy {
        Strategy::Server => Arc::new(ServerHighway::new(layout)?),
        Strategy::Monitor => Arc::new(MonitorHighway::new(layout)?),
    })
}
