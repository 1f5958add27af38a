#![forbid(unsafe_code)]

//! A shared highway resource: vehicles enter, advance segment by segment,
//! circulate out their travel time and exit, while an external clock ticks.
//!
//! The contract lives in [`Highway`]. Two interchangeable implementations:
//! - [`ServerHighway`]: one state thread reached over typed channels
//! - [`MonitorHighway`]: one mutex plus per-segment / per-vehicle conditions
//!
//! Both drive the same state machine in [`core`].

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod highway;
pub mod monitor;
pub mod server;
pub mod sim;
pub mod telemetry;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::core::{
    HighwayConfig, HighwayError, HighwaySnapshot, Movement, Occupancy, Position, VehicleId,
    VehicleState,
};
pub use crate::highway::{Highway, Strategy, build};
pub use crate::monitor::MonitorHighway;
pub use crate::server::ServerHighway;
