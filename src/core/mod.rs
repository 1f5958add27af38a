//! Highway state machine shared by both synchronization strategies.
//!
//! Module hierarchy follows type dependency order:
//! - identity: VehicleId
//! - position: Position, HighwayConfig
//! - occupancy: segment x lane grid, free-lane lookup
//! - registry: per-vehicle position + remaining ticks
//! - request: deferred enter/advance requests, per-segment FIFO queues
//! - state: HighwayState transitions and the cascading resolver
//! - snapshot: read-only view handed to drivers and tests
//!
//! Nothing here blocks or locks. The strategies in `server` and `monitor`
//! own the synchronization and deliver the grants this module produces.

pub mod error;
pub mod identity;
pub mod occupancy;
pub mod position;
pub mod registry;
pub mod request;
pub mod snapshot;
pub mod state;

pub use error::HighwayError;
pub use identity::VehicleId;
pub use occupancy::Occupancy;
pub use position::{HighwayConfig, Position};
pub use registry::{Registry, VehicleState};
pub use request::{Deferred, DeferredQueues, Grant, Movement};
pub use snapshot::HighwaySnapshot;
pub use state::{HighwayState, Refused};
