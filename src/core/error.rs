//! Highway contract errors.
//!
//! Lane unavailability is never an error: callers block instead. Everything
//! here is either a precondition violation by the caller or the server
//! strategy having gone away.

use thiserror::Error;

use super::identity::VehicleId;
use crate::error::{Effect, Transience};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HighwayError {
    #[error("vehicle `{0}` is not on the highway")]
    UnknownVehicle(VehicleId),

    #[error("vehicle `{0}` is already on the highway or waiting to enter")]
    AlreadyRegistered(VehicleId),

    #[error("vehicle `{vehicle}` is in the last segment ({segment}) and can only exit")]
    NoNextSegment { vehicle: VehicleId, segment: usize },

    #[error("vehicle `{0}` already has a request in flight")]
    RequestPending(VehicleId),

    #[error("highway needs at least one segment and one lane (got {segments}x{lanes})")]
    InvalidDimensions { segments: usize, lanes: usize },

    #[error("vehicle id `{raw}` is invalid: {reason}")]
    InvalidVehicleId { raw: String, reason: String },

    #[error("failed to start highway state thread: {0}")]
    StateThread(String),

    #[error("highway state thread has shut down")]
    Closed,
}

impl HighwayError {
    pub fn transience(&self) -> Transience {
        match self {
            HighwayError::Closed => Transience::Unknown,
            HighwayError::StateThread(_) => Transience::Retryable,
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            HighwayError::Closed => Effect::Unknown,
            _ => Effect::None,
        }
    }
}
