use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::HighwayError;

/// A cell of the highway. Both coordinates are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub segment: usize,
    pub lane: usize,
}

impl Position {
    pub const fn new(segment: usize, lane: usize) -> Self {
        Self { segment, lane }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}/c{}", self.segment, self.lane)
    }
}

/// Highway dimensions. Fixed for the lifetime of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighwayConfig {
    pub segments: usize,
    pub lanes: usize,
}

impl HighwayConfig {
    pub fn new(segments: usize, lanes: usize) -> Result<Self, HighwayError> {
        let config = Self { segments, lanes };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HighwayError> {
        if self.segments == 0 || self.lanes == 0 {
            return Err(HighwayError::InvalidDimensions {
                segments: self.segments,
                lanes: self.lanes,
            });
        }
        Ok(())
    }

    pub fn contains(&self, position: Position) -> bool {
        (1..=self.segments).contains(&position.segment) && (1..=self.lanes).contains(&position.lane)
    }

    pub fn is_last_segment(&self, segment: usize) -> bool {
        segment == self.segments
    }
}

impl Default for HighwayConfig {
    fn default() -> Self {
        Self {
            segments: 3,
            lanes: 2,
        }
    }
}
