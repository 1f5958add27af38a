use std::collections::{BTreeMap, BTreeSet};

use super::identity::VehicleId;
use super::occupancy::Occupancy;
use super::position::{HighwayConfig, Position};
use super::registry::VehicleState;

/// Point-in-time copy of the resource, taken inside its critical region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighwaySnapshot {
    pub layout: HighwayConfig,
    pub vehicles: BTreeMap<VehicleId, VehicleState>,
    pub occupancy: Occupancy,
    /// Ids waiting for a lane, indexed by target segment - 1, oldest first.
    pub waiting: Vec<Vec<VehicleId>>,
    /// Vehicles with a blocked `circulate` call.
    pub circulating: BTreeSet<VehicleId>,
}

impl HighwaySnapshot {
    pub fn position_of(&self, vehicle: &VehicleId) -> Option<Position> {
        self.vehicles.get(vehicle).map(|state| state.position)
    }

    pub fn remaining_ticks(&self, vehicle: &VehicleId) -> Option<u32> {
        self.vehicles.get(vehicle).map(|state| state.remaining_ticks)
    }

    pub fn occupant(&self, position: Position) -> Option<&VehicleId> {
        self.vehicles
            .iter()
            .find(|(_, state)| state.position == position)
            .map(|(id, _)| id)
    }

    pub fn waiting_for(&self, target_segment: usize) -> &[VehicleId] {
        self.waiting
            .get(target_segment.wrapping_sub(1))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_waiting(&self, vehicle: &VehicleId) -> bool {
        self.waiting.iter().flatten().any(|id| id == vehicle)
    }

    /// Free lanes of `segment`, ascending. Empty for a segment that does
    /// not exist.
    pub fn free_lanes(&self, segment: usize) -> Vec<usize> {
        if !(1..=self.layout.segments).contains(&segment) {
            return Vec::new();
        }
        self.occupancy.free_lanes(segment)
    }
}
