//! Per-vehicle state: where it is and how long it still has to circulate.

use std::collections::BTreeMap;

use super::identity::VehicleId;
use super::position::Position;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VehicleState {
    pub position: Position,
    /// Ticks left before the vehicle may advance or exit.
    pub remaining_ticks: u32,
}

impl VehicleState {
    pub fn new(position: Position, remaining_ticks: u32) -> Self {
        Self {
            position,
            remaining_ticks,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.remaining_ticks == 0
    }

    /// Consume one tick. Returns true when this tick brought the counter to 0.
    fn tick(&mut self) -> bool {
        if self.remaining_ticks == 0 {
            return false;
        }
        self.remaining_ticks -= 1;
        self.remaining_ticks == 0
    }
}

/// Registered vehicles, ordered by id so iteration (and snapshots) are stable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registry {
    vehicles: BTreeMap<VehicleId, VehicleState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &VehicleId) -> bool {
        self.vehicles.contains_key(id)
    }

    pub fn get(&self, id: &VehicleId) -> Option<&VehicleState> {
        self.vehicles.get(id)
    }

    pub fn get_mut(&mut self, id: &VehicleId) -> Option<&mut VehicleState> {
        self.vehicles.get_mut(id)
    }

    pub fn insert(&mut self, id: VehicleId, state: VehicleState) {
        let previous = self.vehicles.insert(id, state);
        assert!(previous.is_none(), "vehicle registered twice");
    }

    pub fn remove(&mut self, id: &VehicleId) -> Option<VehicleState> {
        self.vehicles.remove(id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VehicleId, &VehicleState)> {
        self.vehicles.iter()
    }

    /// Decrement every non-zero counter. Returns the vehicles that reached 0.
    pub fn tick_all(&mut self) -> Vec<VehicleId> {
        self.vehicles
            .iter_mut()
            .filter_map(|(id, state)| state.tick().then(|| id.clone()))
            .collect()
    }
}
