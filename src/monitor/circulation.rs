//! Per-vehicle circulation slots for the monitor.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Condvar;

use crate::core::VehicleId;

/// One vehicle's circulate condition.
///
/// `waiting` is set while a `circulate` call is blocked on `ready`; a tick
/// flips `released` and the waiter clears both when it takes the release.
#[derive(Debug)]
pub(super) struct Slot {
    pub(super) ready: Arc<Condvar>,
    pub(super) waiting: bool,
    pub(super) released: bool,
}

impl Slot {
    fn new() -> Self {
        Self {
            ready: Arc::new(Condvar::new()),
            waiting: false,
            released: false,
        }
    }

    pub(super) fn is_blocked(&self) -> bool {
        self.waiting && !self.released
    }
}

/// Slots for every vehicle currently on the highway.
#[derive(Debug, Default)]
pub(super) struct Circulation {
    slots: HashMap<VehicleId, Slot>,
}

impl Circulation {
    pub(super) fn admit(&mut self, vehicle: VehicleId) {
        self.slots.insert(vehicle, Slot::new());
    }

    pub(super) fn get_mut(&mut self, vehicle: &VehicleId) -> Option<&mut Slot> {
        self.slots.get_mut(vehicle)
    }

    pub(super) fn remove(&mut self, vehicle: &VehicleId) -> Option<Slot> {
        self.slots.remove(vehicle)
    }

    /// Release the blocked waiters among `reached`. Returns how many were woken.
    pub(super) fn release(&mut self, reached: &[VehicleId]) -> usize {
        let mut woken = 0;
        for vehicle in reached {
            if let Some(slot) = self.slots.get_mut(vehicle)
                && slot.is_blocked()
            {
                slot.released = true;
                slot.ready.notify_one();
                woken += 1;
            }
        }
        woken
    }

    pub(super) fn blocked(&self) -> BTreeSet<VehicleId> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.is_blocked())
            .map(|(vehicle, _)| vehicle.clone())
            .collect()
    }
}
