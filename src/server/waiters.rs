use std::collections::{BTreeMap, BTreeSet};

use super::Reply;
use super::state_loop::reply;
use crate::core::{HighwayError, HighwayState, VehicleId};

/// Blocked `circulate` calls, one per vehicle.
#[derive(Default)]
pub(super) struct CirculateWaiters {
    waiters: BTreeMap<VehicleId, Reply<()>>,
}

impl CirculateWaiters {
    /// Answer right away when the vehicle is unknown or already at 0 ticks,
    /// otherwise park the reply until a tick brings it there.
    pub(super) fn park<R>(
        &mut self,
        state: &HighwayState<R>,
        vehicle: VehicleId,
        respond: Reply<()>,
    ) {
        match state.remaining_ticks(&vehicle) {
            Err(err) => reply(respond, Err(err)),
            Ok(0) => reply(respond, Ok(())),
            Ok(_) if self.waiters.contains_key(&vehicle) => {
                reply(respond, Err(HighwayError::RequestPending(vehicle)));
            }
            Ok(remaining) => {
                tracing::debug!(remaining, "circulating");
                self.waiters.insert(vehicle, respond);
            }
        }
    }

    /// Release every waiter whose vehicle reached 0 ticks (or vanished).
    ///
    /// Each release is a rendezvous, so this returns only after every
    /// released caller has taken its answer.
    pub(super) fn flush<R>(&mut self, state: &HighwayState<R>) {
        let ready: Vec<VehicleId> = self
            .waiters
            .keys()
            .filter(|vehicle| !matches!(state.remaining_ticks(vehicle), Ok(remaining) if remaining > 0))
            .cloned()
            .collect();

        for vehicle in ready {
            if let Some(respond) = self.waiters.remove(&vehicle) {
                let result = state.remaining_ticks(&vehicle).map(|_| ());
                tracing::debug!(%vehicle, released = result.is_ok(), "circulate answered");
                reply(respond, result);
            }
        }
    }

    pub(super) fn vehicles(&self) -> BTreeSet<VehicleId> {
        self.waiters.keys().cloned().collect()
    }
}
