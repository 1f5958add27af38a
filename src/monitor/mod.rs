//! Strategy B: a monitor.
//!
//! One mutex guards the whole [`HighwayState`]. Blocked callers wait on
//! conditions tied to what they wait for:
//! - one condition per segment, for `enter`/`advance` waiting for a lane
//! - one condition per vehicle, for `circulate` waiting for its ticks
//! - one tick condition, for `tick` waiting for released callers to resume
//!
//! Every waiter re-checks its own predicate after waking, so spurious and
//! broadcast wake-ups are harmless.

mod circulation;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::core::{
    HighwayConfig, HighwayError, HighwaySnapshot, HighwayState, Movement, Position, VehicleId,
};
use crate::highway::Highway;

use circulation::Circulation;

/// Identifies one deferred `enter`/`advance` call inside the monitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Ticket(u64);

#[derive(Debug)]
struct MonitorState {
    highway: HighwayState<Ticket>,
    /// Positions granted by the resolver, waiting to be picked up.
    granted: HashMap<Ticket, Position>,
    next_ticket: u64,
    circulation: Circulation,
    /// Released `circulate` calls that have not resumed yet.
    pending_acks: usize,
}

impl MonitorState {
    fn issue_ticket(&mut self) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }
}

pub struct MonitorHighway {
    layout: HighwayConfig,
    state: Mutex<MonitorState>,
    /// Indexed by target segment - 1.
    segments: Vec<Condvar>,
    tick_done: Condvar,
}

impl MonitorHighway {
    pub fn new(layout: HighwayConfig) -> Result<Self, HighwayError> {
        let highway = HighwayState::new(layout)?;
        Ok(Self {
            layout,
            state: Mutex::new(MonitorState {
                highway,
                granted: HashMap::new(),
                next_ticket: 0,
                circulation: Circulation::default(),
                pending_acks: 0,
            }),
            segments: (0..layout.segments).map(|_| Condvar::new()).collect(),
            tick_done: Condvar::new(),
        })
    }

    fn segment_condition(&self, target_segment: usize) -> &Condvar {
        &self.segments[target_segment - 1]
    }

    /// Serve whatever the last state change made possible and wake the
    /// segments that received a lane.
    fn resolve_locked(&self, state: &mut MonitorState) {
        for grant in state.highway.resolve() {
            let target = grant.position.segment;
            tracing::debug!(
                vehicle = %grant.vehicle,
                movement = ?grant.movement,
                position = %grant.position,
                "lane granted"
            );
            if grant.movement == Movement::Enter {
                state.circulation.admit(grant.vehicle);
            }
            state.granted.insert(grant.reply, grant.position);
            self.segment_condition(target).notify_all();
        }
    }

    fn await_grant(
        &self,
        mut state: MutexGuard<'_, MonitorState>,
        ticket: Ticket,
        target_segment: usize,
    ) -> Position {
        loop {
            if let Some(position) = state.granted.remove(&ticket) {
                return position;
            }
            self.segment_condition(target_segment).wait(&mut state);
        }
    }
}

impl Highway for MonitorHighway {
    fn layout(&self) -> HighwayConfig {
        self.layout
    }

    fn enter(&self, vehicle: &VehicleId, travel_ticks: u32) -> Result<Position, HighwayError> {
        let span = tracing::debug_span!("highway_request", op = "enter", vehicle = %vehicle);
        let _guard = span.enter();

        let mut state = self.state.lock();
        let ticket = state.issue_ticket();
        let target = state
            .highway
            .submit_enter(vehicle.clone(), travel_ticks, ticket)
            .map_err(|refused| refused.error)?;
        self.resolve_locked(&mut state);
        Ok(self.await_grant(state, ticket, target))
    }

    fn advance(&self, vehicle: &VehicleId, travel_ticks: u32) -> Result<Position, HighwayError> {
        let span = tracing::debug_span!("highway_request", op = "advance", vehicle = %vehicle);
        let _guard = span.enter();

        let mut state = self.state.lock();
        let ticket = state.issue_ticket();
        let target = state
            .highway
            .submit_advance(vehicle.clone(), travel_ticks, ticket)
            .map_err(|refused| refused.error)?;
        self.resolve_locked(&mut state);
        Ok(self.await_grant(state, ticket, target))
    }

    fn circulate(&self, vehicle: &VehicleId) -> Result<(), HighwayError> {
        let mut state = self.state.lock();
        if state.highway.remaining_ticks(vehicle)? == 0 {
            return Ok(());
        }
        let slot = state
            .circulation
            .get_mut(vehicle)
            .ok_or_else(|| HighwayError::UnknownVehicle(vehicle.clone()))?;
        if slot.waiting {
            return Err(HighwayError::RequestPending(vehicle.clone()));
        }
        slot.waiting = true;
        slot.released = false;
        let ready = Arc::clone(&slot.ready);

        loop {
            match state.circulation.get_mut(vehicle) {
                Some(slot) if Arc::ptr_eq(&slot.ready, &ready) => {
                    if slot.released {
                        slot.waiting = false;
                        slot.released = false;
                        break;
                    }
                }
                // Exited while we waited; exit already settled the ack.
                _ => return Err(HighwayError::UnknownVehicle(vehicle.clone())),
            }
            ready.wait(&mut state);
        }

        state.pending_acks = state.pending_acks.saturating_sub(1);
        self.tick_done.notify_all();
        Ok(())
    }

    fn exit(&self, vehicle: &VehicleId) -> Result<(), HighwayError> {
        let mut state = self.state.lock();
        let from = state.highway.exit(vehicle)?;
        tracing::debug!(%vehicle, %from, "vehicle left the highway");

        if let Some(slot) = state.circulation.remove(vehicle)
            && slot.waiting
        {
            if slot.released {
                state.pending_acks = state.pending_acks.saturating_sub(1);
                self.tick_done.notify_all();
            }
            slot.ready.notify_all();
        }
        self.resolve_locked(&mut state);
        Ok(())
    }

    fn tick(&self) -> Result<(), HighwayError> {
        let mut state = self.state.lock();
        let reached = state.highway.tick();
        let released = state.circulation.release(&reached);
        state.pending_acks += released;
        tracing::trace!(ready = reached.len(), released, "tick");

        while state.pending_acks > 0 {
            self.tick_done.wait(&mut state);
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<HighwaySnapshot, HighwayError> {
        let state = self.state.lock();
        let mut snapshot = state.highway.snapshot();
        snapshot.circulating = state.circulation.blocked();
        Ok(snapshot)
    }
}
