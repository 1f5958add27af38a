//! Strategy A: a serialized server.
//!
//! Two kinds of threads:
//! - Callers - marshal each operation into a message, block on a private reply channel
//! - State thread - owns the `HighwayState`, processes messages one at a time
//!
//! The state thread is spawned by [`ServerHighway::new`] and exits once every
//! handle clone has been dropped.

mod spans;
mod state_loop;
mod waiters;

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{Receiver, Sender};

use crate::core::{HighwayConfig, HighwayError, HighwaySnapshot, HighwayState, Position, VehicleId};
use crate::highway::Highway;

use state_loop::{Receivers, run_state_loop};

/// Reply channel parked with a request until the state thread answers it.
pub(crate) type Reply<T> = Sender<Result<T, HighwayError>>;

pub(crate) struct EnterMessage {
    vehicle: VehicleId,
    travel_ticks: u32,
    respond: Reply<Position>,
}

pub(crate) struct AdvanceMessage {
    vehicle: VehicleId,
    travel_ticks: u32,
    respond: Reply<Position>,
}

/// `respond` is a zero-capacity channel: the state thread's send completes
/// only once the caller has taken the release.
pub(crate) struct CirculateMessage {
    vehicle: VehicleId,
    respond: Reply<()>,
}

pub(crate) struct ExitMessage {
    vehicle: VehicleId,
    respond: Reply<()>,
}

pub(crate) struct TickMessage {
    respond: Reply<()>,
}

pub(crate) struct SnapshotMessage {
    respond: Sender<HighwaySnapshot>,
}

/// Handle to a highway owned by a dedicated state thread.
///
/// Cheap to clone; all clones talk to the same state thread.
#[derive(Clone)]
pub struct ServerHighway {
    layout: HighwayConfig,
    inner: Arc<Inner>,
}

struct Inner {
    enter_tx: Sender<EnterMessage>,
    advance_tx: Sender<AdvanceMessage>,
    circulate_tx: Sender<CirculateMessage>,
    exit_tx: Sender<ExitMessage>,
    tick_tx: Sender<TickMessage>,
    snapshot_tx: Sender<SnapshotMessage>,
    // Declared last: fields drop in order, so the senders are gone (and the
    // loop has seen the disconnect) before the join.
    _state_thread: StateThread,
}

struct StateThread(Option<JoinHandle<()>>);

impl Drop for StateThread {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take()
            && handle.join().is_err()
        {
            tracing::error!("highway state thread panicked");
        }
    }
}

impl ServerHighway {
    pub fn new(layout: HighwayConfig) -> Result<Self, HighwayError> {
        let state = HighwayState::new(layout)?;

        let (enter_tx, enter_rx) = crossbeam::channel::unbounded();
        let (advance_tx, advance_rx) = crossbeam::channel::unbounded();
        let (circulate_tx, circulate_rx) = crossbeam::channel::unbounded();
        let (exit_tx, exit_rx) = crossbeam::channel::unbounded();
        let (tick_tx, tick_rx) = crossbeam::channel::unbounded();
        let (snapshot_tx, snapshot_rx) = crossbeam::channel::unbounded();
        let receivers = Receivers::new(
            enter_rx,
            advance_rx,
            circulate_rx,
            exit_rx,
            tick_rx,
            snapshot_rx,
        );

        let handle = std::thread::Builder::new()
            .name("carretera-state".into())
            .spawn(move || run_state_loop(state, receivers))
            .map_err(|e| HighwayError::StateThread(e.to_string()))?;
        tracing::debug!(
            segments = layout.segments,
            lanes = layout.lanes,
            "highway state thread started"
        );

        Ok(Self {
            layout,
            inner: Arc::new(Inner {
                enter_tx,
                advance_tx,
                circulate_tx,
                exit_tx,
                tick_tx,
                snapshot_tx,
                _state_thread: StateThread(Some(handle)),
            }),
        })
    }

    fn call<M, T>(
        tx: &Sender<M>,
        response: Receiver<Result<T, HighwayError>>,
        message: M,
    ) -> Result<T, HighwayError> {
        tx.send(message).map_err(|_| HighwayError::Closed)?;
        response.recv().map_err(|_| HighwayError::Closed)?
    }
}

impl Highway for ServerHighway {
    fn layout(&self) -> HighwayConfig {
        self.layout
    }

    fn enter(&self, vehicle: &VehicleId, travel_ticks: u32) -> Result<Position, HighwayError> {
        let (respond, response) = crossbeam::channel::bounded(1);
        let message = EnterMessage {
            vehicle: vehicle.clone(),
            travel_ticks,
            respond,
        };
        Self::call(&self.inner.enter_tx, response, message)
    }

    fn advance(&self, vehicle: &VehicleId, travel_ticks: u32) -> Result<Position, HighwayError> {
        let (respond, response) = crossbeam::channel::bounded(1);
        let message = AdvanceMessage {
            vehicle: vehicle.clone(),
            travel_ticks,
            respond,
        };
        Self::call(&self.inner.advance_tx, response, message)
    }

    fn circulate(&self, vehicle: &VehicleId) -> Result<(), HighwayError> {
        let (respond, response) = crossbeam::channel::bounded(0);
        let message = CirculateMessage {
            vehicle: vehicle.clone(),
            respond,
        };
        Self::call(&self.inner.circulate_tx, response, message)
    }

    fn exit(&self, vehicle: &VehicleId) -> Result<(), HighwayError> {
        let (respond, response) = crossbeam::channel::bounded(1);
        let message = ExitMessage {
            vehicle: vehicle.clone(),
            respond,
        };
        Self::call(&self.inner.exit_tx, response, message)
    }

    fn tick(&self) -> Result<(), HighwayError> {
        let (respond, response) = crossbeam::channel::bounded(1);
        Self::call(&self.inner.tick_tx, response, TickMessage { respond })
    }

    fn snapshot(&self) -> Result<HighwaySnapshot, HighwayError> {
        let (respond, response) = crossbeam::channel::bounded(1);
        self.inner
            .snapshot_tx
            .send(SnapshotMessage { respond })
            .map_err(|_| HighwayError::Closed)?;
        response.recv().map_err(|_| HighwayError::Closed)
    }
}

#[cfg(test)]
mod tests;
