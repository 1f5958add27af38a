use crossbeam::channel::{Receiver, Select, TryRecvError};

use super::spans::request_span;
use super::waiters::CirculateWaiters;
use super::{
    AdvanceMessage, CirculateMessage, EnterMessage, ExitMessage, Reply, SnapshotMessage,
    TickMessage,
};
use crate::core::{Grant, HighwayError, HighwayState, Position};

/// One message taken off any of the input channels.
pub(super) enum Request {
    Enter(EnterMessage),
    Advance(AdvanceMessage),
    Circulate(CirculateMessage),
    Exit(ExitMessage),
    Tick(TickMessage),
    Snapshot(SnapshotMessage),
}

const KINDS: usize = 6;

/// The state thread's input channels plus the round-robin cursor.
pub(super) struct Receivers {
    enter: Receiver<EnterMessage>,
    advance: Receiver<AdvanceMessage>,
    circulate: Receiver<CirculateMessage>,
    exit: Receiver<ExitMessage>,
    tick: Receiver<TickMessage>,
    snapshot: Receiver<SnapshotMessage>,
    next: usize,
}

impl Receivers {
    pub(super) fn new(
        enter: Receiver<EnterMessage>,
        advance: Receiver<AdvanceMessage>,
        circulate: Receiver<CirculateMessage>,
        exit: Receiver<ExitMessage>,
        tick: Receiver<TickMessage>,
        snapshot: Receiver<SnapshotMessage>,
    ) -> Self {
        Self {
            enter,
            advance,
            circulate,
            exit,
            tick,
            snapshot,
            next: 0,
        }
    }

    /// Take the next message, or `None` once the handles are gone.
    ///
    /// Channel kinds are polled starting one past the kind served last, so
    /// a busy kind never starves another one that also has messages ready.
    /// When nothing is ready the thread parks on a `Select` until something is.
    pub(super) fn recv(&mut self) -> Option<Request> {
        loop {
            for offset in 0..KINDS {
                let kind = (self.next + offset) % KINDS;
                match self.try_take(kind) {
                    Ok(Some(request)) => {
                        self.next = (kind + 1) % KINDS;
                        return Some(request);
                    }
                    Ok(None) => {}
                    // Every sender lives in the same handle, so one
                    // disconnect means all of them.
                    Err(TryRecvError::Disconnected) => return None,
                    Err(TryRecvError::Empty) => {}
                }
            }

            let mut select = Select::new();
            select.recv(&self.enter);
            select.recv(&self.advance);
            select.recv(&self.circulate);
            select.recv(&self.exit);
            select.recv(&self.tick);
            select.recv(&self.snapshot);
            select.ready();
        }
    }

    fn try_take(&self, kind: usize) -> Result<Option<Request>, TryRecvError> {
        match kind {
            0 => take(&self.enter, Request::Enter),
            1 => take(&self.advance, Request::Advance),
            2 => take(&self.circulate, Request::Circulate),
            3 => take(&self.exit, Request::Exit),
            4 => take(&self.tick, Request::Tick),
            _ => take(&self.snapshot, Request::Snapshot),
        }
    }
}

fn take<M>(rx: &Receiver<M>, wrap: fn(M) -> Request) -> Result<Option<Request>, TryRecvError> {
    match rx.try_recv() {
        Ok(message) => Ok(Some(wrap(message))),
        Err(TryRecvError::Empty) => Ok(None),
        Err(TryRecvError::Disconnected) => Err(TryRecvError::Disconnected),
    }
}

/// Run the state thread loop.
///
/// This is THE serialization point - all state mutations go through here.
/// Messages are taken round-robin across the channel kinds (see
/// [`Receivers::recv`]).
///
/// After every message: one resolver sweep, then the circulate waiters are
/// flushed, then a pending tick is answered. The tick caller therefore
/// returns only after every circulate released by its tick took the release.
pub(super) fn run_state_loop(mut state: HighwayState<Reply<Position>>, mut rx: Receivers) {
    let mut circulate_waiters = CirculateWaiters::default();

    // Channel closed - every handle is gone
    while let Some(request) = rx.recv() {
        let mut tick_reply = None;

        match request {
            Request::Enter(EnterMessage {
                vehicle,
                travel_ticks,
                respond,
            }) => {
                let span = request_span("enter", &vehicle);
                let _guard = span.enter();
                match state.submit_enter(vehicle, travel_ticks, respond) {
                    Ok(segment) => tracing::debug!(segment, "enter queued"),
                    Err(refused) => reply(refused.reply, Err(refused.error)),
                }
            }

            Request::Advance(AdvanceMessage {
                vehicle,
                travel_ticks,
                respond,
            }) => {
                let span = request_span("advance", &vehicle);
                let _guard = span.enter();
                match state.submit_advance(vehicle, travel_ticks, respond) {
                    Ok(segment) => tracing::debug!(segment, "advance queued"),
                    Err(refused) => reply(refused.reply, Err(refused.error)),
                }
            }

            Request::Circulate(CirculateMessage { vehicle, respond }) => {
                let span = request_span("circulate", &vehicle);
                let _guard = span.enter();
                circulate_waiters.park(&state, vehicle, respond);
            }

            Request::Exit(ExitMessage { vehicle, respond }) => {
                let span = request_span("exit", &vehicle);
                let _guard = span.enter();
                let result = state.exit(&vehicle).map(|from| {
                    tracing::debug!(%from, "vehicle left the highway");
                });
                reply(respond, result);
            }

            Request::Tick(TickMessage { respond }) => {
                let ready = state.tick();
                tracing::trace!(ready = ready.len(), "tick");
                tick_reply = Some(respond);
            }

            Request::Snapshot(SnapshotMessage { respond }) => {
                let mut snapshot = state.snapshot();
                snapshot.circulating = circulate_waiters.vehicles();
                if respond.send(snapshot).is_err() {
                    tracing::warn!("caller dropped its snapshot channel before the answer");
                }
            }
        }

        deliver_grants(state.resolve());
        circulate_waiters.flush(&state);
        if let Some(respond) = tick_reply {
            reply(respond, Ok(()));
        }
    }
}

fn deliver_grants(grants: Vec<Grant<Reply<Position>>>) {
    for grant in grants {
        tracing::debug!(
            vehicle = %grant.vehicle,
            movement = ?grant.movement,
            position = %grant.position,
            "lane granted"
        );
        reply(grant.reply, Ok(grant.position));
    }
}

pub(super) fn reply<T>(respond: Reply<T>, result: Result<T, HighwayError>) {
    if respond.send(result).is_err() {
        tracing::warn!("caller dropped its reply channel before the answer");
    }
}
