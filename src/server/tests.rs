use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::state_loop::{Receivers, Request};
use super::waiters::CirculateWaiters;
use super::{CirculateMessage, EnterMessage, ServerHighway, SnapshotMessage, TickMessage};
use crate::core::{HighwayConfig, HighwayError, HighwayState, Position, VehicleId};
use crate::highway::Highway;

fn id(s: &str) -> VehicleId {
    VehicleId::new(s).unwrap()
}

fn server(segments: usize, lanes: usize) -> ServerHighway {
    ServerHighway::new(HighwayConfig::new(segments, lanes).unwrap()).unwrap()
}

fn wait_until(what: &str, mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(2));
    }
}

fn entered(state: &mut HighwayState<()>, name: &str, ticks: u32) {
    state.submit_enter(id(name), ticks, ()).unwrap();
    assert_eq!(state.resolve().len(), 1);
}

#[test]
fn waiter_for_ready_vehicle_is_answered_immediately() {
    let mut state = HighwayState::new(HighwayConfig::new(1, 1).unwrap()).unwrap();
    entered(&mut state, "a", 0);
    let mut waiters = CirculateWaiters::default();

    let (tx, rx) = crossbeam::channel::bounded(1);
    waiters.park(&state, id("a"), tx);
    assert_eq!(rx.try_recv().unwrap(), Ok(()));
    assert!(waiters.vehicles().is_empty());
}

#[test]
fn waiter_is_released_by_flush_once_ticks_run_out() {
    let mut state = HighwayState::new(HighwayConfig::new(1, 1).unwrap()).unwrap();
    entered(&mut state, "a", 2);
    let mut waiters = CirculateWaiters::default();

    let (tx, rx) = crossbeam::channel::bounded(1);
    waiters.park(&state, id("a"), tx);
    assert!(waiters.vehicles().contains(&id("a")));

    state.tick();
    waiters.flush(&state);
    assert!(rx.try_recv().is_err());

    state.tick();
    waiters.flush(&state);
    assert_eq!(rx.try_recv().unwrap(), Ok(()));
    assert!(waiters.vehicles().is_empty());
}

#[test]
fn second_waiter_for_the_same_vehicle_is_refused() {
    let mut state = HighwayState::new(HighwayConfig::new(1, 1).unwrap()).unwrap();
    entered(&mut state, "a", 1);
    let mut waiters = CirculateWaiters::default();

    let (first, _first_rx) = crossbeam::channel::bounded(1);
    waiters.park(&state, id("a"), first);
    let (second, second_rx) = crossbeam::channel::bounded(1);
    waiters.park(&state, id("a"), second);
    assert_eq!(
        second_rx.try_recv().unwrap(),
        Err(HighwayError::RequestPending(id("a")))
    );
}

#[test]
fn waiter_for_unknown_vehicle_gets_an_error() {
    let state: HighwayState<()> = HighwayState::new(HighwayConfig::new(1, 1).unwrap()).unwrap();
    let mut waiters = CirculateWaiters::default();
    let (tx, rx) = crossbeam::channel::bounded(1);
    waiters.park(&state, id("ghost"), tx);
    assert_eq!(
        rx.try_recv().unwrap(),
        Err(HighwayError::UnknownVehicle(id("ghost")))
    );
}

#[test]
fn precondition_errors_travel_back_over_the_reply_channel() {
    let highway = server(2, 1);
    assert_eq!(
        highway.advance(&id("ghost"), 1),
        Err(HighwayError::UnknownVehicle(id("ghost")))
    );
    assert_eq!(
        highway.exit(&id("ghost")),
        Err(HighwayError::UnknownVehicle(id("ghost")))
    );
    assert_eq!(highway.enter(&id("a"), 0), Ok(Position::new(1, 1)));
    assert_eq!(
        highway.enter(&id("a"), 0),
        Err(HighwayError::AlreadyRegistered(id("a")))
    );
    assert_eq!(highway.advance(&id("a"), 0), Ok(Position::new(2, 1)));
    assert_eq!(
        highway.advance(&id("a"), 0),
        Err(HighwayError::NoNextSegment {
            vehicle: id("a"),
            segment: 2
        })
    );
}

#[test]
fn blocked_enter_is_visible_in_snapshot_and_released_by_exit() {
    let highway = Arc::new(server(1, 1));
    highway.enter(&id("a"), 0).unwrap();

    let waiter = {
        let highway = Arc::clone(&highway);
        thread::spawn(move || highway.enter(&id("b"), 0))
    };
    wait_until("b to queue", || {
        highway.snapshot().unwrap().is_waiting(&id("b"))
    });

    highway.exit(&id("a")).unwrap();
    assert_eq!(waiter.join().unwrap(), Ok(Position::new(1, 1)));
}

#[test]
fn tick_returns_after_released_circulate_acknowledged() {
    let highway = Arc::new(server(1, 1));
    highway.enter(&id("a"), 1).unwrap();

    let (done_tx, done_rx) = crossbeam::channel::bounded(1);
    let circulating = {
        let highway = Arc::clone(&highway);
        thread::spawn(move || {
            let result = highway.circulate(&id("a"));
            done_tx.send(()).unwrap();
            result
        })
    };
    wait_until("a to circulate", || {
        highway.snapshot().unwrap().circulating.contains(&id("a"))
    });

    highway.tick().unwrap();
    assert_eq!(highway.snapshot().unwrap().remaining_ticks(&id("a")), Some(0));
    assert!(highway.snapshot().unwrap().circulating.is_empty());
    done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(circulating.join().unwrap(), Ok(()));
}

#[test]
fn tick_waits_for_circulate_caller_to_take_its_release() {
    let highway = Arc::new(server(1, 1));
    highway.enter(&id("a"), 1).unwrap();

    // A circulate whose caller has sent the request but not yet started
    // receiving the answer.
    let (respond, response) = crossbeam::channel::bounded(0);
    highway
        .inner
        .circulate_tx
        .send(CirculateMessage {
            vehicle: id("a"),
            respond,
        })
        .unwrap();
    wait_until("a to circulate", || {
        highway.snapshot().unwrap().circulating.contains(&id("a"))
    });

    let (ticked_tx, ticked_rx) = crossbeam::channel::bounded(1);
    let ticker = {
        let highway = Arc::clone(&highway);
        thread::spawn(move || {
            let result = highway.tick();
            ticked_tx.send(()).unwrap();
            result
        })
    };
    assert!(
        ticked_rx.recv_timeout(Duration::from_millis(100)).is_err(),
        "tick returned before the circulate caller took its release"
    );

    assert_eq!(response.recv().unwrap(), Ok(()));
    ticked_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(ticker.join().unwrap(), Ok(()));
}

#[test]
fn ready_kinds_are_served_round_robin() {
    let (enter_tx, enter_rx) = crossbeam::channel::unbounded();
    let (_advance_tx, advance_rx) = crossbeam::channel::unbounded();
    let (_circulate_tx, circulate_rx) = crossbeam::channel::unbounded();
    let (_exit_tx, exit_rx) = crossbeam::channel::unbounded();
    let (tick_tx, tick_rx) = crossbeam::channel::unbounded();
    let (_snapshot_tx, snapshot_rx) = crossbeam::channel::unbounded();
    let mut rx = Receivers::new(enter_rx, advance_rx, circulate_rx, exit_rx, tick_rx, snapshot_rx);

    let mut replies = Vec::new();
    for n in 0..3 {
        let (respond, response) = crossbeam::channel::bounded(1);
        replies.push(response);
        enter_tx
            .send(EnterMessage {
                vehicle: id(&format!("v{n}")),
                travel_ticks: 0,
                respond,
            })
            .unwrap();
        let (respond, response) = crossbeam::channel::bounded(1);
        tick_tx.send(TickMessage { respond }).unwrap();
        drop(response);
    }

    // A backlog of enters must not hold the ticks back.
    let kinds: Vec<&str> = (0..6)
        .map(|_| match rx.recv() {
            Some(Request::Enter(_)) => "enter",
            Some(Request::Tick(_)) => "tick",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, ["enter", "tick", "enter", "tick", "enter", "tick"]);
}

#[test]
fn receivers_report_disconnect_once_senders_drop() {
    let (enter_tx, enter_rx) = crossbeam::channel::unbounded::<EnterMessage>();
    let (advance_tx, advance_rx) = crossbeam::channel::unbounded();
    let (circulate_tx, circulate_rx) = crossbeam::channel::unbounded();
    let (exit_tx, exit_rx) = crossbeam::channel::unbounded();
    let (tick_tx, tick_rx) = crossbeam::channel::unbounded();
    let (snapshot_tx, snapshot_rx) = crossbeam::channel::unbounded();
    let mut rx = Receivers::new(enter_rx, advance_rx, circulate_rx, exit_rx, tick_rx, snapshot_rx);

    drop((enter_tx, advance_tx, circulate_tx, exit_tx, tick_tx, snapshot_tx));
    assert!(rx.recv().is_none());
}

#[test]
fn abandoned_snapshot_request_does_not_stop_the_loop() {
    let highway = server(1, 1);
    let (respond, response) = crossbeam::channel::bounded(1);
    drop(response);
    highway
        .inner
        .snapshot_tx
        .send(SnapshotMessage { respond })
        .unwrap();
    assert_eq!(highway.enter(&id("a"), 0), Ok(Position::new(1, 1)));
    assert!(highway.snapshot().unwrap().position_of(&id("a")).is_some());
}

#[test]
fn circulate_at_zero_ticks_returns_without_a_tick() {
    let highway = server(1, 2);
    highway.enter(&id("a"), 0).unwrap();
    assert_eq!(highway.circulate(&id("a")), Ok(()));
}

#[test]
fn state_thread_stops_when_last_handle_drops() {
    let highway = server(2, 2);
    let clone = highway.clone();
    drop(highway);
    clone.enter(&id("a"), 0).unwrap();
    // Dropping the last clone joins the state thread.
    drop(clone);
}
