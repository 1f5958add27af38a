//! Shared helpers: every scenario runs against both strategies.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use carretera::{Highway, HighwayConfig, HighwaySnapshot, Strategy, VehicleId, build};

pub fn vid(raw: &str) -> VehicleId {
    VehicleId::new(raw).expect("vehicle id")
}

pub fn highway(strategy: Strategy, segments: usize, lanes: usize) -> Arc<dyn Highway> {
    let layout = HighwayConfig::new(segments, lanes).expect("layout");
    build(strategy, layout).expect("highway")
}

/// Run `scenario` once per strategy, naming the strategy on failure.
pub fn for_each_strategy(scenario: impl Fn(Strategy)) {
    for strategy in Strategy::ALL {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| scenario(strategy)));
        if let Err(panic) = result {
            eprintln!("scenario failed with the {strategy} strategy");
            std::panic::resume_unwind(panic);
        }
    }
}

/// Run `op` on its own thread against a clone of `highway`.
pub fn spawn_op<T, F>(highway: &Arc<dyn Highway>, op: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn Highway) -> T + Send + 'static,
{
    let highway = Arc::clone(highway);
    thread::spawn(move || op(highway.as_ref()))
}

pub fn wait_until(what: &str, mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(2));
    }
}

pub fn snapshot(highway: &Arc<dyn Highway>) -> HighwaySnapshot {
    highway.snapshot().expect("snapshot")
}

/// Block until `vehicle` sits in the queue for `target_segment`.
pub fn wait_queued(highway: &Arc<dyn Highway>, vehicle: &str, target_segment: usize) {
    let id = vid(vehicle);
    wait_until(&format!("{vehicle} to queue for segment {target_segment}"), || {
        snapshot(highway).waiting_for(target_segment).contains(&id)
    });
}

/// Block until `vehicle` has a `circulate` call parked.
pub fn wait_circulating(highway: &Arc<dyn Highway>, vehicle: &str) {
    let id = vid(vehicle);
    wait_until(&format!("{vehicle} to circulate"), || {
        snapshot(highway).circulating.contains(&id)
    });
}

/// No cell is shared and the occupancy grid matches the registry.
pub fn assert_consistent(snapshot: &HighwaySnapshot) {
    let mut cells = std::collections::BTreeSet::new();
    for (vehicle, state) in &snapshot.vehicles {
        assert!(
            cells.insert(state.position),
            "{vehicle} shares {}",
            state.position
        );
        assert!(snapshot.occupancy.is_occupied(state.position));
    }
    assert_eq!(snapshot.occupancy.occupied_count(), snapshot.vehicles.len());
}
