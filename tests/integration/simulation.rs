use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use carretera::config::Config;
use carretera::sim::{SimError, SimPlan, Simulation, VehiclePlan};
use carretera::{HighwayError, build};

use crate::fixtures::{assert_consistent, for_each_strategy, highway, vid};

fn plan(count: usize, segments: usize) -> SimPlan {
    SimPlan {
        vehicles: (0..count)
            .map(|n| VehiclePlan {
                id: vid(&format!("car-{n:02}")),
                ticks_per_segment: (0..segments).map(|s| ((n + s) % 3) as u32).collect(),
            })
            .collect(),
        tick_interval: Duration::from_millis(1),
    }
}

#[test]
fn crowded_highway_never_shares_a_cell() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 3, 2);
        let stop = Arc::new(AtomicBool::new(false));
        let observer = {
            let highway = Arc::clone(&highway);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut seen = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    let snap = highway.snapshot().expect("snapshot");
                    assert_consistent(&snap);
                    seen = seen.max(snap.vehicles.len());
                    thread::yield_now();
                }
                seen
            })
        };

        let report = Simulation::new(Arc::clone(&highway), plan(16, 3))
            .run()
            .unwrap();
        stop.store(true, Ordering::Relaxed);
        let peak = observer.join().unwrap();

        assert_eq!(report.trajectories.len(), 16);
        assert!(peak <= 6, "{peak} vehicles on a 6-cell highway");
        for (vehicle, trajectory) in &report.trajectories {
            let segments: Vec<usize> = trajectory.iter().map(|p| p.segment).collect();
            assert_eq!(segments, vec![1, 2, 3], "{vehicle}");
        }
        assert!(highway.snapshot().unwrap().vehicles.is_empty());
    });
}

#[test]
fn default_config_runs_to_completion() {
    for_each_strategy(|strategy| {
        let mut config = Config::default();
        config.strategy = strategy;
        config.clock.tick_interval_ms = 1;
        let highway = build(config.strategy, config.highway).unwrap();
        let report = Simulation::new(highway, config.to_plan().unwrap())
            .run()
            .unwrap();
        assert_eq!(report.trajectories.len(), config.vehicles.len());
        // Every vehicle spends 2 ticks per segment on a 3-segment road.
        assert!(report.ticks >= 6, "only {} ticks", report.ticks);
    });
}

#[test]
fn failing_vehicle_is_reported_by_id() {
    let highway = highway(carretera::Strategy::Server, 1, 1);
    highway.enter(&vid("car-00"), 0).unwrap();
    let err = Simulation::new(highway, plan(1, 1)).run().unwrap_err();
    match err {
        SimError::Vehicle { vehicle, source } => {
            assert_eq!(vehicle, vid("car-00"));
            assert_eq!(source, HighwayError::AlreadyRegistered(vid("car-00")));
        }
        other => panic!("unexpected error: {other}"),
    }
}
