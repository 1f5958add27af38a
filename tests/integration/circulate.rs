use std::time::Duration;

use crate::fixtures::{for_each_strategy, highway, snapshot, spawn_op, vid, wait_circulating};

#[test]
fn tick_decrements_and_stops_at_zero() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 1, 2);
        highway.enter(&vid("short"), 1).unwrap();
        highway.enter(&vid("long"), 3).unwrap();

        highway.tick().unwrap();
        let snap = snapshot(&highway);
        assert_eq!(snap.remaining_ticks(&vid("short")), Some(0));
        assert_eq!(snap.remaining_ticks(&vid("long")), Some(2));

        highway.tick().unwrap();
        highway.tick().unwrap();
        highway.tick().unwrap();
        let snap = snapshot(&highway);
        assert_eq!(snap.remaining_ticks(&vid("short")), Some(0));
        assert_eq!(snap.remaining_ticks(&vid("long")), Some(0));
    });
}

#[test]
fn circulate_releases_exactly_when_ticks_run_out() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 1, 1);
        highway.enter(&vid("car"), 3).unwrap();

        let (done_tx, done_rx) = crossbeam::channel::bounded(1);
        let waiter = spawn_op(&highway, move |h| {
            let result = h.circulate(&vid("car"));
            done_tx.send(()).unwrap();
            result
        });
        wait_circulating(&highway, "car");

        highway.tick().unwrap();
        highway.tick().unwrap();
        assert!(done_rx.recv_timeout(Duration::from_millis(50)).is_err());
        assert!(snapshot(&highway).circulating.contains(&vid("car")));

        highway.tick().unwrap();
        // tick only returns once the released caller has resumed
        assert!(snapshot(&highway).circulating.is_empty());
        done_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(waiter.join().unwrap(), Ok(()));
    });
}

#[test]
fn one_tick_releases_every_vehicle_reaching_zero() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 1, 3);
        for name in ["a", "b", "c"] {
            highway.enter(&vid(name), 1).unwrap();
        }
        let waiters: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                let handle = spawn_op(&highway, move |h| h.circulate(&vid(name)));
                wait_circulating(&highway, name);
                handle
            })
            .collect();

        highway.tick().unwrap();
        assert!(snapshot(&highway).circulating.is_empty());
        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), Ok(()));
        }
    });
}

#[test]
fn tick_does_not_wait_for_vehicles_without_a_circulate_call() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 2, 1);
        highway.enter(&vid("idle"), 1).unwrap();
        highway.tick().unwrap();
        assert_eq!(highway.circulate(&vid("idle")), Ok(()));
        assert_eq!(
            highway.advance(&vid("idle"), 0).map(|p| p.segment),
            Ok(2)
        );
    });
}
