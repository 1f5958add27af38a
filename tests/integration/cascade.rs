use carretera::Position;

use crate::fixtures::{
    assert_consistent, for_each_strategy, highway, snapshot, spawn_op, vid, wait_queued,
};

#[test]
fn one_exit_unblocks_the_whole_chain() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 3, 1);
        highway.enter(&vid("v1"), 0).unwrap();
        highway.advance(&vid("v1"), 0).unwrap();
        highway.advance(&vid("v1"), 0).unwrap();
        highway.enter(&vid("v2"), 0).unwrap();
        highway.advance(&vid("v2"), 0).unwrap();
        highway.enter(&vid("v3"), 0).unwrap();

        let v2 = spawn_op(&highway, |h| h.advance(&vid("v2"), 1));
        wait_queued(&highway, "v2", 3);
        let v3 = spawn_op(&highway, |h| h.advance(&vid("v3"), 2));
        wait_queued(&highway, "v3", 2);
        let v4 = spawn_op(&highway, |h| h.enter(&vid("v4"), 3));
        wait_queued(&highway, "v4", 1);

        highway.exit(&vid("v1")).unwrap();

        // Every grant happened inside the exit call.
        let snap = snapshot(&highway);
        assert_eq!(snap.position_of(&vid("v2")), Some(Position::new(3, 1)));
        assert_eq!(snap.position_of(&vid("v3")), Some(Position::new(2, 1)));
        assert_eq!(snap.position_of(&vid("v4")), Some(Position::new(1, 1)));
        assert!(snap.waiting.iter().all(Vec::is_empty));
        assert_consistent(&snap);

        assert_eq!(v2.join().unwrap(), Ok(Position::new(3, 1)));
        assert_eq!(v3.join().unwrap(), Ok(Position::new(2, 1)));
        assert_eq!(v4.join().unwrap(), Ok(Position::new(1, 1)));
        assert_eq!(snap.remaining_ticks(&vid("v2")), Some(1));
        assert_eq!(snap.remaining_ticks(&vid("v3")), Some(2));
        assert_eq!(snap.remaining_ticks(&vid("v4")), Some(3));
    });
}

#[test]
fn cascade_stops_where_capacity_runs_out() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 2, 1);
        highway.enter(&vid("a"), 0).unwrap();
        highway.advance(&vid("a"), 0).unwrap();
        highway.enter(&vid("b"), 0).unwrap();

        let c = spawn_op(&highway, |h| h.enter(&vid("c"), 0));
        wait_queued(&highway, "c", 1);

        // Nothing frees segment 1 until b moves on.
        let b = spawn_op(&highway, |h| h.advance(&vid("b"), 0));
        wait_queued(&highway, "b", 2);
        assert_eq!(snapshot(&highway).waiting_for(1), &[vid("c")]);

        highway.exit(&vid("a")).unwrap();
        assert_eq!(b.join().unwrap(), Ok(Position::new(2, 1)));
        assert_eq!(c.join().unwrap(), Ok(Position::new(1, 1)));
    });
}
