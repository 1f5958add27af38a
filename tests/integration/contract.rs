use carretera::{HighwayError, Position};

use crate::fixtures::{
    assert_consistent, for_each_strategy, highway, snapshot, spawn_op, vid, wait_queued,
};

#[test]
fn lane_choice_is_the_lowest_free_lane() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 1, 3);
        assert_eq!(highway.enter(&vid("a"), 0), Ok(Position::new(1, 1)));
        assert_eq!(highway.enter(&vid("b"), 0), Ok(Position::new(1, 2)));
        assert_eq!(highway.enter(&vid("c"), 0), Ok(Position::new(1, 3)));

        highway.exit(&vid("a")).unwrap();
        highway.exit(&vid("b")).unwrap();
        assert_eq!(snapshot(&highway).free_lanes(1), vec![1, 2]);
        assert_eq!(highway.enter(&vid("d"), 0), Ok(Position::new(1, 1)));

        highway.exit(&vid("c")).unwrap();
        assert_eq!(snapshot(&highway).free_lanes(1), vec![2, 3]);
        assert_eq!(highway.enter(&vid("z"), 0), Ok(Position::new(1, 2)));
    });
}

#[test]
fn single_lane_enter_waits_for_the_advance() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 2, 1);
        assert_eq!(highway.enter(&vid("A"), 0), Ok(Position::new(1, 1)));

        let b = spawn_op(&highway, |h| h.enter(&vid("B"), 0));
        wait_queued(&highway, "B", 1);

        assert_eq!(highway.advance(&vid("A"), 0), Ok(Position::new(2, 1)));
        assert_eq!(b.join().unwrap(), Ok(Position::new(1, 1)));

        let snap = snapshot(&highway);
        assert_eq!(snap.position_of(&vid("A")), Some(Position::new(2, 1)));
        assert_eq!(snap.position_of(&vid("B")), Some(Position::new(1, 1)));
        assert_consistent(&snap);
    });
}

#[test]
fn waiters_for_a_segment_are_served_in_arrival_order() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 1, 1);
        highway.enter(&vid("first"), 0).unwrap();

        let second = spawn_op(&highway, |h| h.enter(&vid("second"), 0));
        wait_queued(&highway, "second", 1);
        let third = spawn_op(&highway, |h| h.enter(&vid("third"), 0));
        wait_queued(&highway, "third", 1);
        assert_eq!(
            snapshot(&highway).waiting_for(1),
            &[vid("second"), vid("third")]
        );

        highway.exit(&vid("first")).unwrap();
        assert_eq!(second.join().unwrap(), Ok(Position::new(1, 1)));
        assert_eq!(snapshot(&highway).waiting_for(1), &[vid("third")]);

        highway.exit(&vid("second")).unwrap();
        assert_eq!(third.join().unwrap(), Ok(Position::new(1, 1)));
    });
}

#[test]
fn enter_then_exit_restores_occupancy() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 2, 2);
        highway.enter(&vid("resident"), 4).unwrap();
        let before = snapshot(&highway);

        highway.enter(&vid("visitor"), 9).unwrap();
        highway.exit(&vid("visitor")).unwrap();

        assert_eq!(snapshot(&highway), before);
    });
}

#[test]
fn precondition_violations_are_reported_not_blocked() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 2, 1);
        let ghost = vid("ghost");
        assert_eq!(
            highway.advance(&ghost, 1),
            Err(HighwayError::UnknownVehicle(ghost.clone()))
        );
        assert_eq!(
            highway.circulate(&ghost),
            Err(HighwayError::UnknownVehicle(ghost.clone()))
        );
        assert_eq!(
            highway.exit(&ghost),
            Err(HighwayError::UnknownVehicle(ghost.clone()))
        );

        highway.enter(&vid("a"), 0).unwrap();
        assert_eq!(
            highway.enter(&vid("a"), 0),
            Err(HighwayError::AlreadyRegistered(vid("a")))
        );
        highway.advance(&vid("a"), 0).unwrap();
        assert_eq!(
            highway.advance(&vid("a"), 0),
            Err(HighwayError::NoNextSegment {
                vehicle: vid("a"),
                segment: 2
            })
        );
        highway.exit(&vid("a")).unwrap();
        assert_eq!(
            highway.exit(&vid("a")),
            Err(HighwayError::UnknownVehicle(vid("a")))
        );
    });
}

#[test]
fn queued_vehicle_cannot_issue_another_request() {
    for_each_strategy(|strategy| {
        let highway = highway(strategy, 2, 1);
        highway.enter(&vid("front"), 0).unwrap();
        highway.advance(&vid("front"), 0).unwrap();
        highway.enter(&vid("back"), 0).unwrap();

        let blocked = spawn_op(&highway, |h| h.advance(&vid("back"), 0));
        wait_queued(&highway, "back", 2);
        assert_eq!(
            highway.exit(&vid("back")),
            Err(HighwayError::RequestPending(vid("back")))
        );
        assert_eq!(
            highway.enter(&vid("back"), 0),
            Err(HighwayError::AlreadyRegistered(vid("back")))
        );

        highway.exit(&vid("front")).unwrap();
        assert_eq!(blocked.join().unwrap(), Ok(Position::new(2, 1)));
    });
}
