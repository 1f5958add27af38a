//! Segment x lane occupancy grid.

use super::position::{HighwayConfig, Position};

/// Boolean matrix `[segment][lane]`, `true` meaning occupied.
///
/// `occupy`/`vacate` on a cell in the wrong state is a bug in the caller and
/// panics; the state machine never lets that happen under correct usage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occupancy {
    cells: Vec<Vec<bool>>,
}

impl Occupancy {
    pub fn new(layout: HighwayConfig) -> Self {
        Self {
            cells: vec![vec![false; layout.lanes]; layout.segments],
        }
    }

    pub fn segments(&self) -> usize {
        self.cells.len()
    }

    pub fn lanes(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn is_occupied(&self, position: Position) -> bool {
        self.row(position.segment)[self.lane_index(position.lane)]
    }

    /// Lowest-numbered free lane of `segment`, if any.
    pub fn free_lane(&self, segment: usize) -> Option<usize> {
        self.row(segment)
            .iter()
            .position(|occupied| !occupied)
            .map(|index| index + 1)
    }

    /// Every free lane of `segment`, ascending.
    pub fn free_lanes(&self, segment: usize) -> Vec<usize> {
        self.row(segment)
            .iter()
            .enumerate()
            .filter(|(_, occupied)| !**occupied)
            .map(|(index, _)| index + 1)
            .collect()
    }

    pub fn occupy(&mut self, position: Position) {
        let lane = self.lane_index(position.lane);
        let cell = &mut self.row_mut(position.segment)[lane];
        assert!(!*cell, "cell {position} is already occupied");
        *cell = true;
    }

    pub fn vacate(&mut self, position: Position) {
        let lane = self.lane_index(position.lane);
        let cell = &mut self.row_mut(position.segment)[lane];
        assert!(*cell, "cell {position} is already free");
        *cell = false;
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().filter(|occupied| **occupied).count()
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.cells
    }

    fn row(&self, segment: usize) -> &[bool] {
        assert!(
            (1..=self.cells.len()).contains(&segment),
            "segment {segment} out of range 1..={}",
            self.cells.len()
        );
        &self.cells[segment - 1]
    }

    fn row_mut(&mut self, segment: usize) -> &mut [bool] {
        let segments = self.cells.len();
        assert!(
            (1..=segments).contains(&segment),
            "segment {segment} out of range 1..={segments}"
        );
        &mut self.cells[segment - 1]
    }

    fn lane_index(&self, lane: usize) -> usize {
        let lanes = self.lanes();
        assert!(
            (1..=lanes).contains(&lane),
            "lane {lane} out of range 1..={lanes}"
        );
        lane - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(segments: usize, lanes: usize) -> Occupancy {
        Occupancy::new(HighwayConfig::new(segments, lanes).unwrap())
    }

    #[test]
    fn free_lane_prefers_lowest_index() {
        let mut grid = grid(2, 3);
        assert_eq!(grid.free_lane(1), Some(1));
        grid.occupy(Position::new(1, 1));
        assert_eq!(grid.free_lane(1), Some(2));
        assert_eq!(grid.free_lanes(1), vec![2, 3]);
        grid.occupy(Position::new(1, 3));
        assert_eq!(grid.free_lane(1), Some(2));
        grid.occupy(Position::new(1, 2));
        assert_eq!(grid.free_lane(1), None);
        assert!(grid.free_lanes(1).is_empty());
        // other segment untouched
        assert_eq!(grid.free_lane(2), Some(1));
        assert_eq!(grid.occupied_count(), 3);
    }

    #[test]
    fn vacate_reopens_the_lane() {
        let mut grid = grid(1, 2);
        grid.occupy(Position::new(1, 1));
        grid.occupy(Position::new(1, 2));
        grid.vacate(Position::new(1, 1));
        assert_eq!(grid.free_lane(1), Some(1));
        assert!(grid.is_occupied(Position::new(1, 2)));
    }

    #[test]
    #[should_panic(expected = "already occupied")]
    fn double_occupy_is_fatal() {
        let mut grid = grid(1, 1);
        grid.occupy(Position::new(1, 1));
        grid.occupy(Position::new(1, 1));
    }

    #[test]
    #[should_panic(expected = "already free")]
    fn vacating_a_free_cell_is_fatal() {
        let mut grid = grid(1, 1);
        grid.vacate(Position::new(1, 1));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn segment_zero_is_out_of_range() {
        grid(2, 2).free_lane(0);
    }
}
