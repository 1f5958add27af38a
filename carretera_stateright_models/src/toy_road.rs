//! Toy road: the grid, the per-segment queues and the backward resolver.
//!
//! Mirrors the crate's `HighwayState` with everything as small integers so
//! states hash cheaply.

use std::collections::{BTreeMap, VecDeque};

pub type Vehicle = u8;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cell {
    pub segment: u8,
    pub lane: u8,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Move {
    Enter,
    Advance { from: Cell },
}

impl Move {
    pub fn target(self) -> u8 {
        match self {
            Move::Enter => 1,
            Move::Advance { from } => from.segment + 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Request {
    pub vehicle: Vehicle,
    pub movement: Move,
    /// Arrival order across the whole road.
    pub ticket: u8,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Road {
    pub segments: u8,
    pub lanes: u8,
    /// `grid[s - 1][l - 1]` holds the occupant of `(s, l)`.
    pub grid: Vec<Vec<Option<Vehicle>>>,
    pub positions: BTreeMap<Vehicle, Cell>,
    /// `queues[s - 1]` waits for a lane in segment `s`.
    pub queues: Vec<VecDeque<Request>>,
    pub next_ticket: u8,
    /// Tickets granted by the last resolve, per target segment, in order.
    pub last_grants: Vec<(u8, u8)>,
}

impl Road {
    pub fn new(segments: u8, lanes: u8) -> Self {
        Self {
            segments,
            lanes,
            grid: vec![vec![None; lanes as usize]; segments as usize],
            positions: BTreeMap::new(),
            queues: vec![VecDeque::new(); segments as usize],
            next_ticket: 0,
            last_grants: Vec::new(),
        }
    }

    pub fn free_lane(&self, segment: u8) -> Option<u8> {
        self.grid[segment as usize - 1]
            .iter()
            .position(Option::is_none)
            .map(|index| index as u8 + 1)
    }

    pub fn is_queued(&self, vehicle: Vehicle) -> bool {
        self.queues.iter().flatten().any(|r| r.vehicle == vehicle)
    }

    pub fn submit(&mut self, vehicle: Vehicle, movement: Move) {
        let request = Request {
            vehicle,
            movement,
            ticket: self.next_ticket,
        };
        self.next_ticket += 1;
        self.queues[movement.target() as usize - 1].push_back(request);
    }

    pub fn exit(&mut self, vehicle: Vehicle) {
        if let Some(cell) = self.positions.remove(&vehicle) {
            self.set(cell, None);
        }
    }

    /// One backward sweep over target segments `S..=1`.
    pub fn resolve(&mut self) {
        self.last_grants.clear();
        for target in (1..=self.segments).rev() {
            while let Some(lane) = self.free_lane(target) {
                let Some(request) = self.queues[target as usize - 1].pop_front() else {
                    break;
                };
                let cell = Cell {
                    segment: target,
                    lane,
                };
                if let Move::Advance { from } = request.movement {
                    self.set(from, None);
                }
                self.set(cell, Some(request.vehicle));
                self.positions.insert(request.vehicle, cell);
                self.last_grants.push((target, request.ticket));
            }
        }
    }

    fn set(&mut self, cell: Cell, occupant: Option<Vehicle>) {
        self.grid[cell.segment as usize - 1][cell.lane as usize - 1] = occupant;
    }

    /// Every position is backed by the grid and vice versa.
    pub fn grid_matches_positions(&self) -> bool {
        let occupied = self.grid.iter().flatten().filter(|c| c.is_some()).count();
        occupied == self.positions.len()
            && self.positions.iter().all(|(vehicle, cell)| {
                self.grid[cell.segment as usize - 1][cell.lane as usize - 1] == Some(*vehicle)
            })
    }

    /// No segment has both a free lane and a waiting request.
    pub fn work_conserving(&self) -> bool {
        (1..=self.segments)
            .all(|s| self.queues[s as usize - 1].is_empty() || self.free_lane(s).is_none())
    }

    /// Grants within one segment went out in ticket order.
    pub fn grants_in_arrival_order(&self) -> bool {
        self.last_grants
            .windows(2)
            .all(|pair| pair[0].0 != pair[1].0 || pair[0].1 < pair[1].1)
    }
}
