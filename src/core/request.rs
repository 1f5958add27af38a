//! Deferred movement requests.
//!
//! A request is queued under the segment it wants to move into. Queue `k`
//! (0-based) holds requests targeting segment `k + 1`, so queue 0 is the
//! entry queue. Exits never block and never queue.

use std::collections::VecDeque;

use super::identity::VehicleId;
use super::position::Position;

/// What a deferred request asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Movement {
    /// Take a lane in segment 1.
    Enter,
    /// Leave `from` for a lane in the next segment.
    Advance { from: Position },
}

impl Movement {
    pub fn target_segment(&self) -> usize {
        match self {
            Movement::Enter => 1,
            Movement::Advance { from } => from.segment + 1,
        }
    }
}

#[derive(Debug)]
pub struct Deferred<R> {
    pub vehicle: VehicleId,
    pub movement: Movement,
    pub travel_ticks: u32,
    pub reply: R,
}

/// A request the resolver satisfied. The strategy delivers `position` to `reply`.
#[derive(Debug)]
pub struct Grant<R> {
    pub vehicle: VehicleId,
    pub movement: Movement,
    pub position: Position,
    pub reply: R,
}

#[derive(Debug)]
pub struct DeferredQueues<R> {
    queues: Vec<VecDeque<Deferred<R>>>,
}

impl<R> DeferredQueues<R> {
    pub fn new(segments: usize) -> Self {
        Self {
            queues: (0..segments).map(|_| VecDeque::new()).collect(),
        }
    }

    pub fn push(&mut self, request: Deferred<R>) {
        let target = request.movement.target_segment();
        self.queue_mut(target).push_back(request);
    }

    pub fn front(&self, target_segment: usize) -> Option<&Deferred<R>> {
        self.queue(target_segment).front()
    }

    pub fn pop_front(&mut self, target_segment: usize) -> Option<Deferred<R>> {
        self.queue_mut(target_segment).pop_front()
    }

    /// Requests waiting for a lane in `target_segment`.
    pub fn waiting_for(&self, target_segment: usize) -> usize {
        self.queue(target_segment).len()
    }

    /// Queue depths indexed by target segment - 1.
    pub fn depths(&self) -> Vec<usize> {
        self.queues.iter().map(VecDeque::len).collect()
    }

    pub fn contains_vehicle(&self, vehicle: &VehicleId) -> bool {
        self.queues
            .iter()
            .flatten()
            .any(|request| &request.vehicle == vehicle)
    }

    /// Ids waiting in `target_segment`'s queue, oldest first.
    pub fn queued_vehicles(&self, target_segment: usize) -> Vec<VehicleId> {
        self.queue(target_segment)
            .iter()
            .map(|request| request.vehicle.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    fn queue(&self, target_segment: usize) -> &VecDeque<Deferred<R>> {
        assert!(
            (1..=self.queues.len()).contains(&target_segment),
            "no queue for segment {target_segment}"
        );
        &self.queues[target_segment - 1]
    }

    fn queue_mut(&mut self, target_segment: usize) -> &mut VecDeque<Deferred<R>> {
        assert!(
            (1..=self.queues.len()).contains(&target_segment),
            "no queue for segment {target_segment}"
        );
        &mut self.queues[target_segment - 1]
    }
}
