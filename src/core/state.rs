//! Highway state transitions and the cascading resolver.
//!
//! `HighwayState<R>` is generic over the reply handle `R` a strategy parks
//! with each deferred request: a reply channel for the server, a ticket for
//! the monitor. Submitting never satisfies a request directly; the caller
//! always runs [`HighwayState::resolve`] afterwards, which keeps service
//! strictly FIFO per segment.

use std::collections::BTreeSet;

use super::error::HighwayError;
use super::identity::VehicleId;
use super::occupancy::Occupancy;
use super::position::{HighwayConfig, Position};
use super::registry::{Registry, VehicleState};
use super::request::{Deferred, DeferredQueues, Grant, Movement};
use super::snapshot::HighwaySnapshot;

/// A request rejected at submission. The reply handle is handed back so the
/// strategy can report the error on it.
#[derive(Debug)]
pub struct Refused<R> {
    pub error: HighwayError,
    pub reply: R,
}

#[derive(Debug)]
pub struct HighwayState<R> {
    layout: HighwayConfig,
    grid: Occupancy,
    registry: Registry,
    queues: DeferredQueues<R>,
}

impl<R> HighwayState<R> {
    pub fn new(layout: HighwayConfig) -> Result<Self, HighwayError> {
        layout.validate()?;
        Ok(Self {
            layout,
            grid: Occupancy::new(layout),
            registry: Registry::new(),
            queues: DeferredQueues::new(layout.segments),
        })
    }

    pub fn layout(&self) -> HighwayConfig {
        self.layout
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.grid
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn vehicle(&self, vehicle: &VehicleId) -> Option<&VehicleState> {
        self.registry.get(vehicle)
    }

    pub fn is_queued(&self, vehicle: &VehicleId) -> bool {
        self.queues.contains_vehicle(vehicle)
    }

    pub fn remaining_ticks(&self, vehicle: &VehicleId) -> Result<u32, HighwayError> {
        self.registry
            .get(vehicle)
            .map(|state| state.remaining_ticks)
            .ok_or_else(|| HighwayError::UnknownVehicle(vehicle.clone()))
    }

    /// Queue an enter request. Returns the target segment (always 1).
    pub fn submit_enter(
        &mut self,
        vehicle: VehicleId,
        travel_ticks: u32,
        reply: R,
    ) -> Result<usize, Refused<R>> {
        if self.registry.contains(&vehicle) || self.queues.contains_vehicle(&vehicle) {
            return Err(Refused {
                error: HighwayError::AlreadyRegistered(vehicle),
                reply,
            });
        }
        let movement = Movement::Enter;
        self.queues.push(Deferred {
            vehicle,
            movement,
            travel_ticks,
            reply,
        });
        Ok(movement.target_segment())
    }

    /// Queue an advance request. Returns the target segment.
    pub fn submit_advance(
        &mut self,
        vehicle: VehicleId,
        travel_ticks: u32,
        reply: R,
    ) -> Result<usize, Refused<R>> {
        let Some(current) = self.registry.get(&vehicle).map(|state| state.position) else {
            return Err(Refused {
                error: HighwayError::UnknownVehicle(vehicle),
                reply,
            });
        };
        if self.queues.contains_vehicle(&vehicle) {
            return Err(Refused {
                error: HighwayError::RequestPending(vehicle),
                reply,
            });
        }
        if self.layout.is_last_segment(current.segment) {
            return Err(Refused {
                error: HighwayError::NoNextSegment {
                    vehicle,
                    segment: current.segment,
                },
                reply,
            });
        }
        let movement = Movement::Advance { from: current };
        self.queues.push(Deferred {
            vehicle,
            movement,
            travel_ticks,
            reply,
        });
        Ok(movement.target_segment())
    }

    /// Remove a vehicle and free its cell. Returns the cell it left.
    ///
    /// Run [`resolve`](Self::resolve) afterwards to hand the cell out.
    pub fn exit(&mut self, vehicle: &VehicleId) -> Result<Position, HighwayError> {
        if self.queues.contains_vehicle(vehicle) {
            return Err(HighwayError::RequestPending(vehicle.clone()));
        }
        let state = self
            .registry
            .remove(vehicle)
            .ok_or_else(|| HighwayError::UnknownVehicle(vehicle.clone()))?;
        self.grid.vacate(state.position);
        Ok(state.position)
    }

    /// One clock tick. Returns the vehicles whose counter reached 0 on it.
    pub fn tick(&mut self) -> Vec<VehicleId> {
        self.registry.tick_all()
    }

    /// Serve deferred requests with whatever capacity is free.
    ///
    /// One backward sweep over target segments `S..=1`. Serving an advance
    /// into segment `t` frees a cell in `t - 1`, which is the next segment
    /// visited, so a single sweep reaches a fixed point. A request that finds
    /// no lane stays at the front of its queue.
    pub fn resolve(&mut self) -> Vec<Grant<R>> {
        let mut grants = Vec::new();
        for target in (1..=self.layout.segments).rev() {
            while self.queues.front(target).is_some() {
                let Some(lane) = self.grid.free_lane(target) else {
                    break;
                };
                let Some(request) = self.queues.pop_front(target) else {
                    break;
                };
                grants.push(self.apply(request, Position::new(target, lane)));
            }
        }
        grants
    }

    fn apply(&mut self, request: Deferred<R>, position: Position) -> Grant<R> {
        let Deferred {
            vehicle,
            movement,
            travel_ticks,
            reply,
        } = request;
        match movement {
            Movement::Enter => {
                self.grid.occupy(position);
                self.registry
                    .insert(vehicle.clone(), VehicleState::new(position, travel_ticks));
            }
            Movement::Advance { from } => {
                let state = self
                    .registry
                    .get_mut(&vehicle)
                    .unwrap_or_else(|| panic!("queued vehicle {vehicle} left the registry"));
                assert_eq!(state.position, from, "queued vehicle {vehicle} moved");
                state.position = position;
                state.remaining_ticks = travel_ticks;
                self.grid.vacate(from);
                self.grid.occupy(position);
            }
        }
        Grant {
            vehicle,
            movement,
            position,
            reply,
        }
    }

    pub fn snapshot(&self) -> HighwaySnapshot {
        HighwaySnapshot {
            layout: self.layout,
            vehicles: self
                .registry
                .iter()
                .map(|(id, state)| (id.clone(), state.clone()))
                .collect(),
            occupancy: self.grid.clone(),
            waiting: (1..=self.layout.segments)
                .map(|segment| self.queues.queued_vehicles(segment))
                .collect(),
            circulating: BTreeSet::new(),
        }
    }
}
