//! Simulation drivers: one thread per vehicle plus a clock thread.
//!
//! Each vehicle runs the full lifecycle against a shared [`Highway`]:
//! `enter`, then (`circulate`, `advance`) once per remaining segment, then
//! `circulate` and `exit`. The clock ticks at a fixed interval until the last
//! vehicle thread is done.

mod clock;
mod vehicle;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;

use crate::core::{HighwayError, Position, VehicleId};
use crate::error::{Effect, Transience};
use crate::highway::Highway;

/// Shortest clock period the driver will honor.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// One vehicle's route: the travel ticks to draw in each segment, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VehiclePlan {
    pub id: VehicleId,
    pub ticks_per_segment: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimPlan {
    pub vehicles: Vec<VehiclePlan>,
    pub tick_interval: Duration,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimReport {
    /// Every position each vehicle was granted, in order.
    pub trajectories: BTreeMap<VehicleId, Vec<Position>>,
    /// Ticks issued by the clock.
    pub ticks: u64,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    #[error("vehicle `{vehicle}` plans {got} segment(s) on a {expected}-segment highway")]
    PlanLength {
        vehicle: VehicleId,
        expected: usize,
        got: usize,
    },

    #[error("vehicle `{0}` appears twice in the plan")]
    DuplicateVehicle(VehicleId),

    #[error("vehicle `{vehicle}` failed: {source}")]
    Vehicle {
        vehicle: VehicleId,
        #[source]
        source: HighwayError,
    },

    #[error("clock failed: {0}")]
    Clock(#[source] HighwayError),

    #[error("failed to spawn driver thread `{thread}`: {source}")]
    Spawn {
        thread: String,
        #[source]
        source: std::io::Error,
    },

    #[error("driver thread `{thread}` panicked")]
    DriverPanicked { thread: String },
}

impl SimError {
    pub fn transience(&self) -> Transience {
        match self {
            SimError::PlanLength { .. } | SimError::DuplicateVehicle(_) => Transience::Permanent,
            SimError::Vehicle { source, .. } | SimError::Clock(source) => source.transience(),
            SimError::Spawn { .. } => Transience::Retryable,
            SimError::DriverPanicked { .. } => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            SimError::PlanLength { .. } | SimError::DuplicateVehicle(_) => Effect::None,
            _ => Effect::Unknown,
        }
    }
}

/// A planned run over a shared highway.
pub struct Simulation {
    highway: Arc<dyn Highway>,
    plan: SimPlan,
}

impl Simulation {
    pub fn new(highway: Arc<dyn Highway>, plan: SimPlan) -> Self {
        Self { highway, plan }
    }

    fn validate(&self) -> Result<(), SimError> {
        let expected = self.highway.layout().segments;
        let mut seen = BTreeSet::new();
        for vehicle in &self.plan.vehicles {
            if !seen.insert(&vehicle.id) {
                return Err(SimError::DuplicateVehicle(vehicle.id.clone()));
            }
            if vehicle.ticks_per_segment.len() != expected {
                return Err(SimError::PlanLength {
                    vehicle: vehicle.id.clone(),
                    expected,
                    got: vehicle.ticks_per_segment.len(),
                });
            }
        }
        Ok(())
    }

    /// Drive every vehicle to the exit. Blocks until all driver threads end.
    pub fn run(self) -> Result<SimReport, SimError> {
        self.validate()?;
        if self.plan.vehicles.is_empty() {
            return Ok(SimReport::default());
        }
        let layout = self.highway.layout();
        let interval = self.plan.tick_interval.max(MIN_TICK_INTERVAL);
        tracing::info!(
            segments = layout.segments,
            lanes = layout.lanes,
            vehicles = self.plan.vehicles.len(),
            interval_ms = interval.as_millis() as u64,
            "simulation starting"
        );

        // The clock stops once every vehicle thread has dropped its sender.
        let (running_tx, running_rx) = crossbeam::channel::bounded::<()>(0);
        let clock = clock::spawn(Arc::clone(&self.highway), interval, running_rx)?;

        let mut drivers: Vec<(VehicleId, JoinHandle<_>)> = Vec::new();
        for plan in self.plan.vehicles {
            let vehicle = plan.id.clone();
            let handle = vehicle::spawn(Arc::clone(&self.highway), plan, running_tx.clone())?;
            drivers.push((vehicle, handle));
        }
        drop(running_tx);

        let mut report = SimReport::default();
        let mut first_error = None;
        for (vehicle, handle) in drivers {
            let outcome = match handle.join() {
                Ok(Ok(trajectory)) => {
                    report.trajectories.insert(vehicle, trajectory);
                    continue;
                }
                Ok(Err(source)) => SimError::Vehicle { vehicle, source },
                Err(_) => SimError::DriverPanicked {
                    thread: vehicle::thread_name(&vehicle),
                },
            };
            tracing::error!(error = %outcome, "vehicle driver failed");
            first_error.get_or_insert(outcome);
        }

        match clock.join() {
            Ok(Ok(ticks)) => report.ticks = ticks,
            Ok(Err(source)) => {
                first_error.get_or_insert(SimError::Clock(source));
            }
            Err(_) => {
                first_error.get_or_insert(SimError::DriverPanicked {
                    thread: clock::THREAD_NAME.to_string(),
                });
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }
        tracing::info!(
            vehicles = report.trajectories.len(),
            ticks = report.ticks,
            "simulation finished"
        );
        Ok(report)
    }
}
