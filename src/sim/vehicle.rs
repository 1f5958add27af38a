use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::Sender;

use super::{SimError, VehiclePlan};
use crate::core::{HighwayError, Position, VehicleId};
use crate::highway::Highway;

pub(super) fn thread_name(vehicle: &VehicleId) -> String {
    format!("vehicle-{vehicle}")
}

/// Spawn a driver for one vehicle. `running` is held until the driver ends.
pub(super) fn spawn(
    highway: Arc<dyn Highway>,
    plan: VehiclePlan,
    running: Sender<()>,
) -> Result<JoinHandle<Result<Vec<Position>, HighwayError>>, SimError> {
    let thread = thread_name(&plan.id);
    std::thread::Builder::new()
        .name(thread.clone())
        .spawn(move || {
            let _running = running;
            drive(highway.as_ref(), &plan)
        })
        .map_err(|source| SimError::Spawn { thread, source })
}

/// Run the full lifecycle. Returns the positions granted along the way.
pub(super) fn drive(
    highway: &dyn Highway,
    plan: &VehiclePlan,
) -> Result<Vec<Position>, HighwayError> {
    let span = tracing::info_span!("vehicle", vehicle = %plan.id);
    let _guard = span.enter();

    let mut ticks = plan.ticks_per_segment.iter().copied();
    let first = ticks.next().unwrap_or(0);
    let mut trajectory = vec![highway.enter(&plan.id, first)?];
    tracing::debug!(position = %trajectory[0], "entered");

    for travel_ticks in ticks {
        highway.circulate(&plan.id)?;
        let position = highway.advance(&plan.id, travel_ticks)?;
        tracing::debug!(%position, "advanced");
        trajectory.push(position);
    }

    highway.circulate(&plan.id)?;
    highway.exit(&plan.id)?;
    tracing::debug!("exited");
    Ok(trajectory)
}
