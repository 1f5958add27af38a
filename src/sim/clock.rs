use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::Receiver;

use super::SimError;
use crate::core::HighwayError;
use crate::highway::Highway;

pub(super) const THREAD_NAME: &str = "carretera-clock";

/// Spawn the clock. It ticks every `interval` until `running` disconnects
/// and returns the number of ticks issued.
pub(super) fn spawn(
    highway: Arc<dyn Highway>,
    interval: Duration,
    running: Receiver<()>,
) -> Result<JoinHandle<Result<u64, HighwayError>>, SimError> {
    std::thread::Builder::new()
        .name(THREAD_NAME.into())
        .spawn(move || run(highway.as_ref(), interval, running))
        .map_err(|source| SimError::Spawn {
            thread: THREAD_NAME.to_string(),
            source,
        })
}

fn run(highway: &dyn Highway, interval: Duration, running: Receiver<()>) -> Result<u64, HighwayError> {
    let ticker = crossbeam::channel::tick(interval);
    let mut ticks = 0u64;
    loop {
        crossbeam::select! {
            recv(running) -> _ => {
                // Nothing is ever sent: this fires once every driver is gone.
                tracing::debug!(ticks, "clock stopped");
                return Ok(ticks);
            }
            recv(ticker) -> _ => {
                highway.tick()?;
                ticks += 1;
            }
        }
    }
}
