//! Plain-text rendering for CLI output.

use crate::config::{Config, TravelTicks};
use crate::sim::SimReport;

pub fn render_config(config: &Config) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "highway: {} segment(s) x {} lane(s)\n",
        config.highway.segments, config.highway.lanes
    ));
    out.push_str(&format!("strategy: {}\n", config.strategy));
    out.push_str(&format!(
        "clock: every {} ms\n",
        config.clock.tick_interval_ms
    ));
    out.push_str(&format!("vehicles ({}):", config.vehicles.len()));
    for vehicle in &config.vehicles {
        let ticks = match &vehicle.ticks_per_segment {
            TravelTicks::Uniform(ticks) => format!("{ticks} per segment"),
            TravelTicks::PerSegment(ticks) => format!("{ticks:?}"),
        };
        out.push_str(&format!("\n  {}: {ticks}", vehicle.id));
    }
    out
}

pub fn render_report(config: &Config, report: &SimReport) -> String {
    let mut out = format!(
        "{} vehicle(s) crossed {} segment(s) with the {} strategy in {} tick(s)",
        report.trajectories.len(),
        config.highway.segments,
        config.strategy,
        report.ticks
    );
    for (vehicle, trajectory) in &report.trajectories {
        let route: Vec<String> = trajectory.iter().map(ToString::to_string).collect();
        out.push_str(&format!("\n  {vehicle}: {}", route.join(" -> ")));
    }
    out
}
