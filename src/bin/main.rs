use std::path::Path;

use carretera::{cli, config, telemetry};

fn main() {
    let cli = cli::parse_from(std::env::args_os());

    let _telemetry_guard = init_tracing(cli.config.as_deref(), cli.verbose);

    if let Err(e) = cli::run(cli) {
        tracing::error!("error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(path: Option<&Path>, verbose: u8) -> telemetry::TelemetryGuard {
    let cfg = match config::load_unvalidated(path) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("config load failed, using default logging: {err}");
            config::Config::default()
        }
    };
    let telemetry_cfg = telemetry::TelemetryConfig::new(verbose, cfg.logging);
    telemetry::init(telemetry_cfg)
}
