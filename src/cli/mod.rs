//! CLI surface: run a simulation from config, or inspect the config.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::Result;
use crate::config::{self, Config, ConfigError, ConfigOverride};
use crate::highway::{Strategy, build};
use crate::sim::Simulation;

mod render;

#[derive(Parser, Debug)]
#[command(
    name = "carretera",
    version,
    about = "Concurrent highway simulation",
    infer_subcommands = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Config file (default: ./carretera.toml when present).
    #[arg(long, short = 'c', global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log more (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive every configured vehicle through the highway.
    Run(RunArgs),

    /// Print the effective config (file, env, flags) as TOML.
    CheckConfig(RunArgs),

    /// Write the default config to PATH.
    InitConfig {
        #[arg(default_value = config::DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Synchronization strategy: server or monitor.
    #[arg(long, short = 's')]
    pub strategy: Option<Strategy>,

    #[arg(long)]
    pub segments: Option<usize>,

    #[arg(long)]
    pub lanes: Option<usize>,

    /// Clock period in milliseconds.
    #[arg(long = "tick-ms", value_name = "MS")]
    pub tick_ms: Option<u64>,
}

impl RunArgs {
    fn overrides(&self) -> ConfigOverride {
        ConfigOverride {
            segments: self.segments,
            lanes: self.lanes,
            strategy: self.strategy,
            tick_interval_ms: self.tick_ms,
        }
    }
}

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

/// Run the CLI (used by bin).
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => {
            let config = effective_config(cli.config.as_deref(), &args)?;
            let highway = build(config.strategy, config.highway)?;
            let plan = config.to_plan()?;
            let report = Simulation::new(highway, plan).run()?;
            println!("{}", render::render_config(&config));
            println!("{}", render::render_report(&config, &report));
        }
        Commands::CheckConfig(args) => {
            let config = effective_config(cli.config.as_deref(), &args)?;
            let rendered = toml::to_string_pretty(&config).map_err(ConfigError::from)?;
            print!("{rendered}");
        }
        Commands::InitConfig { path } => {
            config::write_config(&path, &Config::default())?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

/// File and env layers, then the flags, then one validation of the result.
fn effective_config(path: Option<&Path>, args: &RunArgs) -> Result<Config> {
    let mut config = config::load_unvalidated(path)?;
    args.overrides().apply_to(&mut config);
    config.validate()?;
    Ok(config)
}
