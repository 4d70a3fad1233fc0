#![forbid(unsafe_code)]

//! `stawatch`: long-running station reachability / stability test.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use stawatch_core::StationId;
use stawatch_runner::{interrupt_shutdown, prober_from_config, Config, Monitor, TargetSource};

mod prompt;

#[derive(Debug, Parser)]
#[command(name = "stawatch", version, about = "Station reachability stability monitor")]
struct Cli {
    /// Config file (default: ./stawatch.toml if present, else built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Run the stability test
    Run {
        /// Station to monitor (repeatable)
        #[arg(long = "target")]
        targets: Vec<String>,

        /// File with one station per line, re-read every cycle
        #[arg(long)]
        targets_file: Option<PathBuf>,

        /// Seconds to sleep between cycles
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Total test duration in seconds
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Directory for the stability logs
        #[arg(long)]
        log_dir: Option<String>,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,

        /// Print the run summary as JSON when done
        #[arg(long)]
        json: bool,
    },

    /// Probe stations once and print the result
    Probe {
        #[arg(required = true)]
        stations: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Init { force } => {
            let path = cli.config.unwrap_or_else(|| PathBuf::from(Config::DEFAULT_FILE));
            init_config(&path, force)?;
            println!("Wrote default config to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            targets,
            targets_file,
            interval_secs,
            duration_secs,
            log_dir,
            yes,
            json,
        } => {
            let mut cfg = Config::load_or_default(cli.config.as_deref())?;
            if let Some(v) = interval_secs {
                cfg.monitor.interval_secs = v;
            }
            if let Some(v) = duration_secs {
                cfg.monitor.duration_secs = v;
            }
            if let Some(v) = log_dir {
                cfg.logs.dir = v;
            }
            cfg.validate()?;

            let source = match resolve_targets(&cfg, &targets, targets_file.as_deref()) {
                Some(source) => source,
                None => {
                    println!("=== Step 1: Provide STA IP Addresses ===");
                    let stations = prompt::prompt_stations(&mut io::stdin().lock(), &mut io::stdout())?;
                    TargetSource::Static(stations)
                }
            };

            let initial = source.load()?;
            if initial.is_empty() {
                println!("No STA IP addresses provided. Exiting.");
                return Ok(ExitCode::from(1));
            }
            println!("\nMonitoring the following STAs: {}", join_names(&initial));

            if !yes {
                println!("\n=== Step 2: Starting Stability Test ===");
                let go = prompt::confirm(
                    &mut io::stdin().lock(),
                    &mut io::stdout(),
                    "Do you want to proceed with the stability test?",
                )?;
                if !go {
                    println!("Test aborted by the user.");
                    return Ok(ExitCode::SUCCESS);
                }
            }

            println!("\n=== Stability Test Running ===");
            let shutdown = interrupt_shutdown();
            let mut monitor = Monitor::from_config(&cfg, source)?;
            let summary = monitor.run(shutdown).await?;

            if json {
                let mut out = io::stdout().lock();
                serde_json::to_writer_pretty(&mut out, &summary)?;
                writeln!(out)?;
            } else {
                println!(
                    "{} cycle(s), {} outage(s) recorded, {} station(s) still unreachable",
                    summary.cycles,
                    summary.outages.len(),
                    summary.still_unreachable.len()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Probe { stations } => {
            let cfg = Config::load_or_default(cli.config.as_deref())?;
            cfg.validate()?;
            let prober = prober_from_config(&cfg.probe);

            let mut all_up = true;
            for station in stations.iter().filter_map(|s| StationId::parse(s)) {
                match prober.probe(&station).await {
                    Ok(true) => println!("{station}: reachable"),
                    Ok(false) => {
                        all_up = false;
                        println!("{station}: NOT reachable");
                    }
                    Err(e) => {
                        all_up = false;
                        println!("{station}: probe error: {e:#}");
                    }
                }
            }
            Ok(if all_up { ExitCode::SUCCESS } else { ExitCode::from(1) })
        }
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().save_to(path)
}

/// Command-line targets win over the config file. `None` means the
/// operator has to be asked.
fn resolve_targets(cfg: &Config, cli_targets: &[String], cli_file: Option<&Path>) -> Option<TargetSource> {
    if let Some(path) = cli_file {
        return Some(TargetSource::File(path.to_path_buf()));
    }
    if !cli_targets.is_empty() {
        return Some(TargetSource::from_list(cli_targets));
    }
    if let Some(path) = cfg.targets.file_path() {
        return Some(TargetSource::File(path));
    }
    if !cfg.targets.stations.is_empty() {
        return Some(TargetSource::from_list(&cfg.targets.stations));
    }
    None
}

fn join_names(stations: &[StationId]) -> String {
    stations.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
}
