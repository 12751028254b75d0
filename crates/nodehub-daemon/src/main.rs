//! Nodehub Daemon - Main entry point
//!
//! Drives the configured hardware adapters against the node registry. Host
//! calls arrive as JSON lines on stdin; outbound messages go to stdout.

mod adapter;
mod config;
mod daemon;
mod host;
mod inbound;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::daemon::{Daemon, Flow};

#[derive(Parser, Debug)]
#[command(name = "nodehub")]
#[command(about = "Hardware node registry daemon")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "nodehub.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Stamp newly added nodes with developer mode
    #[arg(long)]
    developer: bool,

    /// Write an example configuration to the given path and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.dump_config {
        config::save_default_config(path)?;
        println!("Wrote example configuration to {}", path.display());
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;
    if args.developer {
        config.registry.developer = true;
    }

    // Initialize logging; stdout carries the host message stream
    let mut level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    if config.registry.debug && level == Level::INFO {
        level = Level::DEBUG;
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Nodehub v{}", env!("CARGO_PKG_VERSION"));
    info!(
        objects = config.objects.len(),
        adapters = config.adapters.len(),
        base_dir = %config.registry.base_dir.display(),
        "Configuration loaded"
    );

    let mut ticker = interval(Duration::from_millis(config.daemon.tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut resets = (config.daemon.reset_interval_secs > 0).then(|| {
        let mut resets = interval(Duration::from_secs(config.daemon.reset_interval_secs));
        resets.set_missed_tick_behavior(MissedTickBehavior::Delay);
        resets.reset();
        resets
    });

    let mut daemon = Daemon::new(config, std::io::stdout());
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => daemon.tick(),
            _ = next_reset(&mut resets) => {
                daemon.reset();
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if daemon.handle_line(&line) == Flow::Stop {
                        info!("Shutdown requested by host");
                        break;
                    }
                }
                Ok(None) => {
                    info!("Host input closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read host input");
                    break;
                }
            },
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }
    }

    let report = daemon.shutdown();
    info!(
        objects = daemon.registry().store().len(),
        hook_failures = report.failures.len(),
        "Nodehub stopped"
    );
    Ok(())
}

/// Wait for the next periodic reset, forever when resets are disabled
async fn next_reset(resets: &mut Option<Interval>) {
    match resets {
        Some(resets) => {
            resets.tick().await;
        }
        None => std::future::pending().await,
    }
}
