//! # J7-C Monitor
//!
//! Receive measurement values from a J7-C USB power monitor using BLE.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Parse flags and merge them with the optional config file
//!    - Reject unsupported output modes before touching Bluetooth
//!    - Open the output target (truncating files unless appending)
//!
//! 2. **Session**
//!    - Find and connect to the meter
//!    - Decode every measurement and write it to the output
//!    - Reconnect on loss when requested
//!
//! 3. **Shutdown**
//!    - Ctrl+C ends the session cleanly
//!    - Terminal errors exit with a code per error class (see `MeterError::exit_code`)

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, Level};
use tracing_appender::non_blocking::WorkerGuard;

use j7c_monitor::ble::BleTransport;
use j7c_monitor::cli::Args;
use j7c_monitor::error::MeterError;
use j7c_monitor::output::sink::open_sink;
use j7c_monitor::output::OutputFormatter;
use j7c_monitor::pipeline::Pipeline;
use j7c_monitor::session::SessionController;

/// Map the 0..=5 verbosity scale onto tracing levels
fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 | 3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Diagnostics go to stderr so stdout carries only data
fn init_logging(verbosity: u8) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(log_level(verbosity).into())
        )
        .with_writer(writer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _guard = init_logging(args.verbosity());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<MeterError>()
                .map(MeterError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    info!("J7-C Monitor v{} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Parsed arguments: {:?}", args);

    let config = args.to_config()?;
    let formatter = OutputFormatter::new(&config.output)?;
    let sink = open_sink(&config.output.target, config.output.append)
        .await
        .with_context(|| format!("Failed to open output {}", config.output.target))?;

    let pipeline = Pipeline::new(formatter, sink);
    let transport = BleTransport::new(&config.device.adapter, config.device.scan_window());
    let mut session = SessionController::new(transport, config.device.clone(), pipeline);

    tokio::select! {
        result = session.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    info!(
        "Total frames decoded: {} ({} fragments dropped)",
        session.pipeline().frames(),
        session.pipeline().dropped_fragments()
    );
    Ok(())
}
