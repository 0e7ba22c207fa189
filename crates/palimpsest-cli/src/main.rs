//! Palimpsest CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use palimpsest::OverlayError;
use palimpsest_cli::{Args, error_adapter::to_reportables};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();
    init_logging(&args.log_level);
    debug!(args:?; "Parsed arguments");

    if let Err(err) = palimpsest_cli::run(&args) {
        report(&err);
        process::exit(1);
    }

    info!("Completed successfully");
}

/// Sets up `env_logger`, falling back to `warn` for unknown level names.
fn init_logging(level: &str) {
    let log_level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });

    // RUST_LOG still refines individual modules
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Palimpsest");
}

/// Renders every diagnostic carried by `err` through miette.
fn report(err: &OverlayError) {
    let reporter = miette::GraphicalReportHandler::new();

    for reportable in to_reportables(err) {
        let mut rendered = String::new();
        match reporter.render_report(&mut rendered, &reportable) {
            Ok(()) => error!("{rendered}"),
            // Fall back to the plain message
            Err(_) => error!("{reportable}"),
        }
    }
}
