//! SpaceFOM role-test federate binary.
//!
//! # Usage
//!
//! ```bash
//! # Run the RRFP federate for the default 10 seconds
//! spacefom-federate --role rrfp
//!
//! # Run the Master until Ctrl-C
//! spacefom-federate --role master --nostop
//! ```

use std::time::Duration;

use clap::Parser;
use spacefom_federate::{
    DriverConfig, FederateRun, RunOptions, RunProfile, SystemEnv, profiles::DEFAULT_FEDERATION,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// SpaceFOM role-test federate
#[derive(Parser, Debug)]
#[command(name = "spacefom-federate")]
#[command(about = "SpaceFOM role-test federate against a loopback RTI")]
#[command(version)]
struct Args {
    /// Federate to run
    #[arg(short, long, value_enum, default_value = "other")]
    role: RunProfile,

    /// Time to stop the simulation, in seconds
    #[arg(long, conflicts_with = "nostop")]
    stop: Option<f64>,

    /// Set no stop time on the simulation
    #[arg(long)]
    nostop: bool,

    /// Federation execution name
    #[arg(long, default_value = DEFAULT_FEDERATION)]
    federation: String,

    /// Seconds to wait for required federates and frame discovery
    #[arg(long, default_value = "60")]
    startup_timeout: u64,

    /// Seed for loopback notification order
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let run = FederateRun {
        profile: args.role,
        federation: args.federation,
        options: RunOptions::from_flags(args.stop, args.nostop)?,
        driver: DriverConfig {
            startup_timeout: Duration::from_secs(args.startup_timeout),
            ..Default::default()
        },
        seed: args.seed,
    };

    tracing::info!("SpaceFOM federate {} starting", run.profile);
    match run.options.run_duration {
        Some(seconds) => tracing::info!("Run duration: {}s", seconds),
        None => tracing::info!("No stop time; running until interrupted"),
    }

    run.execute(SystemEnv::new(), ctrl_c).await?;

    Ok(())
}

/// Resolves on Ctrl-C; never resolves if the signal cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Ctrl-C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}
