//! Command-line interface for planning delivery routes.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod optimize;

pub use error::CliError;

use optimize::{OptimizeArgs, run_optimize};

pub(crate) const ARG_REQUEST: &str = "request-path";
pub(crate) const ARG_SAMPLE: &str = "sample";
pub(crate) const ARG_SEED: &str = "seed";
pub(crate) const ARG_OSRM_BASE_URL: &str = "osrm-base-url";
pub(crate) const ARG_CAPACITY_KG: &str = "capacity-kg";
pub(crate) const ARG_DEPOT_LAT: &str = "depot-lat";
pub(crate) const ARG_DEPOT_LNG: &str = "depot-lng";
pub(crate) const ARG_TRUCKS: &str = "trucks";
pub(crate) const ARG_TOUR_TIME_LIMIT_MS: &str = "tour-time-limit-ms";
pub(crate) const ARG_WORKERS: &str = "workers";
pub(crate) const ARG_SOLVER: &str = "solver";
pub(crate) const ARG_STRICT_FLEET_CAPACITY: &str = "strict-fleet-capacity";
pub(crate) const ARG_OFFLINE: &str = "offline";
pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ENV_REQUEST: &str = "DISPATCH_CMDS_OPTIMIZE_REQUEST_PATH";

/// Run the dispatch CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns a [`CliError`] when arguments, configuration, input files or the
/// optimisation itself fail.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Optimize(args) => run_optimize(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "dispatch",
    about = "Plan capacity-aware delivery routes for a truck fleet",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Group, sequence and route a batch of orders.
    Optimize(OptimizeArgs),
}

#[cfg(test)]
mod tests;
