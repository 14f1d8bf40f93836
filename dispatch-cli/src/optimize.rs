//! `optimize` command implementation.

use std::io::{BufReader, Write};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
#[cfg(feature = "solver-vrp")]
use dispatch_engine::VrpTourSolver;
use dispatch_engine::{
    CheapestArcSolver, DEFAULT_DEPOT, DEFAULT_TRUCK_COUNT, Depot, DispatchPlanner,
    FallbackEstimator, KMeansAssigner, LegProvider, OptimizationResult, OptimizeRequest,
    OsrmLegProvider, OsrmLegProviderConfig, PlannerConfig, TourSolver, sample_orders,
};
use log::{debug, info};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::fs::{create_utf8_file, open_utf8_file};
use crate::{
    ARG_CAPACITY_KG, ARG_DEPOT_LAT, ARG_DEPOT_LNG, ARG_OFFLINE, ARG_OSRM_BASE_URL, ARG_OUTPUT,
    ARG_REQUEST, ARG_SAMPLE, ARG_SEED, ARG_SOLVER, ARG_STRICT_FLEET_CAPACITY,
    ARG_TOUR_TIME_LIMIT_MS, ARG_TRUCKS, ARG_WORKERS, CliError, ENV_REQUEST,
};

/// Seed for `--sample` batches unless `--seed` is given.
pub(crate) const DEFAULT_SAMPLE_SEED: u64 = 42;

/// Tour search backend selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum SolverKind {
    /// Greedy construction with 2-opt and or-opt improvement.
    #[default]
    CheapestArc,
    /// `vrp-core` metaheuristics.
    Vrp,
}

/// CLI arguments for the `optimize` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Plan routes for a JSON-encoded batch of orders. Orders are \
                 grouped per truck, overloaded groups are repaired, and every \
                 truck's tour is routed over OSRM, falling back to straight-line \
                 estimates when the service is unavailable.",
    about = "Plan delivery routes for a batch of orders"
)]
#[ortho_config(prefix = "DISPATCH")]
pub(crate) struct OptimizeArgs {
    /// Path to a JSON file containing an optimisation request.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// Plan a generated batch of this many orders instead of a file.
    #[arg(long = ARG_SAMPLE, value_name = "count")]
    #[serde(default)]
    pub(crate) sample: Option<usize>,
    /// Seed for the generated batch.
    #[arg(long = ARG_SEED, value_name = "seed")]
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    /// Base URL for the OSRM server (e.g. "http://localhost:5000").
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// Maximum load per truck in kilograms.
    #[arg(long = ARG_CAPACITY_KG, value_name = "kg")]
    #[serde(default)]
    pub(crate) capacity_kg: Option<f64>,
    /// Depot latitude in degrees.
    #[arg(long = ARG_DEPOT_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) depot_lat: Option<f64>,
    /// Depot longitude in degrees.
    #[arg(long = ARG_DEPOT_LNG, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) depot_lng: Option<f64>,
    /// Override the fleet size given in the request.
    #[arg(long = ARG_TRUCKS, value_name = "count")]
    #[serde(default)]
    pub(crate) trucks: Option<i64>,
    /// Wall-clock budget for each truck's tour search, in milliseconds.
    #[arg(long = ARG_TOUR_TIME_LIMIT_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) tour_time_limit_ms: Option<u64>,
    /// Truck groups planned concurrently.
    #[arg(long = ARG_WORKERS, value_name = "count")]
    #[serde(default)]
    pub(crate) workers: Option<usize>,
    /// Tour search backend.
    #[arg(long = ARG_SOLVER, value_enum, value_name = "solver")]
    #[serde(default)]
    pub(crate) solver: Option<SolverKind>,
    /// Reject batches heavier than the whole fleet can carry.
    #[arg(
        long = ARG_STRICT_FLEET_CAPACITY,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) strict_fleet_capacity: Option<bool>,
    /// Skip OSRM and route every leg with straight-line estimates.
    #[arg(
        long = ARG_OFFLINE,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) offline: Option<bool>,
    /// Write the result here instead of standard output.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

impl OptimizeArgs {
    pub(crate) fn into_config(self) -> Result<OptimizeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        OptimizeConfig::try_from(merged)
    }
}

/// Where the orders come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RequestSource {
    /// A JSON request on disk.
    File(Utf8PathBuf),
    /// A generated batch around the default depot.
    Sample { count: usize, seed: u64 },
}

/// Resolved `optimize` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OptimizeConfig {
    pub(crate) source: RequestSource,
    pub(crate) osrm_base_url: String,
    pub(crate) planner: PlannerConfig,
    /// Fleet size overriding the request's own.
    pub(crate) trucks: Option<i64>,
    pub(crate) solver: SolverKind,
    pub(crate) strict_fleet_capacity: bool,
    pub(crate) offline: bool,
    pub(crate) output: Option<Utf8PathBuf>,
}

impl TryFrom<OptimizeArgs> for OptimizeConfig {
    type Error = CliError;

    fn try_from(args: OptimizeArgs) -> Result<Self, Self::Error> {
        let source = match (args.request_path, args.sample) {
            (Some(path), None) => RequestSource::File(path),
            (None, Some(0)) => return Err(invalid(ARG_SAMPLE, "at least 1", 0)),
            (None, Some(count)) => RequestSource::Sample {
                count,
                seed: args.seed.unwrap_or(DEFAULT_SAMPLE_SEED),
            },
            (Some(_), Some(_)) => return Err(CliError::ConflictingRequestSources),
            (None, None) => {
                return Err(CliError::MissingArgument {
                    field: ARG_REQUEST,
                    env: ENV_REQUEST,
                });
            }
        };

        let defaults = PlannerConfig::default();
        let capacity_kg = args.capacity_kg.unwrap_or(defaults.capacity_kg);
        if !capacity_kg.is_finite() || capacity_kg <= 0.0 {
            return Err(invalid(ARG_CAPACITY_KG, "a positive weight", capacity_kg));
        }
        let depot_lat = args.depot_lat.unwrap_or(DEFAULT_DEPOT.lat());
        if !(-90.0..=90.0).contains(&depot_lat) {
            return Err(invalid(ARG_DEPOT_LAT, "within ±90°", depot_lat));
        }
        let depot_lng = args.depot_lng.unwrap_or(DEFAULT_DEPOT.lng());
        if !(-180.0..=180.0).contains(&depot_lng) {
            return Err(invalid(ARG_DEPOT_LNG, "within ±180°", depot_lng));
        }
        if let Some(trucks) = args.trucks
            && trucks <= 0
        {
            return Err(invalid(ARG_TRUCKS, "at least 1", trucks));
        }
        let workers = args.workers.unwrap_or(defaults.worker_limit);
        if workers == 0 {
            return Err(invalid(ARG_WORKERS, "at least 1", workers));
        }
        let tour_time_limit = args
            .tour_time_limit_ms
            .map_or(defaults.tour_time_limit, Duration::from_millis);

        let planner = defaults
            .with_capacity_kg(capacity_kg)
            .with_depot(Depot::new(depot_lat, depot_lng))
            .with_tour_time_limit(tour_time_limit)
            .with_worker_limit(workers);
        let osrm_base_url = args
            .osrm_base_url
            .unwrap_or_else(|| OsrmLegProviderConfig::default().base_url);

        Ok(Self {
            source,
            osrm_base_url,
            planner,
            trucks: args.trucks,
            solver: args.solver.unwrap_or_default(),
            strict_fleet_capacity: args.strict_fleet_capacity.unwrap_or(false),
            offline: args.offline.unwrap_or(false),
            output: args.output,
        })
    }
}

fn invalid(field: &'static str, expectation: &'static str, value: impl ToString) -> CliError {
    CliError::InvalidOption {
        field,
        expectation,
        value: value.to_string(),
    }
}

/// Builds the leg provider for the current optimize invocation.
pub(super) trait LegProviderBuilder {
    fn build(&self, config: &OptimizeConfig) -> Result<Box<dyn LegProvider>, CliError>;
}

/// OSRM-backed provider, or straight-line estimates when offline.
pub(super) struct DefaultLegProviderBuilder;

impl LegProviderBuilder for DefaultLegProviderBuilder {
    fn build(&self, config: &OptimizeConfig) -> Result<Box<dyn LegProvider>, CliError> {
        if config.offline {
            info!("offline mode: every leg is a straight-line estimate");
            return Ok(Box::new(FallbackEstimator::default()));
        }
        let provider = OsrmLegProvider::new(config.osrm_base_url.clone()).map_err(|source| {
            CliError::BuildLegProvider {
                base_url: config.osrm_base_url.clone(),
                source,
            }
        })?;
        Ok(Box::new(provider))
    }
}

pub(super) fn run_optimize(args: OptimizeArgs) -> Result<(), CliError> {
    // Unlocked handle: planning threads may print while the plan is built,
    // so stdout is only locked by the final write.
    let mut stdout = std::io::stdout();
    let builder = DefaultLegProviderBuilder;
    run_optimize_with(args, &builder, &mut stdout)
}

pub(super) fn run_optimize_with(
    args: OptimizeArgs,
    builder: &dyn LegProviderBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let result = execute_optimize(&config, builder)?;
    match &config.output {
        Some(path) => {
            let mut file = create_utf8_file(path).map_err(|source| CliError::CreateOutput {
                path: path.clone(),
                source,
            })?;
            write_optimization_result(&mut file, &result)?;
            info!("wrote {} routes to {path}", result.routes.len());
            Ok(())
        }
        None => write_optimization_result(writer, &result),
    }
}

/// Load, check, plan and audit one request.
pub(super) fn execute_optimize(
    config: &OptimizeConfig,
    builder: &dyn LegProviderBuilder,
) -> Result<OptimizationResult, CliError> {
    let mut request = load_request_source(&config.source)?;
    if let Some(trucks) = config.trucks {
        request.truck_count = trucks;
    }
    let validated = request.validate().map_err(CliError::InvalidRequest)?;
    if config.strict_fleet_capacity {
        check_fleet_capacity(&request, config.planner.capacity_kg)?;
    }
    debug!(
        "planning {} orders for {} trucks",
        validated.orders.len(),
        validated.truck_count
    );

    let provider = builder.build(config)?;
    let result = match config.solver {
        SolverKind::CheapestArc => plan(CheapestArcSolver::default(), provider, config, &request)?,
        SolverKind::Vrp => plan_with_vrp(provider, config, &request)?,
    };
    result.audit(&validated.orders)?;
    Ok(result)
}

#[cfg(feature = "solver-vrp")]
fn plan_with_vrp(
    provider: Box<dyn LegProvider>,
    config: &OptimizeConfig,
    request: &OptimizeRequest,
) -> Result<OptimizationResult, CliError> {
    plan(VrpTourSolver::default(), provider, config, request)
}

#[cfg(not(feature = "solver-vrp"))]
fn plan_with_vrp(
    _provider: Box<dyn LegProvider>,
    _config: &OptimizeConfig,
    _request: &OptimizeRequest,
) -> Result<OptimizationResult, CliError> {
    Err(CliError::MissingFeature {
        feature: "solver-vrp",
        action: "--solver vrp",
    })
}

fn plan<T: TourSolver + 'static>(
    solver: T,
    provider: Box<dyn LegProvider>,
    config: &OptimizeConfig,
    request: &OptimizeRequest,
) -> Result<OptimizationResult, CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let planner = DispatchPlanner::new(KMeansAssigner::default(), solver, provider, config.planner);
    let result = runtime.block_on(planner.optimize(request))?;
    Ok(result)
}

/// Reject batches the whole fleet could not carry even if perfectly packed.
pub(super) fn check_fleet_capacity(
    request: &OptimizeRequest,
    capacity_kg: f64,
) -> Result<(), CliError> {
    let total_kg = request.total_weight_kg();
    // Fleet sizes are validated positive and small, so the conversion is exact.
    let fleet_kg = capacity_kg * request.truck_count as f64;
    if total_kg > fleet_kg {
        return Err(CliError::FleetCapacityExceeded {
            total_kg,
            trucks: request.truck_count,
            fleet_kg,
        });
    }
    Ok(())
}

fn load_request_source(source: &RequestSource) -> Result<OptimizeRequest, CliError> {
    match source {
        RequestSource::File(path) => {
            let request = load_optimize_request(path)?;
            info!("loaded {} orders from {path}", request.orders.len());
            Ok(request)
        }
        RequestSource::Sample { count, seed } => {
            info!("generated {count} sample orders with seed {seed}");
            Ok(OptimizeRequest::from_orders(
                &sample_orders(*count, *seed),
                DEFAULT_TRUCK_COUNT,
            ))
        }
    }
}

/// Loads a JSON-encoded [`OptimizeRequest`] from disk.
pub(super) fn load_optimize_request(path: &Utf8Path) -> Result<OptimizeRequest, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenRequest {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseRequest {
        path: path.to_path_buf(),
        source,
    })
}

fn write_optimization_result(
    writer: &mut dyn Write,
    result: &OptimizationResult,
) -> Result<(), CliError> {
    let mut payload = serde_json::to_string_pretty(result).map_err(CliError::SerialiseResult)?;
    payload.push('\n');
    writer
        .write_all(payload.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(CliError::WriteOutput)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<OptimizeConfig, CliError> {
    let merged = OptimizeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    OptimizeConfig::try_from(merged)
}
