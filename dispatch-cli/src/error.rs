//! Error types emitted by the dispatch CLI.
//!
//! Keep this error type reasonably small, as every CLI helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use dispatch_engine::{InputError, OptimizeError, PlanAuditError, ProviderBuildError};
use thiserror::Error;

/// Errors emitted by the dispatch CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name of the missing option.
        field: &'static str,
        /// Environment variable that could supply it.
        env: &'static str,
    },
    /// Both a request file and a generated sample were asked for.
    #[error("pass either a request path or --sample, not both")]
    ConflictingRequestSources,
    /// A numeric option was outside its accepted range.
    #[error("--{field} must be {expectation}, got {value}")]
    InvalidOption {
        /// Flag name of the rejected option.
        field: &'static str,
        /// Human-readable constraint.
        expectation: &'static str,
        /// The rejected value, rendered.
        value: String,
    },
    /// The requested operation requires a missing compile-time feature.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        /// Cargo feature name.
        feature: &'static str,
        /// What the caller tried to do.
        action: &'static str,
    },
    /// Opening the request file failed.
    #[error("failed to open request at {path:?}: {source}")]
    OpenRequest {
        /// Request path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Request JSON could not be decoded.
    #[error("failed to parse request JSON at {path:?}: {source}")]
    ParseRequest {
        /// Request path.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The request payload failed validation.
    #[error("request failed validation: {0}")]
    InvalidRequest(#[source] InputError),
    /// The batch outweighs the whole fleet and strict checking is on.
    #[error(
        "orders weigh {total_kg} kg but {trucks} trucks carry at most {fleet_kg} kg"
    )]
    FleetCapacityExceeded {
        /// Summed order weight.
        total_kg: f64,
        /// Trucks available.
        trucks: i64,
        /// Combined fleet capacity.
        fleet_kg: f64,
    },
    /// Constructing the OSRM leg provider failed.
    #[error("failed to build leg provider for {base_url:?}: {source}")]
    BuildLegProvider {
        /// Configured base URL.
        base_url: String,
        /// Construction error.
        #[source]
        source: ProviderBuildError,
    },
    /// The async runtime could not start.
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The planner rejected the request.
    #[error("optimisation failed: {0}")]
    Optimize(#[from] OptimizeError),
    /// The plan broke a structural guarantee.
    #[error("plan failed its audit: {0}")]
    Audit(#[from] PlanAuditError),
    /// Serialising the result failed.
    #[error("failed to serialise optimisation result: {0}")]
    SerialiseResult(#[source] serde_json::Error),
    /// Creating the output file failed.
    #[error("failed to create output file {path:?}: {source}")]
    CreateOutput {
        /// Output path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Writing the result failed.
    #[error("failed to write optimisation output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
