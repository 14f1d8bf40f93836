//! Facade crate for the dispatch engine.
//!
//! Given a batch of delivery orders and a fleet size, the engine groups
//! orders per truck with seeded k-means, repairs groups that exceed the
//! truck capacity, sequences each group into a closed tour from the depot
//! and stitches the tour into a road route with totals, polylines and
//! arrival estimates.
//!
//! This crate re-exports the domain types and the production backends and
//! provides [`DispatchPlanner`], which runs the whole pipeline.

#![forbid(unsafe_code)]

mod planner;

pub use dispatch_core::{
    AssignError, ClusterAssignment, DEFAULT_CAPACITY_KG, DEFAULT_DEPOT, DEFAULT_TRUCK_COUNT,
    Depot, GroupAssigner, InputError, LegError, LegProvider, OptimizationResult, OptimizeRequest,
    Order, OrderRecord, PlanAuditError, Route, RouteLeg, StopEta, TourError, TourSolver,
    sample_orders,
};
pub use dispatch_routing::{
    FallbackEstimator, LegCache, OsrmLegProvider, OsrmLegProviderConfig, ProviderBuildError,
    RetryPolicy, RouteStitcher,
};
pub use dispatch_solver::{CheapestArcSolver, KMeansAssigner};
#[cfg(feature = "solver-vrp")]
pub use dispatch_solver::VrpTourSolver;
pub use planner::{DEFAULT_WORKER_LIMIT, DispatchPlanner, OptimizeError, PlannerConfig};
