//! End-to-end dispatch planning.
//!
//! [`DispatchPlanner`] validates a request, groups its orders per truck,
//! repairs overloaded groups, then sequences and stitches every group. Tour
//! search runs on the blocking pool and stitching on the async runtime, with
//! at most [`PlannerConfig::worker_limit`] groups in flight.

use std::sync::Arc;
use std::time::Duration;

use dispatch_core::{
    AssignError, CapacityRebalancer, ClusterAssignment, DEFAULT_CAPACITY_KG, DEFAULT_DEPOT,
    DEFAULT_TOUR_TIME_LIMIT, Depot, GroupAssigner, GroupLabel, InputError, LegProvider,
    OptimizationResult, OptimizeRequest, Order, Route, Sequencer, Tour, TourError, TourSolver,
    UNASSIGNED,
};
use dispatch_routing::RouteStitcher;
use futures_util::stream::{self, StreamExt};
use log::{info, warn};
use thiserror::Error;

/// Truck groups planned concurrently unless configured otherwise.
pub const DEFAULT_WORKER_LIMIT: usize = 4;

/// Errors that abort an optimisation call.
///
/// Tour and routing failures never surface here: they degrade a single
/// truck or fall back to estimated legs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    /// The request was malformed.
    #[error("invalid request: {0}")]
    Input(#[from] InputError),
    /// Grouping orders per truck failed.
    #[error("order grouping failed: {0}")]
    Assignment(#[from] AssignError),
}

/// Tunables for [`DispatchPlanner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerConfig {
    /// Maximum load per truck in kilograms.
    pub capacity_kg: f64,
    /// Where every route starts and ends.
    pub depot: Depot,
    /// Wall-clock budget for each truck's tour search.
    pub tour_time_limit: Duration,
    /// Truck groups planned concurrently.
    pub worker_limit: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            capacity_kg: DEFAULT_CAPACITY_KG,
            depot: DEFAULT_DEPOT,
            tour_time_limit: DEFAULT_TOUR_TIME_LIMIT,
            worker_limit: DEFAULT_WORKER_LIMIT,
        }
    }
}

impl PlannerConfig {
    /// Set the truck capacity.
    #[must_use]
    pub const fn with_capacity_kg(mut self, capacity_kg: f64) -> Self {
        self.capacity_kg = capacity_kg;
        self
    }

    /// Set the depot.
    #[must_use]
    pub const fn with_depot(mut self, depot: Depot) -> Self {
        self.depot = depot;
        self
    }

    /// Set the per-truck tour search budget.
    #[must_use]
    pub const fn with_tour_time_limit(mut self, tour_time_limit: Duration) -> Self {
        self.tour_time_limit = tour_time_limit;
        self
    }

    /// Set how many groups are planned at once (minimum one).
    #[must_use]
    pub const fn with_worker_limit(mut self, worker_limit: usize) -> Self {
        self.worker_limit = if worker_limit == 0 { 1 } else { worker_limit };
        self
    }
}

/// One planned group: its route and any orders pushed back to unassigned.
struct GroupPlan {
    route: Route,
    demoted: Vec<String>,
}

/// Plans delivery routes for a batch of orders.
///
/// The planner is generic over its three capabilities so each can be swapped
/// for a deterministic double in tests.
///
/// # Examples
///
/// ```no_run
/// use dispatch_engine::{
///     CheapestArcSolver, DispatchPlanner, KMeansAssigner, OptimizeRequest, OsrmLegProvider,
///     PlannerConfig, sample_orders,
/// };
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let planner = DispatchPlanner::new(
///     KMeansAssigner::default(),
///     CheapestArcSolver::default(),
///     OsrmLegProvider::new("http://localhost:5000")?,
///     PlannerConfig::default(),
/// );
/// let request = OptimizeRequest::from_orders(&sample_orders(50, 42), 5);
/// let result = planner.optimize(&request).await?;
/// println!("{} routes", result.routes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DispatchPlanner<A, T, P> {
    assigner: A,
    sequencer: Arc<Sequencer<T>>,
    stitcher: RouteStitcher<P>,
    rebalancer: CapacityRebalancer,
    config: PlannerConfig,
}

impl<A, T, P> DispatchPlanner<A, T, P>
where
    A: GroupAssigner,
    T: TourSolver + 'static,
    P: LegProvider,
{
    /// Create a planner whose stitcher uses the process-wide leg cache.
    #[must_use]
    pub fn new(assigner: A, solver: T, provider: P, config: PlannerConfig) -> Self {
        Self::with_stitcher(assigner, solver, RouteStitcher::new(provider), config)
    }

    /// Create a planner around a preconfigured stitcher.
    #[must_use]
    pub fn with_stitcher(
        assigner: A,
        solver: T,
        stitcher: RouteStitcher<P>,
        config: PlannerConfig,
    ) -> Self {
        let sequencer =
            Sequencer::new(solver, config.depot).with_time_limit(config.tour_time_limit);
        Self {
            assigner,
            sequencer: Arc::new(sequencer),
            stitcher,
            rebalancer: CapacityRebalancer::new(config.capacity_kg),
            config,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Stitcher used for road legs.
    #[must_use]
    pub const fn stitcher(&self) -> &RouteStitcher<P> {
        &self.stitcher
    }

    /// Plan routes for `request`.
    ///
    /// Every order ends up either on exactly one route or in
    /// `unassigned_order_ids`. Orders are unassigned when no truck has room
    /// for them or when their truck's tour search fails; in the latter case
    /// the truck's route is returned empty with `degraded` set.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizeError::Input`] for malformed requests and
    /// [`OptimizeError::Assignment`] when grouping fails.
    pub async fn optimize(
        &self,
        request: &OptimizeRequest,
    ) -> Result<OptimizationResult, OptimizeError> {
        let validated = request.validate()?;
        let orders = validated.orders;

        let mut assignment = self.assigner.assign(&orders, validated.truck_count)?;
        assignment.ensure_covers(&orders)?;
        let report = self.rebalancer.rebalance(&orders, &mut assignment);

        let plans: Vec<GroupPlan> = stream::iter(assignment.occupied_groups())
            .map(|label| self.plan_group(label, members_of(&assignment, label, &orders)))
            .buffered(self.config.worker_limit.max(1))
            .collect()
            .await;

        let mut unassigned_order_ids: Vec<String> = members_of(&assignment, UNASSIGNED, &orders)
            .into_iter()
            .map(|order| order.id)
            .collect();
        let mut routes = Vec::with_capacity(plans.len());
        for plan in plans {
            unassigned_order_ids.extend(plan.demoted);
            routes.push(plan.route);
        }

        let result = OptimizationResult {
            truck_count_used: routes.len(),
            capacity_limit: self.config.capacity_kg,
            order_count: orders.len(),
            total_distance: round_km(routes.iter().map(|route| route.total_distance).sum()),
            routes,
            unassigned_order_ids,
        };
        info!(
            "planned {} orders on {} routes ({} km, {} moved, {} unassigned)",
            result.order_count,
            result.truck_count_used,
            result.total_distance,
            report.moved,
            result.unassigned_order_ids.len()
        );
        Ok(result)
    }

    async fn plan_group(&self, label: GroupLabel, stops: Vec<Order>) -> GroupPlan {
        let ids: Vec<String> = stops.iter().map(|order| order.id.clone()).collect();
        let sequencer = Arc::clone(&self.sequencer);
        let searched = tokio::task::spawn_blocking(move || sequencer.sequence(&stops)).await;

        let tour = match searched {
            Ok(Ok(tour)) => tour,
            Ok(Err(err)) => return degrade(label, &err, ids),
            Err(join_err) => {
                let err = TourError::NoSolution {
                    reason: join_err.to_string(),
                };
                return degrade(label, &err, ids);
            }
        };

        let stitched = self
            .stitcher
            .stitch(self.config.depot.location, &tour.stops)
            .await;
        GroupPlan {
            route: Route {
                route_id: label,
                stop_sequence: tour.order_ids().map(str::to_owned).collect(),
                truck_load: tour_load(&tour),
                total_distance: stitched.total_distance,
                total_duration: stitched.total_duration,
                polyline: stitched.polyline,
                delivery_polyline: stitched.delivery_polyline,
                return_polyline: stitched.return_polyline,
                stop_etas: stitched.stop_etas,
                has_fallback: stitched.has_fallback,
                degraded: false,
                legs: stitched.legs,
            },
            demoted: Vec::new(),
        }
    }
}

fn degrade(label: GroupLabel, err: &TourError, demoted: Vec<String>) -> GroupPlan {
    warn!("tour search failed for truck {label}, unassigning its orders: {err}");
    GroupPlan {
        route: Route::degraded(label),
        demoted,
    }
}

fn members_of(assignment: &ClusterAssignment, label: GroupLabel, orders: &[Order]) -> Vec<Order> {
    assignment
        .members(label)
        .filter_map(|index| orders.get(index).cloned())
        .collect()
}

fn tour_load(tour: &Tour) -> f64 {
    tour.stops.iter().map(|order| order.weight_kg).sum()
}

#[expect(clippy::float_arithmetic, reason = "rounding to metres")]
fn round_km(km: f64) -> f64 {
    (km * 1000.0).round() / 1000.0
}
