//! `vrp-core` modelling of a single truck's closed tour.
//!
//! Each stop becomes a job at its matrix index and one vehicle starts and
//! ends at the depot (index `0`). The goal minimises unassigned jobs first
//! and travelled distance second.

use std::sync::Arc;
use std::time::Duration;

use dispatch_core::{DistanceMatrix, TourError, TourSolver};
use log::debug;
use vrp_core::models::common::{Location, Profile};
use vrp_core::models::problem::TravelTime;
use vrp_core::models::solution::Route as VrpRoute;
use vrp_core::prelude::*;
use vrp_core::utils::{Quota, TimeQuota};

/// Configuration for [`VrpTourSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VrpTourSolverConfig {
    /// Upper bound on `vrp-core` generations.
    pub max_generations: usize,
}

impl Default for VrpTourSolverConfig {
    fn default() -> Self {
        Self {
            max_generations: 200,
        }
    }
}

/// [`TourSolver`] delegating to the `vrp-core` metaheuristics.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dispatch_core::{DistanceMatrix, TourSolver};
/// use dispatch_solver::VrpTourSolver;
///
/// let matrix = DistanceMatrix::from_rows(vec![
///     vec![0, 2, 3],
///     vec![2, 0, 1],
///     vec![3, 1, 0],
/// ])
/// .expect("square");
/// let mut tour = VrpTourSolver::default().solve(&matrix, Duration::from_secs(1))?;
/// tour.sort_unstable();
/// assert_eq!(tour, vec![1, 2]);
/// # Ok::<(), dispatch_core::TourError>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VrpTourSolver {
    config: VrpTourSolverConfig,
}

impl VrpTourSolver {
    /// Construct a solver with explicit configuration.
    #[must_use]
    pub const fn with_config(config: VrpTourSolverConfig) -> Self {
        Self { config }
    }
}

impl TourSolver for VrpTourSolver {
    fn solve(&self, matrix: &DistanceMatrix, time_limit: Duration) -> Result<Vec<usize>, TourError> {
        // Zero or one stop leaves nothing to search.
        if matrix.size() <= 2 {
            return Ok((1..matrix.size()).collect());
        }
        let transport = Arc::new(MatrixTransportCost::new(matrix));
        let goal = define_goal(transport.clone()).map_err(|err| no_solution(&err))?;
        let problem = define_problem(matrix.size(), goal, transport)
            .map(Arc::new)
            .map_err(|err| no_solution(&err))?;

        let vrp_config = VrpConfigBuilder::new(problem.clone())
            .set_environment(Arc::new(search_environment(time_limit)))
            .prebuild()
            .map_err(|err| no_solution(&err))?
            .with_max_generations(Some(self.config.max_generations))
            .build()
            .map_err(|err| no_solution(&err))?;

        let solution = vrp_core::solver::Solver::new(problem, vrp_config)
            .solve()
            .map_err(|err| no_solution(&err))?;
        if !solution.unassigned.is_empty() {
            return Err(TourError::NoSolution {
                reason: format!("{} stops left unassigned", solution.unassigned.len()),
            });
        }

        let tour: Vec<usize> = solution
            .get_locations()
            .flatten()
            .filter(|&location| location != 0)
            .collect();
        debug!("vrp-core sequenced {} stops", tour.len());
        Ok(tour)
    }
}

/// Search environment whose quota stops the evolution at `time_limit` and
/// whose telemetry goes to the `log` facade instead of stdout.
fn search_environment(time_limit: Duration) -> Environment {
    let quota: Arc<dyn Quota> = Arc::new(TimeQuota::new(time_limit.as_secs_f64()));
    let logger: InfoLogger = Arc::new(|message: &str| debug!("vrp-core: {message}"));
    Environment {
        quota: Some(quota),
        logger,
        ..Environment::default()
    }
}

fn no_solution(err: &GenericError) -> TourError {
    TourError::NoSolution {
        reason: err.to_string(),
    }
}

fn define_goal(transport: Arc<dyn TransportCost>) -> GenericResult<GoalContext> {
    let minimize_unassigned = MinimizeUnassignedBuilder::new("min-unassigned").build()?;
    let transport_feature = TransportFeatureBuilder::new("min-distance")
        .set_transport_cost(transport)
        .set_time_constrained(false)
        .build_minimize_distance()?;

    GoalContextBuilder::with_features(&[minimize_unassigned, transport_feature])?.build()
}

fn define_problem(
    size: usize,
    goal: GoalContext,
    transport: Arc<dyn TransportCost>,
) -> GenericResult<Problem> {
    let jobs = (1..size)
        .map(|location| {
            SingleBuilder::default()
                .id(format!("stop{location}").as_str())
                .location(location)?
                .build_as_job()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let vehicle = VehicleBuilder::default()
        .id("truck")
        .add_detail(
            VehicleDetailBuilder::default()
                .set_start_location(0)
                .set_end_location(0)
                .build()?,
        )
        .build()?;

    ProblemBuilder::default()
        .add_jobs(jobs.into_iter())
        .add_vehicles(std::iter::once(vehicle))
        .with_goal(goal)
        .with_transport_cost(transport)
        .build()
}

struct MatrixTransportCost {
    size: usize,
    costs: Vec<f64>,
}

impl MatrixTransportCost {
    #[expect(
        clippy::cast_precision_loss,
        reason = "scaled matrix costs stay far below 2^52"
    )]
    fn new(matrix: &DistanceMatrix) -> Self {
        let size = matrix.size();
        let costs = (0..size)
            .flat_map(|from| (0..size).map(move |to| (from, to)))
            .map(|(from, to)| matrix.get(from, to) as f64)
            .collect();
        Self { size, costs }
    }

    fn cost(&self, from: Location, to: Location) -> f64 {
        let value = self.costs.get(from * self.size + to).copied();
        debug_assert!(value.is_some(), "Matrix lookup failed: from={from}, to={to}");
        value.unwrap_or(0.0)
    }
}

impl TransportCost for MatrixTransportCost {
    // The matrix carries one value, so distance and duration coincide and
    // the route and departure parameters are unused.
    fn distance(
        &self,
        _route: &VrpRoute,
        from: Location,
        to: Location,
        _departure: TravelTime,
    ) -> Cost {
        self.cost(from, to)
    }

    fn duration(
        &self,
        _route: &VrpRoute,
        from: Location,
        to: Location,
        _departure: TravelTime,
    ) -> f64 {
        self.cost(from, to)
    }

    fn distance_approx(&self, _profile: &Profile, from: usize, to: usize) -> f64 {
        self.cost(from, to)
    }

    fn duration_approx(&self, _profile: &Profile, from: usize, to: usize) -> f64 {
        self.cost(from, to)
    }
}
