//! Deterministic assigners, tour solvers and fixtures used by unit and
//! behaviour tests.

use std::time::Duration;

use crate::{
    AssignError, ClusterAssignment, DistanceMatrix, GroupAssigner, GroupLabel, Order, TourError,
    TourSolver, effective_group_count,
};

/// Build an order from literal parts.
pub fn order(id: &str, lat: f64, lng: f64, weight_kg: f64) -> Order {
    Order::new(id, lat, lng, weight_kg)
}

fn group_count(orders: &[Order], truck_count: usize) -> Result<GroupLabel, AssignError> {
    if orders.is_empty() {
        return Err(AssignError::NoOrders);
    }
    GroupLabel::try_from(effective_group_count(orders.len(), truck_count)).map_err(|err| {
        AssignError::Clustering {
            message: err.to_string(),
        }
    })
}

/// Deals orders to groups `1, 2, …, K', 1, 2, …` in input order.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobinAssigner;

impl GroupAssigner for RoundRobinAssigner {
    fn assign(
        &self,
        orders: &[Order],
        truck_count: usize,
    ) -> Result<ClusterAssignment, AssignError> {
        let groups = group_count(orders, truck_count)?;
        let labels = (1..=groups).cycle().take(orders.len()).collect();
        ClusterAssignment::new(labels, groups)
    }
}

/// Returns a fixed label list regardless of the orders' positions.
#[derive(Debug, Default, Clone)]
pub struct FixedAssigner {
    labels: Vec<GroupLabel>,
}

impl FixedAssigner {
    /// Assign `labels[i]` to order `i`.
    pub fn new(labels: Vec<GroupLabel>) -> Self {
        Self { labels }
    }
}

impl GroupAssigner for FixedAssigner {
    fn assign(
        &self,
        orders: &[Order],
        truck_count: usize,
    ) -> Result<ClusterAssignment, AssignError> {
        let groups = group_count(orders, truck_count)?;
        let assignment = ClusterAssignment::new(self.labels.clone(), groups)?;
        assignment.ensure_covers(orders)?;
        Ok(assignment)
    }
}

/// Always fails, for exercising error propagation.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingAssigner;

impl GroupAssigner for FailingAssigner {
    fn assign(&self, _: &[Order], _: usize) -> Result<ClusterAssignment, AssignError> {
        Err(AssignError::Clustering {
            message: "assigner unavailable".to_owned(),
        })
    }
}

/// Visits stops in input order.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputOrderTourSolver;

impl TourSolver for InputOrderTourSolver {
    fn solve(&self, matrix: &DistanceMatrix, _: Duration) -> Result<Vec<usize>, TourError> {
        Ok((1..matrix.size()).collect())
    }
}

/// Never finds a tour.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingTourSolver;

impl TourSolver for FailingTourSolver {
    fn solve(&self, _: &DistanceMatrix, _: Duration) -> Result<Vec<usize>, TourError> {
        Err(TourError::NoSolution {
            reason: "solver disabled for test".to_owned(),
        })
    }
}
