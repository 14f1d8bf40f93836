//! The outcome of one optimisation call and its structural audit.

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::Serialize;
use thiserror::Error;

use crate::{Order, Route};

/// Slack allowed when comparing summed weights against the capacity.
const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Violations found by [`OptimizationResult::audit`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanAuditError {
    /// An id in the plan was not part of the request.
    #[error("plan contains unknown order {id:?}")]
    UnknownOrder {
        /// The foreign identifier.
        id: String,
    },
    /// An id appears in more than one place in the plan.
    #[error("order {id:?} is planned more than once")]
    DuplicateOrder {
        /// The repeated identifier.
        id: String,
    },
    /// A requested order is neither routed nor unassigned.
    #[error("order {id:?} is missing from the plan")]
    MissingOrder {
        /// The absent identifier.
        id: String,
    },
    /// A route carries more than the truck capacity.
    #[error("route {route_id} carries {load} kg, above the {capacity} kg limit")]
    CapacityExceeded {
        /// Offending route.
        route_id: u32,
        /// Route load in kilograms.
        load: f64,
        /// Capacity in kilograms.
        capacity: f64,
    },
    /// The reported order count does not match the request.
    #[error("plan reports {reported} orders but {expected} were requested")]
    OrderCountMismatch {
        /// Count carried by the result.
        reported: usize,
        /// Count in the request.
        expected: usize,
    },
}

/// Routes and leftovers produced for one request.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct OptimizationResult {
    /// Number of routes produced.
    pub truck_count_used: usize,
    /// Per-truck capacity in kilograms.
    pub capacity_limit: f64,
    /// Number of orders in the request.
    pub order_count: usize,
    /// Sum of route distances in kilometres.
    pub total_distance: f64,
    /// Routes in ascending truck label order.
    pub routes: Vec<Route>,
    /// Orders no truck could carry.
    pub unassigned_order_ids: Vec<String>,
}

impl OptimizationResult {
    /// Iterate over every routed order id.
    pub fn routed_ids(&self) -> impl Iterator<Item = &str> {
        self.routes
            .iter()
            .flat_map(|route| route.stop_sequence.iter().map(String::as_str))
    }

    /// Check the plan against the orders it was built from.
    ///
    /// Every requested id must appear exactly once across the routes and the
    /// unassigned list, no foreign ids may appear, and no route may exceed
    /// the capacity.
    ///
    /// # Errors
    ///
    /// Returns the first [`PlanAuditError`] found.
    pub fn audit(&self, orders: &[Order]) -> Result<(), PlanAuditError> {
        if self.order_count != orders.len() {
            return Err(PlanAuditError::OrderCountMismatch {
                reported: self.order_count,
                expected: orders.len(),
            });
        }
        let requested: HashSet<&str> = orders.iter().map(|order| order.id.as_str()).collect();
        let mut planned = HashSet::with_capacity(orders.len());
        let all_planned = self
            .routed_ids()
            .chain(self.unassigned_order_ids.iter().map(String::as_str));
        for id in all_planned {
            if !requested.contains(id) {
                return Err(PlanAuditError::UnknownOrder { id: id.to_owned() });
            }
            if !planned.insert(id) {
                return Err(PlanAuditError::DuplicateOrder { id: id.to_owned() });
            }
        }
        if let Some(order) = orders.iter().find(|order| !planned.contains(order.id.as_str())) {
            return Err(PlanAuditError::MissingOrder {
                id: order.id.clone(),
            });
        }
        if let Some(route) = self
            .routes
            .iter()
            .find(|route| route.truck_load > self.capacity_limit + WEIGHT_TOLERANCE)
        {
            return Err(PlanAuditError::CapacityExceeded {
                route_id: route.route_id,
                load: route.truck_load,
                capacity: self.capacity_limit,
            });
        }
        Ok(())
    }
}
