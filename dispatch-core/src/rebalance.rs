//! Capacity repair for truck-group assignments.
//!
//! Spatial clustering ignores weight, so a group can exceed a truck's
//! capacity. The rebalancer moves the heaviest orders of an overloaded group
//! to the first other group (in ascending label order) with room, repeating
//! for a fixed number of passes. Whatever still does not fit is evicted to
//! [`UNASSIGNED`], heaviest first.

use log::debug;

use crate::{ClusterAssignment, DEFAULT_CAPACITY_KG, GroupLabel, Order, UNASSIGNED};

/// Number of move passes made before the eviction sweep.
pub const REBALANCE_PASSES: usize = 3;

/// Counts of the changes a rebalance made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebalanceReport {
    /// Orders moved between groups.
    pub moved: usize,
    /// Orders evicted to [`UNASSIGNED`].
    pub evicted: usize,
}

/// Repairs assignments so that no group exceeds the truck capacity.
///
/// # Examples
///
/// ```
/// use dispatch_core::{CapacityRebalancer, ClusterAssignment, Order};
///
/// let orders = vec![
///     Order::new("a", 0.0, 0.0, 600.0),
///     Order::new("b", 0.0, 0.0, 600.0),
/// ];
/// let mut assignment = ClusterAssignment::new(vec![1, 1], 2)?;
/// let report = CapacityRebalancer::new(1000.0).rebalance(&orders, &mut assignment);
/// assert_eq!(report.moved, 0);
/// assert_eq!(report.evicted, 1);
/// # Ok::<(), dispatch_core::AssignError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityRebalancer {
    capacity_kg: f64,
    passes: usize,
}

impl Default for CapacityRebalancer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_KG)
    }
}

impl CapacityRebalancer {
    /// Create a rebalancer for trucks carrying at most `capacity_kg`.
    #[must_use]
    pub const fn new(capacity_kg: f64) -> Self {
        Self {
            capacity_kg,
            passes: REBALANCE_PASSES,
        }
    }

    /// Override the number of move passes.
    #[must_use]
    pub const fn with_passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    /// Capacity limit in kilograms.
    #[must_use]
    pub const fn capacity_kg(&self) -> f64 {
        self.capacity_kg
    }

    /// Repair `assignment` in place.
    ///
    /// Only groups that hold at least one order take part; an empty label is
    /// never chosen as a destination. On return every non-zero
    /// group weighs at most the capacity.
    pub fn rebalance(&self, orders: &[Order], assignment: &mut ClusterAssignment) -> RebalanceReport {
        let mut report = RebalanceReport::default();
        for pass in 0..self.passes {
            let moved_before = report.moved;
            for label in assignment.occupied_groups() {
                report.moved += self.relieve_group(orders, assignment, label);
            }
            debug!(
                "rebalance pass {pass} moved {} orders",
                report.moved - moved_before
            );
        }
        for label in assignment.occupied_groups() {
            report.evicted += self.evict_overflow(orders, assignment, label);
        }
        report
    }

    fn relieve_group(
        &self,
        orders: &[Order],
        assignment: &mut ClusterAssignment,
        label: GroupLabel,
    ) -> usize {
        if assignment.group_weight(label, orders) <= self.capacity_kg {
            return 0;
        }
        let mut candidates: Vec<usize> = assignment.members(label).collect();
        // Stable sort keeps input order among equal weights.
        candidates.sort_by(|&a, &b| weight_at(orders, b).total_cmp(&weight_at(orders, a)));

        let mut moved = 0;
        for index in candidates {
            if assignment.group_weight(label, orders) <= self.capacity_kg {
                break;
            }
            let weight = weight_at(orders, index);
            let target = assignment.occupied_groups().into_iter().find(|&other| {
                other != label && assignment.group_weight(other, orders) + weight <= self.capacity_kg
            });
            if let Some(target) = target {
                debug!("moving order {index} ({weight} kg) from group {label} to {target}");
                assignment.set_label(index, target);
                moved += 1;
            }
        }
        moved
    }

    fn evict_overflow(
        &self,
        orders: &[Order],
        assignment: &mut ClusterAssignment,
        label: GroupLabel,
    ) -> usize {
        let mut evicted = 0;
        while assignment.group_weight(label, orders) > self.capacity_kg {
            let Some(heaviest) = heaviest_member(orders, assignment, label) else {
                break;
            };
            debug!("evicting order {heaviest} from group {label}");
            assignment.set_label(heaviest, UNASSIGNED);
            evicted += 1;
        }
        evicted
    }
}

fn weight_at(orders: &[Order], index: usize) -> f64 {
    orders.get(index).map_or(0.0, |order| order.weight_kg)
}

/// Heaviest member of `label`; ties go to the earliest order.
fn heaviest_member(
    orders: &[Order],
    assignment: &ClusterAssignment,
    label: GroupLabel,
) -> Option<usize> {
    assignment.members(label).fold(None, |best, index| match best {
        Some(current) if weight_at(orders, current) >= weight_at(orders, index) => Some(current),
        _ => Some(index),
    })
}
