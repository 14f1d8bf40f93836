//! Truck-group assignments and the [`GroupAssigner`] capability.
//!
//! Group labels are `1..=K'` where `K' = min(truck_count, order_count)`.
//! Label [`UNASSIGNED`] marks an order the capacity repair could not place.

use thiserror::Error;

use crate::Order;

/// Identifier for a truck group.
pub type GroupLabel = u32;

/// Label of orders that were left off every truck.
pub const UNASSIGNED: GroupLabel = 0;

/// Errors produced while building an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    /// There were no orders to partition.
    #[error("cannot assign an empty order set")]
    NoOrders,
    /// The assignment has a different length from the order list.
    #[error("assignment covers {labels} orders but {orders} were supplied")]
    LengthMismatch {
        /// Number of labels produced.
        labels: usize,
        /// Number of orders supplied.
        orders: usize,
    },
    /// A label falls outside `0..=group_count`.
    #[error("label {label} exceeds group count {group_count}")]
    LabelOutOfRange {
        /// Offending label.
        label: GroupLabel,
        /// Number of groups in the assignment.
        group_count: GroupLabel,
    },
    /// The clustering backend failed.
    #[error("clustering failed: {message}")]
    Clustering {
        /// Backend error description.
        message: String,
    },
}

/// Number of groups actually formed for `order_count` orders and a fleet of
/// `truck_count` trucks.
///
/// # Examples
///
/// ```
/// use dispatch_core::effective_group_count;
///
/// assert_eq!(effective_group_count(3, 5), 3);
/// assert_eq!(effective_group_count(50, 5), 5);
/// ```
#[must_use]
pub const fn effective_group_count(order_count: usize, truck_count: usize) -> usize {
    if order_count < truck_count {
        order_count
    } else {
        truck_count
    }
}

/// Group label for every order, indexed like the order list.
///
/// # Examples
///
/// ```
/// use dispatch_core::ClusterAssignment;
///
/// let assignment = ClusterAssignment::new(vec![1, 2, 1], 2)?;
/// assert_eq!(assignment.members(1).collect::<Vec<_>>(), vec![0, 2]);
/// assert_eq!(assignment.occupied_groups(), vec![1, 2]);
/// # Ok::<(), dispatch_core::AssignError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAssignment {
    labels: Vec<GroupLabel>,
    group_count: GroupLabel,
}

impl ClusterAssignment {
    /// Wrap labels produced by an assigner.
    ///
    /// # Errors
    ///
    /// Returns [`AssignError::LabelOutOfRange`] when a label exceeds
    /// `group_count`.
    pub fn new(labels: Vec<GroupLabel>, group_count: GroupLabel) -> Result<Self, AssignError> {
        if let Some(&label) = labels.iter().find(|&&label| label > group_count) {
            return Err(AssignError::LabelOutOfRange { label, group_count });
        }
        Ok(Self {
            labels,
            group_count,
        })
    }

    /// Check that the assignment covers exactly `orders`.
    ///
    /// # Errors
    ///
    /// Returns [`AssignError::LengthMismatch`] when the lengths differ.
    pub fn ensure_covers(&self, orders: &[Order]) -> Result<(), AssignError> {
        if self.labels.len() == orders.len() {
            Ok(())
        } else {
            Err(AssignError::LengthMismatch {
                labels: self.labels.len(),
                orders: orders.len(),
            })
        }
    }

    /// All labels in order-list order.
    #[must_use]
    pub fn labels(&self) -> &[GroupLabel] {
        &self.labels
    }

    /// Label of the order at `index`.
    #[must_use]
    pub fn label(&self, index: usize) -> Option<GroupLabel> {
        self.labels.get(index).copied()
    }

    /// Move the order at `index` to `label`. Out-of-range indices are
    /// ignored.
    pub fn set_label(&mut self, index: usize, label: GroupLabel) {
        if let Some(slot) = self.labels.get_mut(index) {
            *slot = label;
        }
    }

    /// Number of groups the assigner formed.
    #[must_use]
    pub const fn group_count(&self) -> GroupLabel {
        self.group_count
    }

    /// Number of labelled orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no orders are labelled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Indices of the orders carrying `label`, ascending.
    pub fn members(&self, label: GroupLabel) -> impl Iterator<Item = usize> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter(move |(_, l)| **l == label)
            .map(|(index, _)| index)
    }

    /// Non-zero labels that currently hold at least one order, ascending.
    #[must_use]
    pub fn occupied_groups(&self) -> Vec<GroupLabel> {
        let mut groups: Vec<GroupLabel> = self
            .labels
            .iter()
            .copied()
            .filter(|&label| label != UNASSIGNED)
            .collect();
        groups.sort_unstable();
        groups.dedup();
        groups
    }

    /// Total weight of the orders carrying `label`.
    #[must_use]
    pub fn group_weight(&self, label: GroupLabel, orders: &[Order]) -> f64 {
        self.members(label)
            .filter_map(|index| orders.get(index))
            .map(|order| order.weight_kg)
            .sum()
    }
}

/// Partitions orders into at most `truck_count` spatial groups.
///
/// Implementations must label every order with a value in `1..=K'`, where
/// `K'` is [`effective_group_count`], and must be deterministic for the same
/// input.
pub trait GroupAssigner: Send + Sync {
    /// Assign a group label to each order.
    ///
    /// # Errors
    ///
    /// Returns [`AssignError`] when the orders cannot be partitioned.
    fn assign(&self, orders: &[Order], truck_count: usize)
    -> Result<ClusterAssignment, AssignError>;
}
