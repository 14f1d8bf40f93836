//! Tour sequencing for a single truck.
//!
//! A [`TourSolver`] works on a [`DistanceMatrix`] whose node `0` is the
//! depot and answers with the visiting order of nodes `1..n`. The
//! [`Sequencer`] builds the matrix from orders, checks that the answer is a
//! permutation, and maps nodes back to orders.

use std::time::Duration;

use geo::Coord;
use log::debug;
use thiserror::Error;

use crate::{Depot, DistanceMatrix, Order};

/// Search budget handed to tour solvers by default.
pub const DEFAULT_TOUR_TIME_LIMIT: Duration = Duration::from_secs(2);

/// Errors returned while sequencing a tour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TourError {
    /// The solver did not produce a tour.
    #[error("no tour found: {reason}")]
    NoSolution {
        /// Solver-provided explanation.
        reason: String,
    },
    /// The solver produced something other than a permutation of the stops.
    #[error("solver returned an invalid tour: {reason}")]
    InvalidTour {
        /// What was wrong with the tour.
        reason: String,
    },
}

/// Orders one truck's stops to keep the closed tour short.
///
/// Solvers must be `Send + Sync` so one instance can serve groups on
/// several worker threads.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dispatch_core::{DistanceMatrix, TourError, TourSolver};
///
/// struct InOrder;
///
/// impl TourSolver for InOrder {
///     fn solve(&self, matrix: &DistanceMatrix, _: Duration) -> Result<Vec<usize>, TourError> {
///         Ok((1..matrix.size()).collect())
///     }
/// }
///
/// let matrix = DistanceMatrix::from_rows(vec![vec![0, 1], vec![1, 0]]).expect("square");
/// assert_eq!(InOrder.solve(&matrix, Duration::from_secs(1))?, vec![1]);
/// # Ok::<(), TourError>(())
/// ```
pub trait TourSolver: Send + Sync {
    /// Return the visiting order of nodes `1..matrix.size()`.
    ///
    /// The depot (node `0`) is implied at both ends and must not appear.
    ///
    /// # Errors
    ///
    /// Returns [`TourError::NoSolution`] when no tour is found within
    /// `time_limit`.
    fn solve(&self, matrix: &DistanceMatrix, time_limit: Duration)
    -> Result<Vec<usize>, TourError>;
}

/// A sequenced list of stops and its scaled matrix cost.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tour {
    /// Stops in visiting order, depot excluded.
    pub stops: Vec<Order>,
    /// Closed-tour cost in [`DistanceMatrix`] units.
    pub cost: u64,
}

impl Tour {
    /// Whether the tour visits no stops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Stop identifiers in visiting order.
    pub fn order_ids(&self) -> impl Iterator<Item = &str> {
        self.stops.iter().map(|order| order.id.as_str())
    }
}

/// Turns a group of orders into a depot-anchored [`Tour`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dispatch_core::{DEFAULT_DEPOT, DistanceMatrix, Order, Sequencer, TourError, TourSolver};
///
/// struct InOrder;
///
/// impl TourSolver for InOrder {
///     fn solve(&self, matrix: &DistanceMatrix, _: Duration) -> Result<Vec<usize>, TourError> {
///         Ok((1..matrix.size()).collect())
///     }
/// }
///
/// let sequencer = Sequencer::new(InOrder, DEFAULT_DEPOT);
/// let tour = sequencer.sequence(&[Order::new("A", 36.17, -86.78, 10.0)])?;
/// assert_eq!(tour.order_ids().collect::<Vec<_>>(), vec!["A"]);
/// # Ok::<(), dispatch_core::TourError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Sequencer<T> {
    solver: T,
    depot: Coord<f64>,
    time_limit: Duration,
}

impl<T: TourSolver> Sequencer<T> {
    /// Create a sequencer using the default time limit.
    pub const fn new(solver: T, depot: Depot) -> Self {
        Self {
            solver,
            depot: depot.location,
            time_limit: DEFAULT_TOUR_TIME_LIMIT,
        }
    }

    /// Override the solver's time limit.
    #[must_use]
    pub const fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Solver time limit.
    #[must_use]
    pub const fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Sequence `orders` into a closed tour from the depot.
    ///
    /// An empty group yields an empty tour without consulting the solver.
    ///
    /// # Errors
    ///
    /// Propagates solver failures and returns [`TourError::InvalidTour`] when
    /// the solver's answer is not a permutation of `1..=orders.len()`.
    pub fn sequence(&self, orders: &[Order]) -> Result<Tour, TourError> {
        if orders.is_empty() {
            return Ok(Tour::default());
        }
        let coords: Vec<Coord<f64>> = std::iter::once(self.depot)
            .chain(orders.iter().map(|order| order.location))
            .collect();
        let matrix = DistanceMatrix::from_coords(&coords);
        let nodes = self.solver.solve(&matrix, self.time_limit)?;
        check_permutation(&nodes, orders.len())?;

        let cost = matrix.tour_cost(&nodes);
        let stops: Vec<Order> = nodes
            .iter()
            .filter_map(|&node| orders.get(node - 1).cloned())
            .collect();
        debug!("sequenced {} stops at cost {cost}", stops.len());
        Ok(Tour { stops, cost })
    }
}

fn check_permutation(nodes: &[usize], stop_count: usize) -> Result<(), TourError> {
    if nodes.len() != stop_count {
        return Err(TourError::InvalidTour {
            reason: format!("expected {stop_count} stops, got {}", nodes.len()),
        });
    }
    let mut seen = vec![false; stop_count + 1];
    for &node in nodes {
        match seen.get_mut(node) {
            Some(slot) if node != 0 && !*slot => *slot = true,
            Some(_) if node != 0 => {
                return Err(TourError::InvalidTour {
                    reason: format!("node {node} visited twice"),
                });
            }
            _ => {
                return Err(TourError::InvalidTour {
                    reason: format!("node {node} is not a stop"),
                });
            }
        }
    }
    Ok(())
}
