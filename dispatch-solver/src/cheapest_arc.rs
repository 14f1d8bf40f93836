//! Greedy construction plus local search, bounded by a wall-clock deadline.

use std::time::{Duration, Instant};

use dispatch_core::{DistanceMatrix, TourError, TourSolver};
use log::debug;

use crate::local_search::LocalSearch;

/// Longest run of consecutive stops an or-opt move relocates.
pub const DEFAULT_MAX_SEGMENT_LEN: usize = 3;

/// [`TourSolver`] using path-cheapest-arc construction followed by 2-opt and
/// or-opt improvement.
///
/// Construction starts at the depot and repeatedly appends the unvisited node
/// with the cheapest arc from the current path end, breaking ties toward the
/// lowest node index. Improvement applies the first improving move it finds
/// and stops once no move helps or the time limit is reached.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dispatch_core::{DistanceMatrix, TourSolver};
/// use dispatch_solver::CheapestArcSolver;
///
/// let matrix = DistanceMatrix::from_rows(vec![
///     vec![0, 1, 5],
///     vec![1, 0, 1],
///     vec![5, 1, 0],
/// ])
/// .expect("square");
/// let tour = CheapestArcSolver::default().solve(&matrix, Duration::from_millis(50))?;
/// assert_eq!(tour, vec![1, 2]);
/// # Ok::<(), dispatch_core::TourError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheapestArcSolver {
    max_segment_len: usize,
}

impl Default for CheapestArcSolver {
    fn default() -> Self {
        Self {
            max_segment_len: DEFAULT_MAX_SEGMENT_LEN,
        }
    }
}

impl CheapestArcSolver {
    /// Override the longest segment or-opt may relocate.
    #[must_use]
    pub const fn with_max_segment_len(mut self, max_segment_len: usize) -> Self {
        self.max_segment_len = max_segment_len;
        self
    }
}

impl TourSolver for CheapestArcSolver {
    fn solve(&self, matrix: &DistanceMatrix, time_limit: Duration) -> Result<Vec<usize>, TourError> {
        let started = Instant::now();
        let deadline = started.checked_add(time_limit).unwrap_or(started);
        let tour = construct(matrix);
        let initial_cost = matrix.tour_cost(&tour);

        let improved = LocalSearch::new(matrix, deadline, self.max_segment_len).run(tour);
        debug!(
            "cheapest-arc tour over {} stops improved from {initial_cost} to {} in {:?}",
            improved.len(),
            matrix.tour_cost(&improved),
            started.elapsed()
        );
        Ok(improved)
    }
}

/// Path-cheapest-arc construction from the depot.
fn construct(matrix: &DistanceMatrix) -> Vec<usize> {
    let size = matrix.size();
    let mut visited = vec![false; size];
    let mut tour = Vec::with_capacity(size.saturating_sub(1));
    let mut current = 0;
    while tour.len() + 1 < size {
        let next = (1..size)
            .filter(|&node| !visited.get(node).copied().unwrap_or(true))
            .min_by_key(|&node| (matrix.get(current, node), node));
        let Some(node) = next else {
            break;
        };
        if let Some(slot) = visited.get_mut(node) {
            *slot = true;
        }
        tour.push(node);
        current = node;
    }
    tour
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn line_matrix() -> DistanceMatrix {
        // Depot at 0, stops on a line at 1, 2, 3 units.
        DistanceMatrix::from_rows(vec![
            vec![0, 1, 2, 3],
            vec![1, 0, 1, 2],
            vec![2, 1, 0, 1],
            vec![3, 2, 1, 0],
        ])
        .expect("square")
    }

    #[rstest]
    fn construction_follows_cheapest_arcs() {
        assert_eq!(construct(&line_matrix()), vec![1, 2, 3]);
    }

    #[rstest]
    fn construction_breaks_ties_toward_lowest_index() {
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0, 4, 4, 4],
            vec![4, 0, 1, 1],
            vec![4, 1, 0, 1],
            vec![4, 1, 1, 0],
        ])
        .expect("square");
        assert_eq!(construct(&matrix), vec![1, 2, 3]);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn trivial_matrices_yield_empty_tours(#[case] size: usize) {
        let matrix = DistanceMatrix::from_rows(vec![vec![0; size]; size]).expect("square");
        let tour = CheapestArcSolver::default()
            .solve(&matrix, Duration::from_millis(10))
            .expect("tour");
        assert!(tour.is_empty());
    }

    #[rstest]
    fn zero_time_limit_still_returns_a_permutation() {
        let tour = CheapestArcSolver::default()
            .solve(&line_matrix(), Duration::ZERO)
            .expect("tour");
        let mut sorted = tour.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3]);
    }

    #[rstest]
    fn never_worse_than_construction() {
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0, 3, 4, 6, 5],
            vec![3, 0, 2, 7, 9],
            vec![4, 2, 0, 3, 8],
            vec![6, 7, 3, 0, 2],
            vec![5, 9, 8, 2, 0],
        ])
        .expect("square");
        let greedy = construct(&matrix);
        let tour = CheapestArcSolver::default()
            .solve(&matrix, Duration::from_millis(100))
            .expect("tour");
        assert!(matrix.tour_cost(&tour) <= matrix.tour_cost(&greedy));
        assert_eq!(tour.len(), 4);
    }
}
