//! Spatial grouping with seeded k-means.

use dispatch_core::{
    AssignError, ClusterAssignment, GroupAssigner, GroupLabel, Order, effective_group_count,
};
use linfa::DatasetBase;
use linfa::traits::{Fit, Predict};
use linfa_clustering::{KMeans, KMeansInit};
use log::debug;
use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seed used for centroid initialisation unless overridden.
pub const DEFAULT_KMEANS_SEED: u64 = 42;

/// Tuning knobs for [`KMeansAssigner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansConfig {
    /// Seed for centroid initialisation.
    pub seed: u64,
    /// Independent restarts; the lowest-inertia run wins.
    pub n_runs: usize,
    /// Iteration cap per run.
    pub max_iterations: u64,
    /// Convergence threshold on centroid movement.
    pub tolerance: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_KMEANS_SEED,
            n_runs: 10,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

/// [`GroupAssigner`] clustering orders by `(lat, lng)`.
///
/// The same orders and fleet size always yield the same labels.
///
/// # Examples
///
/// ```
/// use dispatch_core::{GroupAssigner, Order};
/// use dispatch_solver::KMeansAssigner;
///
/// let orders = vec![
///     Order::new("a", 36.10, -86.80, 10.0),
///     Order::new("b", 36.11, -86.81, 10.0),
///     Order::new("c", 36.30, -86.50, 10.0),
/// ];
/// let assignment = KMeansAssigner::default().assign(&orders, 2)?;
/// assert_eq!(assignment.label(0), assignment.label(1));
/// assert_ne!(assignment.label(0), assignment.label(2));
/// # Ok::<(), dispatch_core::AssignError>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KMeansAssigner {
    config: KMeansConfig,
}

impl KMeansAssigner {
    /// Create an assigner with explicit tuning.
    #[must_use]
    pub const fn with_config(config: KMeansConfig) -> Self {
        Self { config }
    }

    fn cluster(&self, orders: &[Order], groups: usize) -> Result<Vec<usize>, AssignError> {
        let flat: Vec<f64> = orders
            .iter()
            .flat_map(|order| [order.lat(), order.lng()])
            .collect();
        let records = Array2::from_shape_vec((orders.len(), 2), flat)
            .map_err(|err| clustering_error(&err))?;
        let dataset = DatasetBase::from(records);

        let rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let model = KMeans::params_with_rng(groups, rng)
            .n_runs(self.config.n_runs)
            .max_n_iterations(self.config.max_iterations)
            .tolerance(self.config.tolerance)
            .init_method(KMeansInit::Random)
            .fit(&dataset)
            .map_err(|err| clustering_error(&err))?;
        Ok(model.predict(dataset.records()).to_vec())
    }
}

fn clustering_error(err: &dyn std::fmt::Display) -> AssignError {
    AssignError::Clustering {
        message: err.to_string(),
    }
}

impl GroupAssigner for KMeansAssigner {
    fn assign(
        &self,
        orders: &[Order],
        truck_count: usize,
    ) -> Result<ClusterAssignment, AssignError> {
        if orders.is_empty() {
            return Err(AssignError::NoOrders);
        }
        let groups = effective_group_count(orders.len(), truck_count);
        let group_count = GroupLabel::try_from(groups).map_err(|err| clustering_error(&err))?;
        if groups <= 1 {
            return ClusterAssignment::new(vec![1; orders.len()], group_count.max(1));
        }

        let clusters = self.cluster(orders, groups)?;
        let labels = clusters
            .into_iter()
            .map(|cluster| GroupLabel::try_from(cluster + 1).map_err(|err| clustering_error(&err)))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("k-means formed {group_count} groups over {} orders", orders.len());
        ClusterAssignment::new(labels, group_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_core::test_support::order;
    use rstest::{fixture, rstest};

    #[fixture]
    fn two_neighbourhoods() -> Vec<Order> {
        vec![
            order("n1", 36.20, -86.80, 50.0),
            order("s1", 36.10, -86.70, 50.0),
            order("n2", 36.21, -86.81, 50.0),
            order("s2", 36.11, -86.71, 50.0),
            order("n3", 36.22, -86.80, 50.0),
            order("s3", 36.10, -86.72, 50.0),
        ]
    }

    #[rstest]
    fn separates_distinct_neighbourhoods(two_neighbourhoods: Vec<Order>) {
        let assignment = KMeansAssigner::default()
            .assign(&two_neighbourhoods, 2)
            .expect("assign");
        let north = assignment.label(0);
        let south = assignment.label(1);
        assert_eq!(assignment.label(2), north);
        assert_eq!(assignment.label(4), north);
        assert_eq!(assignment.label(3), south);
        assert_eq!(assignment.label(5), south);
        assert_ne!(north, south);
        assert!(
            assignment
                .labels()
                .iter()
                .all(|&label| (1..=2).contains(&label))
        );
    }

    #[rstest]
    fn single_truck_gets_every_order(two_neighbourhoods: Vec<Order>) {
        let assignment = KMeansAssigner::default()
            .assign(&two_neighbourhoods, 1)
            .expect("assign");
        assert!(assignment.labels().iter().all(|&label| label == 1));
        assert_eq!(assignment.group_count(), 1);
    }

    #[rstest]
    fn group_count_is_capped_by_order_count() {
        let orders = vec![
            order("a", 36.1, -86.7, 10.0),
            order("b", 36.3, -86.9, 10.0),
        ];
        let assignment = KMeansAssigner::default().assign(&orders, 5).expect("assign");
        assert_eq!(assignment.group_count(), 2);
        assert!(assignment.labels().iter().all(|&label| (1..=2).contains(&label)));
    }

    #[rstest]
    fn is_deterministic(two_neighbourhoods: Vec<Order>) {
        let assigner = KMeansAssigner::default();
        let first = assigner.assign(&two_neighbourhoods, 3).expect("assign");
        let second = assigner.assign(&two_neighbourhoods, 3).expect("assign");
        assert_eq!(first, second);
    }

    #[rstest]
    fn rejects_empty_input() {
        let err = KMeansAssigner::default().assign(&[], 3).expect_err("empty");
        assert_eq!(err, AssignError::NoOrders);
    }
}
