//! Core domain types for the dispatch engine.
//!
//! The crate models delivery orders, truck-group assignments, tours and
//! stitched road routes, together with the capability traits the planning
//! pipeline is built from:
//!
//! - [`GroupAssigner`] partitions orders into truck groups.
//! - [`TourSolver`] sequences one truck's stops around the depot.
//! - [`LegProvider`] fetches a road leg between two coordinates.
//!
//! The pure parts of the pipeline live here as well: the scaled
//! [`DistanceMatrix`], the [`CapacityRebalancer`] and the [`Sequencer`].
//! Coordinates use `geo::Coord` with `x = longitude` and `y = latitude`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod assignment;
pub mod depot;
pub mod distance;
pub mod leg;
pub mod order;
pub mod rebalance;
pub mod request;
pub mod result;
pub mod route;
pub mod tour;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use assignment::{
    AssignError, ClusterAssignment, GroupAssigner, GroupLabel, UNASSIGNED, effective_group_count,
};
pub use depot::{DEFAULT_CAPACITY_KG, DEFAULT_DEPOT, DEFAULT_TRUCK_COUNT, Depot};
pub use distance::{DISTANCE_SCALE, DistanceMatrix};
pub use leg::{LegError, LegProvider, RouteLeg};
pub use order::{Order, sample_orders};
pub use rebalance::{CapacityRebalancer, REBALANCE_PASSES, RebalanceReport};
pub use request::{InputError, OptimizeRequest, OrderRecord, ValidatedRequest};
pub use result::{OptimizationResult, PlanAuditError};
pub use route::{Route, StopEta};
pub use tour::{DEFAULT_TOUR_TIME_LIMIT, Sequencer, Tour, TourError, TourSolver};
