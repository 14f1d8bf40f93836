//! Clustering and tour-search backends for the dispatch engine.
//!
//! This crate provides the production implementations of the capability
//! traits declared in `dispatch-core`:
//!
//! - [`KMeansAssigner`] groups orders with seeded k-means from
//!   `linfa-clustering`.
//! - [`CheapestArcSolver`] builds a tour by path-cheapest-arc construction
//!   and improves it with 2-opt and or-opt moves until a deadline.
//! - `VrpTourSolver` (feature `solver-vrp`) models the tour as a
//!   single-vehicle problem for the `vrp-core` metaheuristics.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod cheapest_arc;
mod kmeans;
mod local_search;
#[cfg(feature = "solver-vrp")]
mod vrp;

pub use cheapest_arc::{CheapestArcSolver, DEFAULT_MAX_SEGMENT_LEN};
pub use kmeans::{DEFAULT_KMEANS_SEED, KMeansAssigner, KMeansConfig};
#[cfg(feature = "solver-vrp")]
#[cfg_attr(docsrs, doc(cfg(feature = "solver-vrp")))]
pub use vrp::{VrpTourSolver, VrpTourSolverConfig};
