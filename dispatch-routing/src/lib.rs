//! Road routing for dispatch routes.
//!
//! This crate turns a sequenced tour into a drivable route:
//!
//! - [`OsrmLegProvider`] fetches individual legs from an OSRM Route API.
//! - [`LegCache`] memoises legs process-wide with LRU eviction.
//! - [`RetryPolicy`] retries failed requests with exponential backoff.
//! - [`FallbackEstimator`] supplies straight-line legs when routing fails.
//! - [`RouteStitcher`] ties these together and aggregates totals, polylines
//!   and arrival estimates.
//!
//! Stitching never fails: a leg the service cannot provide is estimated and
//! the route is flagged with `has_fallback`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod cache;
mod fallback;
mod osrm;
mod provider;
mod retry;
mod stitcher;
mod units;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use cache::{DEFAULT_CACHE_CAPACITY, LegCache, LegKey};
pub use fallback::{FALLBACK_SPEED_KMH, FallbackEstimator, KM_PER_DEGREE};
pub use provider::{
    DEFAULT_OSRM_BASE_URL, DEFAULT_PROFILE, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, OsrmLegProvider,
    OsrmLegProviderConfig, ProviderBuildError,
};
pub use retry::{DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
pub use stitcher::{DEFAULT_MAX_IN_FLIGHT, DWELL_MINUTES, RouteStitcher, StitchedRoute};
