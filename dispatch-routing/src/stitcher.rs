//! Turns a sequenced tour into a road route with totals, polylines and ETAs.

use std::sync::Arc;

use dispatch_core::{LegProvider, Order, RouteLeg, StopEta};
use futures_util::future::join_all;
use geo::Coord;
use log::{debug, warn};
use tokio::sync::Semaphore;

use crate::cache::{LegCache, LegKey};
use crate::fallback::FallbackEstimator;
use crate::retry::RetryPolicy;
use crate::units::round_to;

/// Provider requests allowed in flight per stitcher.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Minutes spent unloading at each stop.
pub const DWELL_MINUTES: f64 = 5.0;

/// Legs and derived measures for `depot → stops… → depot`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StitchedRoute {
    /// One leg per consecutive waypoint pair, in travel order.
    pub legs: Vec<RouteLeg>,
    /// Kilometres over every leg, rounded to metres.
    pub total_distance: f64,
    /// Minutes over every leg, rounded to a tenth.
    pub total_duration: f64,
    /// Every leg's geometry joined end to end.
    pub polyline: Vec<Coord<f64>>,
    /// Geometry up to the last stop.
    pub delivery_polyline: Vec<Coord<f64>>,
    /// Geometry of the return leg.
    pub return_polyline: Vec<Coord<f64>>,
    /// Arrival estimates in visiting order.
    pub stop_etas: Vec<StopEta>,
    /// Whether any leg is an estimate.
    pub has_fallback: bool,
}

impl StitchedRoute {
    #[expect(clippy::float_arithmetic, reason = "ETA accumulation")]
    fn assemble(stops: &[Order], legs: Vec<RouteLeg>) -> Self {
        let total_distance = round_to(legs.iter().map(|leg| leg.distance_km).sum(), 3);
        let total_duration = round_to(legs.iter().map(|leg| leg.duration_minutes).sum(), 1);
        let delivery_len = legs.len().saturating_sub(1);
        let polyline = join_geometry(&legs);
        let delivery_polyline = join_geometry(legs.get(..delivery_len).unwrap_or_default());
        let return_polyline = legs
            .last()
            .map(|leg| leg.geometry.clone())
            .unwrap_or_default();

        let mut elapsed = 0.0;
        let mut travelled = 0.0;
        let stop_etas = stops
            .iter()
            .zip(&legs)
            .enumerate()
            .map(|(position, (stop, leg))| {
                elapsed += leg.duration_minutes;
                if position > 0 {
                    elapsed += DWELL_MINUTES;
                }
                travelled += leg.distance_km;
                StopEta {
                    stop_id: stop.id.clone(),
                    eta_minutes: round_to(elapsed, 1),
                    distance_from_depot_km: round_to(travelled, 2),
                }
            })
            .collect();

        Self {
            has_fallback: legs.iter().any(|leg| leg.is_fallback),
            legs,
            total_distance,
            total_duration,
            polyline,
            delivery_polyline,
            return_polyline,
            stop_etas,
        }
    }
}

/// Concatenate leg geometries, dropping each later leg's first point since it
/// repeats the previous leg's last.
fn join_geometry(legs: &[RouteLeg]) -> Vec<Coord<f64>> {
    legs.iter()
        .enumerate()
        .flat_map(|(index, leg)| leg.geometry.iter().skip(usize::from(index > 0)))
        .copied()
        .collect()
}

/// Fetches the legs of a tour and aggregates them.
///
/// Each leg is looked up in the [`LegCache`] first. On a miss the provider is
/// called under the [`RetryPolicy`]; when every attempt fails the
/// [`FallbackEstimator`] supplies the leg instead, so stitching never fails.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use dispatch_core::{Depot, LegError, LegProvider, Order, RouteLeg};
/// use dispatch_routing::{LegCache, RouteStitcher};
/// use geo::Coord;
///
/// struct Teleport;
///
/// #[async_trait]
/// impl LegProvider for Teleport {
///     async fn fetch_leg(&self, _: Coord<f64>, to: Coord<f64>) -> Result<RouteLeg, LegError> {
///         Ok(RouteLeg::stationary(to))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let stitcher = RouteStitcher::new(Teleport).with_cache(Arc::new(LegCache::default()));
/// let depot = Depot::new(36.0, -86.0);
/// let stops = vec![Order::new("a", 36.0, -85.9, 10.0)];
/// let route = stitcher.stitch(depot.location, &stops).await;
/// assert_eq!(route.legs.len(), 2);
/// assert_eq!(route.stop_etas.len(), 1);
/// # }
/// ```
#[derive(Debug)]
pub struct RouteStitcher<P> {
    provider: P,
    cache: Arc<LegCache>,
    retry: RetryPolicy,
    fallback: FallbackEstimator,
    permits: Semaphore,
}

impl<P: LegProvider> RouteStitcher<P> {
    /// Create a stitcher using the process-wide cache and default policies.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: LegCache::global(),
            retry: RetryPolicy::default(),
            fallback: FallbackEstimator::default(),
            permits: Semaphore::new(DEFAULT_MAX_IN_FLIGHT),
        }
    }

    /// Use `cache` instead of [`LegCache::global`].
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<LegCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the fallback estimator.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: FallbackEstimator) -> Self {
        self.fallback = fallback;
        self
    }

    /// Bound concurrent provider requests (minimum one).
    #[must_use]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.permits = Semaphore::new(max_in_flight.max(1));
        self
    }

    /// Cache consulted for legs.
    #[must_use]
    pub const fn cache(&self) -> &Arc<LegCache> {
        &self.cache
    }

    /// Stitch the closed route `depot → stops… → depot`.
    ///
    /// Legs are fetched concurrently and kept in waypoint order. No stops
    /// yields an empty route with no legs.
    pub async fn stitch(&self, depot: Coord<f64>, stops: &[Order]) -> StitchedRoute {
        if stops.is_empty() {
            return StitchedRoute::default();
        }
        let waypoints: Vec<Coord<f64>> = std::iter::once(depot)
            .chain(stops.iter().map(|stop| stop.location))
            .chain(std::iter::once(depot))
            .collect();
        let legs = join_all(
            waypoints
                .iter()
                .zip(waypoints.iter().skip(1))
                .map(|(&from, &to)| self.leg(from, to)),
        )
        .await;
        StitchedRoute::assemble(stops, legs)
    }

    /// Fetch one leg through the cache, the provider and finally the
    /// fallback estimate.
    pub async fn leg(&self, from: Coord<f64>, to: Coord<f64>) -> RouteLeg {
        let key = LegKey::new(from, to);
        if let Some(leg) = self.cache.get(&key) {
            debug!("leg cache hit for {from:?} -> {to:?}");
            return leg;
        }

        let fetched = self
            .retry
            .run(move || async move {
                let _permit = self.permits.acquire().await;
                self.provider.fetch_leg(from, to).await
            })
            .await;
        let leg = fetched.unwrap_or_else(|err| {
            warn!("routing failed for {from:?} -> {to:?}, using straight-line estimate: {err}");
            self.fallback.estimate(from, to)
        });
        // Estimates are cached as well.
        self.cache.insert(key, leg.clone());
        leg
    }
}
