//! Straight-line leg estimates used when the routing service is unavailable.

use async_trait::async_trait;
use dispatch_core::{LegError, LegProvider, RouteLeg};
use geo::Coord;

use crate::units::round_to;

/// Kilometres per degree of planar coordinate distance.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Assumed average driving speed for estimated legs.
pub const FALLBACK_SPEED_KMH: f64 = 40.0;

/// Builds [`RouteLeg`]s from planar distance when no road route is known.
///
/// Distance is the coordinate distance in degrees scaled by
/// [`KM_PER_DEGREE`], rounded to metres; duration assumes
/// [`FALLBACK_SPEED_KMH`] and is rounded to a tenth of a minute. The
/// geometry is the two endpoints and the leg is flagged `is_fallback`.
///
/// # Examples
///
/// ```
/// use dispatch_routing::FallbackEstimator;
/// use geo::Coord;
///
/// let leg = FallbackEstimator::default().estimate(
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 0.0, y: 0.2 },
/// );
/// assert!((leg.distance_km - 22.2).abs() < 1e-9);
/// assert!((leg.duration_minutes - 33.3).abs() < 1e-9);
/// assert!(leg.is_fallback);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackEstimator {
    km_per_degree: f64,
    speed_kmh: f64,
}

impl Default for FallbackEstimator {
    fn default() -> Self {
        Self {
            km_per_degree: KM_PER_DEGREE,
            speed_kmh: FALLBACK_SPEED_KMH,
        }
    }
}

impl FallbackEstimator {
    /// Override the degree-to-kilometre scale.
    #[must_use]
    pub const fn with_km_per_degree(mut self, km_per_degree: f64) -> Self {
        self.km_per_degree = km_per_degree;
        self
    }

    /// Override the assumed driving speed.
    #[must_use]
    pub const fn with_speed_kmh(mut self, speed_kmh: f64) -> Self {
        self.speed_kmh = speed_kmh;
        self
    }

    /// Estimate the leg from `from` to `to`.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "planar distance and speed conversion")]
    pub fn estimate(&self, from: Coord<f64>, to: Coord<f64>) -> RouteLeg {
        let degrees = (to.x - from.x).hypot(to.y - from.y);
        let distance_km = degrees * self.km_per_degree;
        let duration_minutes = if self.speed_kmh > 0.0 {
            distance_km / self.speed_kmh * 60.0
        } else {
            0.0
        };
        RouteLeg {
            distance_km: round_to(distance_km, 3),
            duration_minutes: round_to(duration_minutes, 1),
            geometry: vec![from, to],
            is_fallback: true,
        }
    }
}

/// Offline provider: every leg is the estimate, so requests never fail.
#[async_trait]
impl LegProvider for FallbackEstimator {
    async fn fetch_leg(&self, from: Coord<f64>, to: Coord<f64>) -> Result<RouteLeg, LegError> {
        Ok(self.estimate(from, to))
    }
}
