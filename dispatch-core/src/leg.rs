//! Road legs between two coordinates and the [`LegProvider`] capability.

use std::sync::Arc;

use async_trait::async_trait;
use geo::Coord;
use thiserror::Error;

/// One drive between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    /// Driving distance in kilometres.
    pub distance_km: f64,
    /// Driving time in minutes.
    pub duration_minutes: f64,
    /// Path geometry (`x = longitude`, `y = latitude`), start to end.
    pub geometry: Vec<Coord<f64>>,
    /// Whether the leg is a straight-line estimate rather than a road route.
    pub is_fallback: bool,
}

impl RouteLeg {
    /// A leg with no distance or duration that stays at `at`.
    #[must_use]
    pub fn stationary(at: Coord<f64>) -> Self {
        Self {
            distance_km: 0.0,
            duration_minutes: 0.0,
            geometry: vec![at, at],
            is_fallback: false,
        }
    }
}

/// Errors raised when fetching a leg from a routing service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LegError {
    /// The request did not complete in time.
    #[error("routing request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The service answered with a non-success HTTP status.
    #[error("routing service at {url} returned HTTP {status}: {message}")]
    HttpError {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },
    /// The connection failed before a response arrived.
    #[error("network error contacting {url}: {message}")]
    NetworkError {
        /// Request URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The service answered but reported a routing failure.
    #[error("routing service error {code}: {message}")]
    ServiceError {
        /// Service status code, such as `NoRoute`.
        code: String,
        /// Service message.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse routing response: {message}")]
    ParseError {
        /// Decoder error description.
        message: String,
    },
}

/// Fetches road legs between coordinates.
///
/// Implementations are shared across concurrently stitched routes, so they
/// must be `Send + Sync`.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use dispatch_core::{LegError, LegProvider, RouteLeg};
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
/// ```
#[async_trait]
pub trait LegProvider: Send + Sync {
    /// Fetch the road leg from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`LegError`] when the service cannot provide a route.
    async fn fetch_leg(&self, from: Coord<f64>, to: Coord<f64>) -> Result<RouteLeg, LegError>;
}

#[async_trait]
impl<P: LegProvider + ?Sized> LegProvider for Arc<P> {
    async fn fetch_leg(&self, from: Coord<f64>, to: Coord<f64>) -> Result<RouteLeg, LegError> {
        (**self).fetch_leg(from, to).await
    }
}

#[async_trait]
impl<P: LegProvider + ?Sized> LegProvider for Box<P> {
    async fn fetch_leg(&self, from: Coord<f64>, to: Coord<f64>) -> Result<RouteLeg, LegError> {
        (**self).fetch_leg(from, to).await
    }
}
