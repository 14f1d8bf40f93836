//! HTTP [`LegProvider`] backed by OSRM's Route API.
//!
//! # Example
//!
//! ```no_run
//! use dispatch_core::LegProvider;
//! use dispatch_routing::OsrmLegProvider;
//! use geo::Coord;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OsrmLegProvider::new("http://localhost:5000")?;
//! let leg = provider
//!     .fetch_leg(Coord { x: -86.78, y: 36.16 }, Coord { x: -86.75, y: 36.18 })
//!     .await?;
//! println!("{} km", leg.distance_km);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use dispatch_core::{LegError, LegProvider, RouteLeg};
use geo::Coord;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::osrm::RouteResponse;
use crate::units::round_to;

/// Public OSRM demo server.
pub const DEFAULT_OSRM_BASE_URL: &str = "http://router.project-osrm.org";

/// Routing profile requested from OSRM.
pub const DEFAULT_PROFILE: &str = "driving";

/// Default user agent for OSRM requests.
pub const DEFAULT_USER_AGENT: &str = "dispatch-routing/0.1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for [`OsrmLegProvider`] construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// The base URL is not an absolute HTTP(S) URL.
    #[error("invalid OSRM base URL {url:?}: {message}")]
    InvalidBaseUrl {
        /// URL as configured.
        url: String,
        /// Why it was rejected.
        message: String,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Configuration for [`OsrmLegProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsrmLegProviderConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// Routing profile path segment.
    pub profile: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for OsrmLegProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OSRM_BASE_URL.to_owned(),
            profile: DEFAULT_PROFILE.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl OsrmLegProviderConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the routing profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Fetches single legs from OSRM's `/route/v1` endpoint.
///
/// Every request asks for the full overview as GeoJSON. Distances are
/// reported in kilometres rounded to metres and durations in minutes
/// rounded to a tenth.
#[derive(Debug, Clone)]
pub struct OsrmLegProvider {
    client: Client,
    config: OsrmLegProviderConfig,
}

impl OsrmLegProvider {
    /// Create a provider for `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to
    /// build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(OsrmLegProviderConfig::new(base_url))
    }

    /// Create a provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to
    /// build.
    pub fn with_config(config: OsrmLegProviderConfig) -> Result<Self, ProviderBuildError> {
        validate_base_url(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        Ok(Self { client, config })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &OsrmLegProviderConfig {
        &self.config
    }

    /// Build the Route API URL for a leg.
    ///
    /// The URL format is
    /// `{base_url}/route/v1/{profile}/{lng},{lat};{lng},{lat}?overview=full&geometries=geojson`.
    fn build_route_url(&self, from: Coord<f64>, to: Coord<f64>) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            from.x,
            from.y,
            to.x,
            to.y
        )
    }

    /// Convert a reqwest error to a [`LegError`].
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> LegError {
        if error.is_timeout() {
            return LegError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return LegError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        LegError::NetworkError {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

fn validate_base_url(base_url: &str) -> Result<(), ProviderBuildError> {
    let invalid = |message: String| ProviderBuildError::InvalidBaseUrl {
        url: base_url.to_owned(),
        message,
    };
    let parsed = Url::parse(base_url).map_err(|err| invalid(err.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}

/// Convert an OSRM response to a [`RouteLeg`].
#[expect(clippy::float_arithmetic, reason = "unit conversion")]
fn convert_response(response: RouteResponse) -> Result<RouteLeg, LegError> {
    if !response.is_ok() {
        return Err(LegError::ServiceError {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| LegError::ParseError {
            message: "OSRM response contained no routes".to_owned(),
        })?;

    let geometry = route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lng, lat]| Coord { x: lng, y: lat })
        .collect();

    Ok(RouteLeg {
        distance_km: round_to(route.distance / 1000.0, 3),
        duration_minutes: round_to(route.duration / 60.0, 1),
        geometry,
        is_fallback: false,
    })
}

#[async_trait]
impl LegProvider for OsrmLegProvider {
    async fn fetch_leg(&self, from: Coord<f64>, to: Coord<f64>) -> Result<RouteLeg, LegError> {
        let url = self.build_route_url(from, to);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        let body: RouteResponse = response.json().await.map_err(|err| LegError::ParseError {
            message: err.to_string(),
        })?;

        convert_response(body)
    }
}
