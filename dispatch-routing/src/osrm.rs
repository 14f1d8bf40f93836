//! OSRM Route API response types.
//!
//! Only the fields needed to build a single leg are decoded: the status
//! code, the first route's distance and duration, and its GeoJSON line.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use serde::Deserialize;

/// OSRM Route API response.
#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    /// Status code from OSRM, `"Ok"` on success (`"NoRoute"`,
    /// `"InvalidQuery"` and friends otherwise).
    pub code: String,

    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,

    /// Alternative routes, best first.
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

impl RouteResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }
}

/// One route in a [`RouteResponse`].
#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    /// Distance in metres.
    pub distance: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Full-overview geometry.
    pub geometry: LineString,
}

/// GeoJSON `LineString` with `[lng, lat]` positions.
#[derive(Debug, Deserialize)]
pub struct LineString {
    /// Positions as `[longitude, latitude]`.
    pub coordinates: Vec<[f64; 2]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialise_success_response() {
        let json = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 1523.4,
                "duration": 187.2,
                "weight": 187.2,
                "geometry": {"type": "LineString", "coordinates": [[-86.78, 36.16], [-86.77, 36.17]]}
            }],
            "waypoints": []
        }"#;

        let response: RouteResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(response.is_ok());
        let route = response.routes.first().expect("one route");
        assert_eq!(route.geometry.coordinates.len(), 2);
        assert_eq!(route.geometry.coordinates.first(), Some(&[-86.78, 36.16]));
    }

    #[test]
    fn deserialise_error_response() {
        let json = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;

        let response: RouteResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(!response.is_ok());
        assert_eq!(
            response.message.as_deref(),
            Some("Impossible route between points")
        );
        assert!(response.routes.is_empty());
    }
}
