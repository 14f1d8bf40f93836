//! Stitched per-truck routes.

use geo::Coord;
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::RouteLeg;

/// Arrival estimate for one stop.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct StopEta {
    /// Order identifier of the stop.
    pub stop_id: String,
    /// Minutes after leaving the depot, dwell included.
    pub eta_minutes: f64,
    /// Driving kilometres from the depot.
    pub distance_from_depot_km: f64,
}

/// One truck's delivery route.
///
/// Polylines serialise as `[[lat, lng], ...]`; the raw legs stay in memory
/// only.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Route {
    /// Truck group label.
    pub route_id: u32,
    /// Stop identifiers in visiting order, depot excluded.
    pub stop_sequence: Vec<String>,
    /// Sum of the stop weights in kilograms.
    pub truck_load: f64,
    /// Driving distance in kilometres, return leg included.
    pub total_distance: f64,
    /// Driving time in minutes, return leg included.
    pub total_duration: f64,
    /// Full path from the depot back to the depot.
    #[cfg_attr(feature = "serde", serde(serialize_with = "latlng::serialize"))]
    pub polyline: Vec<Coord<f64>>,
    /// Path from the depot to the last stop.
    #[cfg_attr(feature = "serde", serde(serialize_with = "latlng::serialize"))]
    pub delivery_polyline: Vec<Coord<f64>>,
    /// Path from the last stop back to the depot.
    #[cfg_attr(feature = "serde", serde(serialize_with = "latlng::serialize"))]
    pub return_polyline: Vec<Coord<f64>>,
    /// Per-stop arrival estimates in visiting order.
    pub stop_etas: Vec<StopEta>,
    /// Whether any leg is a straight-line estimate.
    pub has_fallback: bool,
    /// Whether tour search failed and the route was emptied.
    pub degraded: bool,
    /// Legs the route was stitched from.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub legs: Vec<RouteLeg>,
}

impl Route {
    /// An empty route for a truck whose tour search failed.
    #[must_use]
    pub fn degraded(route_id: u32) -> Self {
        Self {
            route_id,
            degraded: true,
            ..Self::default()
        }
    }
}

#[cfg(feature = "serde")]
mod latlng {
    use geo::Coord;
    use serde::Serializer;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(coords: &[Coord<f64>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(coords.len()))?;
        for coord in coords {
            seq.serialize_element(&[coord.y, coord.x])?;
        }
        seq.end()
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn polylines_serialise_as_lat_lng_pairs() {
        let route = Route {
            route_id: 2,
            polyline: vec![Coord { x: -86.78, y: 36.16 }, Coord { x: -86.7, y: 36.2 }],
            ..Route::default()
        };
        let value = serde_json::to_value(&route).expect("serialise");
        assert_eq!(value["polyline"], json!([[36.16, -86.78], [36.2, -86.7]]));
        assert_eq!(value["route_id"], json!(2));
        assert!(value.get("legs").is_none());
    }

    #[rstest]
    fn degraded_route_is_empty() {
        let route = Route::degraded(3);
        assert!(route.degraded);
        assert!(route.stop_sequence.is_empty());
        assert!(route.truck_load.abs() < f64::EPSILON);
    }
}
