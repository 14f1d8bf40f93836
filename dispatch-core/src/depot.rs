//! The fixed depot every truck leaves from and returns to, plus fleet
//! defaults.

use geo::Coord;

/// Per-truck weight limit in kilograms used when no override is configured.
pub const DEFAULT_CAPACITY_KG: f64 = 1000.0;

/// Number of trucks requested when a request omits the fleet size.
pub const DEFAULT_TRUCK_COUNT: i64 = 5;

/// Default depot location (Nashville, TN).
pub const DEFAULT_DEPOT: Depot = Depot::new(36.1627, -86.7816);

/// Origin and destination shared by all trucks.
///
/// # Examples
///
/// ```
/// use dispatch_core::Depot;
///
/// let depot = Depot::new(36.1627, -86.7816);
/// assert_eq!(depot.lat(), 36.1627);
/// assert_eq!(depot.location.x, -86.7816);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Depot {
    /// Depot position (`x = longitude`, `y = latitude`).
    pub location: Coord<f64>,
}

impl Depot {
    /// Create a depot from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self {
            location: Coord { x: lng, y: lat },
        }
    }

    /// Depot latitude.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.location.y
    }

    /// Depot longitude.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.location.x
    }
}

impl Default for Depot {
    fn default() -> Self {
        DEFAULT_DEPOT
    }
}
