//! Delivery orders.

use geo::Coord;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::DEFAULT_DEPOT;

/// A single delivery: where it goes and how much it weighs.
///
/// Orders are immutable once validated; see
/// [`OptimizeRequest::validate`](crate::OptimizeRequest::validate) for the
/// checked path from untrusted input.
///
/// # Examples
///
/// ```
/// use dispatch_core::Order;
///
/// let order = Order::new("ORD-001", 36.17, -86.78, 120.0);
/// assert_eq!(order.lat(), 36.17);
/// assert_eq!(order.location.x, -86.78);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Unique identifier supplied by the caller.
    pub id: String,
    /// Delivery position (`x = longitude`, `y = latitude`).
    pub location: Coord<f64>,
    /// Shipment weight in kilograms.
    pub weight_kg: f64,
}

impl Order {
    /// Construct an order without validation.
    pub fn new(id: impl Into<String>, lat: f64, lng: f64, weight_kg: f64) -> Self {
        Self {
            id: id.into(),
            location: Coord { x: lng, y: lat },
            weight_kg,
        }
    }

    /// Delivery latitude.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.location.y
    }

    /// Delivery longitude.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.location.x
    }
}

/// Generate a reproducible batch of orders scattered around the default
/// depot.
///
/// Orders are named `ORD-001`, `ORD-002`, ... and fall within ±0.08° of
/// latitude and ±0.10° of longitude of the depot, weighing 20–299 kg. The
/// same `seed` always yields the same batch.
///
/// # Examples
///
/// ```
/// use dispatch_core::sample_orders;
///
/// let orders = sample_orders(3, 42);
/// assert_eq!(orders.len(), 3);
/// assert_eq!(orders[0].id, "ORD-001");
/// assert_eq!(orders, sample_orders(3, 42));
/// ```
#[must_use]
pub fn sample_orders(count: usize, seed: u64) -> Vec<Order> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (1..=count)
        .map(|i| {
            let lat = DEFAULT_DEPOT.lat() + rng.gen_range(-0.08..0.08);
            let lng = DEFAULT_DEPOT.lng() + rng.gen_range(-0.10..0.10);
            let weight = f64::from(rng.gen_range(20_u32..300));
            Order::new(format!("ORD-{i:03}"), lat, lng, weight)
        })
        .collect()
}
