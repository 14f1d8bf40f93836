//! Optimisation requests and their validation.
//!
//! Requests arrive from untrusted callers, so every order field is optional
//! at this layer. [`OptimizeRequest::validate`] turns a request into checked
//! [`Order`] values or reports the first violated constraint.

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DEFAULT_TRUCK_COUNT, Order};

/// Errors returned by [`OptimizeRequest::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// The request contained no orders.
    #[error("orders list cannot be empty")]
    NoOrders,
    /// A required order field was absent.
    #[error("order at index {index} is missing required field `{field}`")]
    MissingField {
        /// Position of the order in the request.
        index: usize,
        /// Name of the missing field.
        field: &'static str,
    },
    /// An order identifier was empty or whitespace.
    #[error("order at index {index} has an empty id")]
    EmptyOrderId {
        /// Position of the order in the request.
        index: usize,
    },
    /// The same identifier was used for more than one order.
    #[error("order id {id:?} appears more than once")]
    DuplicateOrderId {
        /// The repeated identifier.
        id: String,
    },
    /// A latitude or longitude was non-finite or out of range.
    #[error("order {id:?} has invalid {field} {value}")]
    InvalidCoordinate {
        /// Offending order.
        id: String,
        /// `"lat"` or `"lng"`.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A weight was zero, negative or non-finite.
    #[error("order {id:?} must have a positive weight, got {weight}")]
    NonPositiveWeight {
        /// Offending order.
        id: String,
        /// The rejected weight.
        weight: f64,
    },
    /// The fleet size was zero or negative.
    #[error("truck count must be positive, got {value}")]
    NonPositiveTruckCount {
        /// The rejected fleet size.
        value: i64,
    },
    /// The fleet size does not fit the platform's address space.
    #[error("truck count {value} is too large")]
    TruckCountTooLarge {
        /// The rejected fleet size.
        value: i64,
    },
}

/// Unvalidated order as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct OrderRecord {
    /// Order identifier.
    pub id: Option<String>,
    /// Latitude in degrees.
    pub lat: Option<f64>,
    /// Longitude in degrees.
    pub lng: Option<f64>,
    /// Weight in kilograms.
    #[cfg_attr(feature = "serde", serde(alias = "weight"))]
    pub weight_kg: Option<f64>,
}

impl From<&Order> for OrderRecord {
    fn from(order: &Order) -> Self {
        Self {
            id: Some(order.id.clone()),
            lat: Some(order.lat()),
            lng: Some(order.lng()),
            weight_kg: Some(order.weight_kg),
        }
    }
}

/// A batch of orders and the fleet size available to serve them.
///
/// # Examples
///
/// ```
/// use dispatch_core::{Order, OptimizeRequest};
///
/// let request = OptimizeRequest::from_orders(&[Order::new("A", 36.1, -86.7, 40.0)], 2);
/// let validated = request.validate()?;
/// assert_eq!(validated.truck_count, 2);
/// assert_eq!(validated.orders[0].id, "A");
/// # Ok::<(), dispatch_core::InputError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct OptimizeRequest {
    /// Orders to plan.
    pub orders: Vec<OrderRecord>,
    /// Requested fleet size.
    #[cfg_attr(
        feature = "serde",
        serde(alias = "num_trucks", default = "default_truck_count")
    )]
    pub truck_count: i64,
}

#[cfg(feature = "serde")]
const fn default_truck_count() -> i64 {
    DEFAULT_TRUCK_COUNT
}

impl Default for OptimizeRequest {
    fn default() -> Self {
        Self {
            orders: Vec::new(),
            truck_count: DEFAULT_TRUCK_COUNT,
        }
    }
}

/// Request contents after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    /// Checked orders in input order.
    pub orders: Vec<Order>,
    /// Requested fleet size, at least one.
    pub truck_count: usize,
}

impl OptimizeRequest {
    /// Build a request from already-constructed orders.
    #[must_use]
    pub fn from_orders(orders: &[Order], truck_count: i64) -> Self {
        Self {
            orders: orders.iter().map(OrderRecord::from).collect(),
            truck_count,
        }
    }

    /// Check every order and the fleet size.
    ///
    /// # Errors
    ///
    /// Returns the first [`InputError`] encountered, checking the order list
    /// and fleet size before individual orders.
    pub fn validate(&self) -> Result<ValidatedRequest, InputError> {
        if self.orders.is_empty() {
            return Err(InputError::NoOrders);
        }
        if self.truck_count <= 0 {
            return Err(InputError::NonPositiveTruckCount {
                value: self.truck_count,
            });
        }
        let truck_count = usize::try_from(self.truck_count).map_err(|_| {
            InputError::TruckCountTooLarge {
                value: self.truck_count,
            }
        })?;

        let mut seen = HashSet::with_capacity(self.orders.len());
        let mut orders = Vec::with_capacity(self.orders.len());
        for (index, record) in self.orders.iter().enumerate() {
            let order = validate_record(index, record)?;
            if !seen.insert(order.id.clone()) {
                return Err(InputError::DuplicateOrderId { id: order.id });
            }
            orders.push(order);
        }
        Ok(ValidatedRequest {
            orders,
            truck_count,
        })
    }

    /// Sum of all order weights that carry one, in kilograms.
    #[must_use]
    pub fn total_weight_kg(&self) -> f64 {
        self.orders.iter().filter_map(|record| record.weight_kg).sum()
    }
}

fn validate_record(index: usize, record: &OrderRecord) -> Result<Order, InputError> {
    let id = record
        .id
        .as_deref()
        .ok_or(InputError::MissingField { index, field: "id" })?;
    if id.trim().is_empty() {
        return Err(InputError::EmptyOrderId { index });
    }
    let lat = record
        .lat
        .ok_or(InputError::MissingField { index, field: "lat" })?;
    let lng = record
        .lng
        .ok_or(InputError::MissingField { index, field: "lng" })?;
    let weight = record.weight_kg.ok_or(InputError::MissingField {
        index,
        field: "weight_kg",
    })?;

    check_coordinate(id, "lat", lat, 90.0)?;
    check_coordinate(id, "lng", lng, 180.0)?;
    if !weight.is_finite() || weight <= 0.0 {
        return Err(InputError::NonPositiveWeight {
            id: id.to_owned(),
            weight,
        });
    }
    Ok(Order::new(id, lat, lng, weight))
}

fn check_coordinate(id: &str, field: &'static str, value: f64, limit: f64) -> Result<(), InputError> {
    if value.is_finite() && (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(InputError::InvalidCoordinate {
            id: id.to_owned(),
            field,
            value,
        })
    }
}
