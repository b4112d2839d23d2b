use std::collections::BTreeMap;
use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::quote::Quote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Assigned,
    PickedUp,
    EnRoute,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Wire/label form, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Assigned => "assigned",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::EnRoute => "en_route",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    #[default]
    HandToCustomer,
    LeaveAtDoor,
}

/// Driver binding with the payouts locked at assignment time.
///
/// All-or-nothing by construction: an order either has no binding at all or a
/// complete one, so a half-assigned order cannot be represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverBinding {
    pub driver_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub driver_payout: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub platform_payout: Decimal,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryProof {
    Photo(String),
    Handoff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPing {
    pub lat: f64,
    pub lng: f64,
    pub accuracy_m: Option<f64>,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub restaurant_id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub quote: Quote,
    pub delivery_type: DeliveryType,
    /// One entry per status actually entered, written at the moment of entry.
    pub status_timestamps: BTreeMap<OrderStatus, DateTime<Utc>>,
    pub assignment: Option<DriverBinding>,
    pub pickup_photo: Option<String>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub delivery_proof: Option<DeliveryProof>,
    pub last_location: Option<LocationPing>,
    pub location_history: VecDeque<LocationPing>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        restaurant_id: String,
        customer_id: String,
        quote: Quote,
        delivery_type: DeliveryType,
    ) -> Self {
        let now = Utc::now();
        let mut status_timestamps = BTreeMap::new();
        status_timestamps.insert(OrderStatus::Pending, now);

        Self {
            id: Uuid::new_v4(),
            restaurant_id,
            customer_id,
            status: OrderStatus::Pending,
            quote,
            delivery_type,
            status_timestamps,
            assignment: None,
            pickup_photo: None,
            arrived_at: None,
            delivery_proof: None,
            last_location: None,
            location_history: VecDeque::new(),
            created_at: now,
        }
    }

    pub fn driver_id(&self) -> Option<Uuid> {
        self.assignment.as_ref().map(|binding| binding.driver_id)
    }
}
