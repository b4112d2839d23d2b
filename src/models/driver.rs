use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Duty state of a driver. Holding the assigned order inside the variant keeps
/// the availability invariant structural: a driver cannot be both available
/// and bound to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverDuty {
    Available,
    Offline,
    Assigned { order_id: Uuid },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub duty: DriverDuty,
    pub registered_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
}

impl Driver {
    pub fn new(name: String, phone: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            phone,
            duty: DriverDuty::Available,
            registered_at: Utc::now(),
            assigned_at: None,
            released_at: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.duty == DriverDuty::Available
    }

    pub fn current_order_id(&self) -> Option<Uuid> {
        match self.duty {
            DriverDuty::Assigned { order_id } => Some(order_id),
            _ => None,
        }
    }
}
