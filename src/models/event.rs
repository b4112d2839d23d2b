use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::OrderStatus;

/// Status change notification pushed to websocket subscribers. Best-effort:
/// the stores remain the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub driver_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}
