use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Driver,
    Admin,
}

/// Authenticated caller context, resolved upstream of this service.
///
/// Credential verification happens at the gateway; the core only sees the
/// already-established role and identity, and for drivers the driver record
/// the credential is bound to.
#[derive(Debug, Clone)]
pub struct Actor {
    pub role: Role,
    pub identity: String,
    pub driver_id: Option<Uuid>,
}

impl Actor {
    pub fn customer(identity: impl Into<String>) -> Self {
        Self {
            role: Role::Customer,
            identity: identity.into(),
            driver_id: None,
        }
    }

    pub fn driver(identity: impl Into<String>, driver_id: Uuid) -> Self {
        Self {
            role: Role::Driver,
            identity: identity.into(),
            driver_id: Some(driver_id),
        }
    }

    pub fn admin(identity: impl Into<String>) -> Self {
        Self {
            role: Role::Admin,
            identity: identity.into(),
            driver_id: None,
        }
    }
}
