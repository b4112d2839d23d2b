use uuid::Uuid;

use crate::error::AppError;
use crate::models::actor::{Actor, Role};
use crate::models::order::Order;

/// Whether the actor may observe or act on the order.
///
/// Admins see everything. Customers are scoped to their own orders. Drivers
/// are scoped to the order they are bound to, which means no driver can see
/// or touch an order before assignment.
pub fn can_access(actor: &Actor, order: &Order) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Customer => order.customer_id == actor.identity,
        Role::Driver => match (order.driver_id(), actor.driver_id) {
            (Some(bound), Some(own)) => bound == own,
            _ => false,
        },
    }
}

pub fn require_access(actor: &Actor, order: &Order) -> Result<(), AppError> {
    if can_access(actor, order) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "actor may not access order {}",
            order.id
        )))
    }
}

pub fn require_role(actor: &Actor, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "requires one of {allowed:?}"
        )))
    }
}

/// Drivers may only act as themselves: any driver id carried in a request
/// body must match the id their credential is bound to. Admins may act on
/// behalf of any driver.
pub fn require_driver_match(actor: &Actor, body_driver_id: Uuid) -> Result<(), AppError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Driver if actor.driver_id == Some(body_driver_id) => Ok(()),
        _ => Err(AppError::Forbidden(
            "driver id does not match the authenticated driver".to_string(),
        )),
    }
}
