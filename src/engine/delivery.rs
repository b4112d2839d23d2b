use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth;
use crate::engine::{dispatch, note_transition};
use crate::error::AppError;
use crate::lifecycle::{self, Applied};
use crate::models::actor::{Actor, Role};
use crate::models::order::{DeliveryProof, DeliveryType, Order, OrderStatus};
use crate::state::AppState;

/// Driver confirms pickup at the restaurant, with photo evidence.
pub fn confirm_pickup(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    driver_id: Uuid,
    photo_ref: String,
) -> Result<Order, AppError> {
    auth::require_role(actor, &[Role::Driver, Role::Admin])?;
    auth::require_driver_match(actor, driver_id)?;

    if photo_ref.trim().is_empty() {
        return Err(AppError::Validation("photo_ref cannot be empty".to_string()));
    }

    let mut order = state
        .orders
        .get_mut(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    auth::require_access(actor, &order)?;
    require_bound(&order, driver_id)?;

    if let Applied::Transitioned(_) = lifecycle::apply(&mut order, OrderStatus::PickedUp)? {
        order.pickup_photo = Some(photo_ref);
        note_transition(state, &order);
        info!(order_id = %order.id, "pickup confirmed");
    }

    Ok(order.clone())
}

/// Driver leaves the restaurant towards the customer.
pub fn start_delivery(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    driver_id: Uuid,
) -> Result<Order, AppError> {
    auth::require_role(actor, &[Role::Driver, Role::Admin])?;
    auth::require_driver_match(actor, driver_id)?;

    let mut order = state
        .orders
        .get_mut(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    auth::require_access(actor, &order)?;
    require_bound(&order, driver_id)?;

    if let Applied::Transitioned(_) = lifecycle::apply(&mut order, OrderStatus::EnRoute)? {
        note_transition(state, &order);
        info!(order_id = %order.id, "delivery started");
    }

    Ok(order.clone())
}

/// Records that the driver reached the dropoff. Not a status: the order
/// stays en_route, but completion requires this to have happened. The first
/// arrival timestamp wins; repeats are acknowledged without rewriting it.
pub fn mark_arrival(state: &AppState, actor: &Actor, order_id: Uuid) -> Result<(), AppError> {
    auth::require_role(actor, &[Role::Driver, Role::Admin])?;

    let mut order = state
        .orders
        .get_mut(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    auth::require_access(actor, &order)?;

    if order.status != OrderStatus::EnRoute {
        return Err(AppError::PreconditionFailed(format!(
            "arrival can only be recorded en_route, order is {:?}",
            order.status
        )));
    }

    if order.arrived_at.is_none() {
        order.arrived_at = Some(Utc::now());
        info!(order_id = %order.id, "arrival recorded");
    }

    Ok(())
}

/// Completes the delivery with type-specific proof and releases the driver
/// back into rotation, all in one guarded step.
pub fn complete_delivery(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    driver_id: Uuid,
    photo_ref: Option<String>,
    handed_to_customer: Option<bool>,
) -> Result<Order, AppError> {
    auth::require_role(actor, &[Role::Driver, Role::Admin])?;
    auth::require_driver_match(actor, driver_id)?;

    let mut order = state
        .orders
        .get_mut(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    auth::require_access(actor, &order)?;
    require_bound(&order, driver_id)?;

    // Retry of an already-completed delivery.
    if order.status == OrderStatus::Delivered {
        return Ok(order.clone());
    }

    if order.status != OrderStatus::EnRoute {
        return Err(AppError::IllegalTransition(format!(
            "{:?} -> Delivered is not permitted",
            order.status
        )));
    }
    if order.arrived_at.is_none() {
        return Err(AppError::PreconditionFailed(
            "arrival has not been recorded for this order".to_string(),
        ));
    }

    let proof = match order.delivery_type {
        DeliveryType::LeaveAtDoor => {
            let photo = photo_ref
                .filter(|photo| !photo.trim().is_empty())
                .ok_or_else(|| {
                    AppError::PreconditionFailed(
                        "leave_at_door delivery requires a photo".to_string(),
                    )
                })?;
            DeliveryProof::Photo(photo)
        }
        DeliveryType::HandToCustomer => {
            if handed_to_customer != Some(true) {
                return Err(AppError::PreconditionFailed(
                    "hand_to_customer delivery requires handoff confirmation".to_string(),
                ));
            }
            DeliveryProof::Handoff
        }
    };

    order.delivery_proof = Some(proof);
    lifecycle::apply(&mut order, OrderStatus::Delivered)?;
    dispatch::release_driver(state, driver_id);
    note_transition(state, &order);
    info!(order_id = %order.id, driver_id = %driver_id, "delivery completed");

    Ok(order.clone())
}

fn require_bound(order: &Order, driver_id: Uuid) -> Result<(), AppError> {
    if order.driver_id() == Some(driver_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "order {} is not bound to driver {driver_id}",
            order.id
        )))
    }
}
