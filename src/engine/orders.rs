use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::auth;
use crate::engine::{dispatch, note_transition};
use crate::error::AppError;
use crate::lifecycle::{self, Applied};
use crate::models::actor::{Actor, Role};
use crate::models::order::{DeliveryType, Order, OrderStatus};
use crate::pricing;
use crate::state::AppState;

pub struct CreateOrder {
    pub restaurant_id: String,
    /// Required for admins acting on a customer's behalf; customers default
    /// to their own identity.
    pub customer_id: Option<String>,
    pub food_subtotal: Decimal,
    pub platform_fee: Decimal,
    pub delivery_fee: Decimal,
    pub delivery_type: DeliveryType,
}

pub fn create_order(state: &AppState, actor: &Actor, req: CreateOrder) -> Result<Order, AppError> {
    auth::require_role(actor, &[Role::Customer, Role::Admin])?;

    if req.restaurant_id.trim().is_empty() {
        return Err(AppError::Validation("restaurant_id cannot be empty".to_string()));
    }

    let customer_id = match actor.role {
        Role::Customer => match req.customer_id {
            Some(ref id) if *id != actor.identity => {
                return Err(AppError::Forbidden(
                    "customers may only create orders for themselves".to_string(),
                ));
            }
            _ => actor.identity.clone(),
        },
        _ => req.customer_id.ok_or_else(|| {
            AppError::Validation("customer_id is required for admin-created orders".to_string())
        })?,
    };

    let quote = pricing::quote(req.food_subtotal, req.platform_fee, req.delivery_fee)?;
    let order = Order::new(req.restaurant_id, customer_id, quote, req.delivery_type);

    state.orders.insert(order.id, order.clone());
    state.metrics.orders_created_total.inc();
    info!(order_id = %order.id, restaurant_id = %order.restaurant_id, "order created");

    Ok(order)
}

pub fn get_order(state: &AppState, actor: &Actor, order_id: Uuid) -> Result<Order, AppError> {
    let order = state
        .orders
        .get(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    auth::require_access(actor, &order)?;
    Ok(order)
}

pub fn confirm_order(state: &AppState, actor: &Actor, order_id: Uuid) -> Result<Order, AppError> {
    auth::require_role(actor, &[Role::Customer, Role::Admin])?;

    let mut order = state
        .orders
        .get_mut(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    auth::require_access(actor, &order)?;

    if let Applied::Transitioned(_) = lifecycle::apply(&mut order, OrderStatus::Confirmed)? {
        note_transition(state, &order);
        info!(order_id = %order.id, "order confirmed");
    }

    Ok(order.clone())
}

/// Administrative escape hatch: any table-legal transition, except that
/// `assigned` must go through dispatch so payouts get locked and a driver
/// bound. Reaching a terminal state releases a bound driver in the same
/// guarded step.
pub fn set_status(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    target: OrderStatus,
) -> Result<Order, AppError> {
    auth::require_role(actor, &[Role::Admin])?;

    if target == OrderStatus::Assigned {
        return Err(AppError::PreconditionFailed(
            "driver assignment must go through dispatch".to_string(),
        ));
    }

    let mut order = state
        .orders
        .get_mut(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if let Applied::Transitioned(_) = lifecycle::apply(&mut order, target)? {
        if target.is_terminal() {
            if let Some(driver_id) = order.driver_id() {
                dispatch::release_driver(state, driver_id);
            }
        }
        note_transition(state, &order);
        info!(order_id = %order.id, status = target.as_str(), "status overridden");
    }

    Ok(order.clone())
}
