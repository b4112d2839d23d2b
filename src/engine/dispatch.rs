use chrono::{DateTime, Utc};
use dashmap::mapref::one::RefMut;
use tracing::info;
use uuid::Uuid;

use crate::auth;
use crate::engine::note_transition;
use crate::error::AppError;
use crate::lifecycle;
use crate::models::actor::{Actor, Role};
use crate::models::driver::{Driver, DriverDuty};
use crate::models::order::{DriverBinding, LocationPing, Order, OrderStatus};
use crate::state::AppState;

/// Binds a confirmed order to a driver, locking the payouts computed at
/// order creation into the binding. The order mutation and the driver duty
/// flip happen under both entity guards (order first, then driver), so
/// concurrent dispatches observe either the full assignment or none of it.
pub fn assign_driver(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    requested_driver_id: Option<Uuid>,
) -> Result<Order, AppError> {
    let result = do_assign(state, actor, order_id, requested_driver_id);

    let outcome = if result.is_ok() { "success" } else { "error" };
    state
        .metrics
        .assignments_total
        .with_label_values(&[outcome])
        .inc();

    result
}

fn do_assign(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    requested_driver_id: Option<Uuid>,
) -> Result<Order, AppError> {
    auth::require_role(actor, &[Role::Admin])?;

    let mut order = state
        .orders
        .get_mut(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if order.assignment.is_some() {
        return Err(AppError::Conflict(format!(
            "order {order_id} already has a driver"
        )));
    }
    if order.status != OrderStatus::Confirmed {
        return Err(AppError::PreconditionFailed(format!(
            "order must be confirmed to dispatch, is {:?}",
            order.status
        )));
    }

    let mut driver = match requested_driver_id {
        Some(driver_id) => {
            let driver = state
                .drivers
                .get_mut(driver_id)
                .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;
            if !driver.is_available() {
                return Err(AppError::Conflict(format!("driver {driver_id} unavailable")));
            }
            driver
        }
        None => select_driver(state)?,
    };

    let now = Utc::now();
    let binding = DriverBinding {
        driver_id: driver.id,
        driver_payout: order.quote.payouts.driver_base,
        platform_payout: order.quote.payouts.platform_net,
        assigned_at: now,
    };

    lifecycle::apply(&mut order, OrderStatus::Assigned)?;
    order.assignment = Some(binding);

    driver.duty = DriverDuty::Assigned { order_id };
    driver.assigned_at = Some(now);
    state.metrics.drivers_available.dec();

    note_transition(state, &order);
    info!(order_id = %order.id, driver_id = %driver.id, "driver assigned");

    Ok(order.clone())
}

/// Deterministic auto-selection: the earliest-registered available driver
/// wins, id as tie-break. Availability is re-checked under the driver's own
/// guard, since a candidate can be taken between the scan and the lock.
fn select_driver(
    state: &AppState,
) -> Result<RefMut<'_, Uuid, Driver>, AppError> {
    let mut candidates: Vec<(DateTime<Utc>, Uuid)> = state
        .drivers
        .snapshot()
        .into_iter()
        .filter(|driver| driver.is_available())
        .map(|driver| (driver.registered_at, driver.id))
        .collect();
    candidates.sort();

    for (_, driver_id) in candidates {
        if let Some(driver) = state.drivers.get_mut(driver_id) {
            if driver.is_available() {
                return Ok(driver);
            }
        }
    }

    Err(AppError::NoDriversAvailable)
}

/// Puts a driver back in rotation. Called while the releasing order's guard
/// is still held, so the duty flip lands in the same atomic step as the
/// order's terminal transition.
pub(crate) fn release_driver(state: &AppState, driver_id: Uuid) {
    if let Some(mut driver) = state.drivers.get_mut(driver_id) {
        if driver.current_order_id().is_some() {
            driver.duty = DriverDuty::Available;
            driver.released_at = Some(Utc::now());
            state.metrics.drivers_available.inc();
            info!(driver_id = %driver.id, "driver released");
        }
    }
}

/// Accepts a position report from the bound driver (or an admin) while the
/// order is in flight. History is bounded; the oldest entries are evicted
/// in the same guarded step as the append.
pub fn report_location(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    lat: f64,
    lng: f64,
    accuracy_m: Option<f64>,
) -> Result<(), AppError> {
    auth::require_role(actor, &[Role::Driver, Role::Admin])?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::Validation("lat must be within [-90, 90]".to_string()));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::Validation("lng must be within [-180, 180]".to_string()));
    }
    if accuracy_m.is_some_and(|acc| acc < 0.0 || !acc.is_finite()) {
        return Err(AppError::Validation("accuracy must be >= 0".to_string()));
    }

    let mut order = state
        .orders
        .get_mut(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    auth::require_access(actor, &order)?;

    if !matches!(
        order.status,
        OrderStatus::Assigned | OrderStatus::PickedUp | OrderStatus::EnRoute
    ) {
        return Err(AppError::PreconditionFailed(format!(
            "location reports not accepted while order is {:?}",
            order.status
        )));
    }

    let ping = LocationPing {
        lat,
        lng,
        accuracy_m,
        reported_at: Utc::now(),
    };

    order.location_history.push_back(ping.clone());
    while order.location_history.len() > state.location_history_cap {
        order.location_history.pop_front();
    }
    order.last_location = Some(ping);

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::{assign_driver, report_location};
    use crate::engine::{drivers, orders};
    use crate::engine::orders::CreateOrder;
    use crate::error::AppError;
    use crate::models::actor::Actor;
    use crate::models::order::{DeliveryType, Order, OrderStatus};
    use crate::state::AppState;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(16, 5))
    }

    fn confirmed_order(state: &AppState, customer: &str) -> Order {
        let actor = Actor::customer(customer);
        let order = orders::create_order(
            state,
            &actor,
            CreateOrder {
                restaurant_id: "rest-1".to_string(),
                customer_id: None,
                food_subtotal: dec("50.00"),
                platform_fee: dec("3.00"),
                delivery_fee: dec("2.00"),
                delivery_type: DeliveryType::HandToCustomer,
            },
        )
        .unwrap();
        orders::confirm_order(state, &actor, order.id).unwrap()
    }

    #[test]
    fn assign_requires_confirmed_order() {
        let state = state();
        let admin = Actor::admin("ops");
        let order = orders::create_order(
            &state,
            &Actor::customer("cust-1"),
            CreateOrder {
                restaurant_id: "rest-1".to_string(),
                customer_id: None,
                food_subtotal: dec("50.00"),
                platform_fee: dec("3.00"),
                delivery_fee: dec("2.00"),
                delivery_type: DeliveryType::HandToCustomer,
            },
        )
        .unwrap();
        drivers::register_driver(&state, &admin, "Ama".to_string(), "+233200000001".to_string())
            .unwrap();

        let err = assign_driver(&state, &admin, order.id, None).unwrap_err();

        assert!(matches!(err, AppError::PreconditionFailed(_)));
        assert_eq!(
            state.orders.get(order.id).unwrap().status,
            OrderStatus::Pending
        );
    }

    #[test]
    fn assign_locks_payouts_and_takes_driver_out_of_rotation() {
        let state = state();
        let admin = Actor::admin("ops");
        let order = confirmed_order(&state, "cust-1");
        let driver =
            drivers::register_driver(&state, &admin, "Ama".to_string(), "+233200000001".to_string())
                .unwrap();

        let assigned = assign_driver(&state, &admin, order.id, None).unwrap();

        assert_eq!(assigned.status, OrderStatus::Assigned);
        let binding = assigned.assignment.unwrap();
        assert_eq!(binding.driver_id, driver.id);
        assert_eq!(binding.driver_payout, dec("2.00"));
        assert_eq!(binding.platform_payout, dec("3.00"));

        let driver = state.drivers.get(driver.id).unwrap();
        assert!(!driver.is_available());
        assert_eq!(driver.current_order_id(), Some(assigned.id));
    }

    #[test]
    fn second_assignment_of_same_order_conflicts() {
        let state = state();
        let admin = Actor::admin("ops");
        let order = confirmed_order(&state, "cust-1");
        drivers::register_driver(&state, &admin, "Ama".to_string(), "+233200000001".to_string())
            .unwrap();
        drivers::register_driver(&state, &admin, "Kojo".to_string(), "+233200000002".to_string())
            .unwrap();

        assign_driver(&state, &admin, order.id, None).unwrap();
        let err = assign_driver(&state, &admin, order.id, None).unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn auto_selection_picks_earliest_registered_available() {
        let state = state();
        let admin = Actor::admin("ops");
        let first =
            drivers::register_driver(&state, &admin, "Ama".to_string(), "+233200000001".to_string())
                .unwrap();
        let second =
            drivers::register_driver(&state, &admin, "Kojo".to_string(), "+233200000002".to_string())
                .unwrap();
        drivers::set_availability(&state, &admin, first.id, false).unwrap();

        let order = confirmed_order(&state, "cust-1");
        let assigned = assign_driver(&state, &admin, order.id, None).unwrap();
        assert_eq!(assigned.driver_id(), Some(second.id));

        drivers::set_availability(&state, &admin, first.id, true).unwrap();
        let other = confirmed_order(&state, "cust-2");
        let assigned = assign_driver(&state, &admin, other.id, None).unwrap();
        assert_eq!(assigned.driver_id(), Some(first.id));
    }

    #[test]
    fn no_available_driver_is_unavailable_not_a_panic() {
        let state = state();
        let admin = Actor::admin("ops");
        let order = confirmed_order(&state, "cust-1");

        let err = assign_driver(&state, &admin, order.id, None).unwrap_err();
        assert!(matches!(err, AppError::NoDriversAvailable));
    }

    #[test]
    fn contended_driver_goes_to_exactly_one_order() {
        let state = state();
        let admin = Actor::admin("ops");
        let driver =
            drivers::register_driver(&state, &admin, "Ama".to_string(), "+233200000001".to_string())
                .unwrap();
        let order_a = confirmed_order(&state, "cust-1");
        let order_b = confirmed_order(&state, "cust-2");

        let results: Vec<_> = [order_a.id, order_b.id]
            .into_iter()
            .map(|order_id| {
                let state = state.clone();
                let driver_id = driver.id;
                std::thread::spawn(move || {
                    assign_driver(&state, &Actor::admin("ops"), order_id, Some(driver_id))
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        let winners = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .any(|result| matches!(result, Err(AppError::Conflict(_)))));

        let driver = state.drivers.get(driver.id).unwrap();
        assert!(driver.current_order_id().is_some());
    }

    #[test]
    fn location_history_is_bounded() {
        let state = state();
        let admin = Actor::admin("ops");
        let order = confirmed_order(&state, "cust-1");
        let driver =
            drivers::register_driver(&state, &admin, "Ama".to_string(), "+233200000001".to_string())
                .unwrap();
        assign_driver(&state, &admin, order.id, Some(driver.id)).unwrap();

        let actor = Actor::driver("drv-acct", driver.id);
        for i in 0..12 {
            report_location(&state, &actor, order.id, 5.10 + i as f64 * 0.001, -1.25, Some(8.0))
                .unwrap();
        }

        let order = state.orders.get(order.id).unwrap();
        assert_eq!(order.location_history.len(), 5);
        let last = order.last_location.unwrap();
        assert!((last.lat - 5.111).abs() < 1e-9);
    }

    #[test]
    fn location_from_unbound_driver_is_forbidden() {
        let state = state();
        let admin = Actor::admin("ops");
        let order = confirmed_order(&state, "cust-1");
        let driver =
            drivers::register_driver(&state, &admin, "Ama".to_string(), "+233200000001".to_string())
                .unwrap();
        assign_driver(&state, &admin, order.id, Some(driver.id)).unwrap();

        let stranger = Actor::driver("other-acct", uuid::Uuid::new_v4());
        let err = report_location(&state, &stranger, order.id, 5.1, -1.2, None).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn location_rejected_before_assignment() {
        let state = state();
        let order = confirmed_order(&state, "cust-1");

        let err = report_location(&state, &Actor::admin("ops"), order.id, 5.1, -1.2, None)
            .unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(_)));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected_before_lookup() {
        let state = state();
        let err = report_location(
            &state,
            &Actor::admin("ops"),
            uuid::Uuid::new_v4(),
            91.0,
            0.0,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
