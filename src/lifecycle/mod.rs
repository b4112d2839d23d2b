use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};

/// Allowed successors for each status. Strictly forward; `delivered` and
/// `cancelled` are terminal.
pub fn successors(status: OrderStatus) -> &'static [OrderStatus] {
    match status {
        OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
        OrderStatus::Confirmed => &[OrderStatus::Assigned, OrderStatus::Cancelled],
        OrderStatus::Assigned => &[OrderStatus::PickedUp, OrderStatus::Cancelled],
        OrderStatus::PickedUp => &[OrderStatus::EnRoute],
        OrderStatus::EnRoute => &[OrderStatus::Delivered],
        OrderStatus::Delivered => &[],
        OrderStatus::Cancelled => &[],
    }
}

pub fn is_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    successors(from).contains(&to)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Status changed and the entry timestamp was recorded.
    Transitioned(DateTime<Utc>),
    /// The order was already in the target status. Nothing was written, so
    /// retrying a transition after a caller-side timeout is safe.
    NoOp,
}

/// Validates and applies a transition. The caller must hold the order's
/// store guard; serialization across concurrent requests comes from there.
pub fn apply(order: &mut Order, target: OrderStatus) -> Result<Applied, AppError> {
    if order.status == target {
        return Ok(Applied::NoOp);
    }

    if !is_allowed(order.status, target) {
        return Err(AppError::IllegalTransition(format!(
            "{:?} -> {:?} is not permitted",
            order.status, target
        )));
    }

    let now = Utc::now();
    order.status = target;
    order.status_timestamps.insert(target, now);

    Ok(Applied::Transitioned(now))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{apply, is_allowed, Applied};
    use crate::error::AppError;
    use crate::models::order::{DeliveryType, Order, OrderStatus};
    use crate::models::quote::{FeeBreakdown, PayoutBreakdown, Quote};

    fn test_order() -> Order {
        let quote = Quote {
            food_subtotal: Decimal::new(5000, 2),
            fees: FeeBreakdown {
                platform_fee: Decimal::new(300, 2),
                delivery_fee: Decimal::new(200, 2),
            },
            margin_pool: Decimal::new(500, 2),
            payouts: PayoutBreakdown {
                restaurant: Decimal::new(5000, 2),
                platform_net: Decimal::new(300, 2),
                driver_base: Decimal::new(200, 2),
            },
            customer_total: Decimal::new(5500, 2),
        };
        Order::new(
            "rest-1".to_string(),
            "cust-1".to_string(),
            quote,
            DeliveryType::HandToCustomer,
        )
    }

    #[test]
    fn happy_path_is_permitted() {
        let chain = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Assigned,
            OrderStatus::PickedUp,
            OrderStatus::EnRoute,
            OrderStatus::Delivered,
        ];
        for pair in chain.windows(2) {
            assert!(is_allowed(pair[0], pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn terminal_states_have_no_successors() {
        assert!(super::successors(OrderStatus::Delivered).is_empty());
        assert!(super::successors(OrderStatus::Cancelled).is_empty());
    }

    #[test]
    fn skipping_ahead_fails_and_leaves_status_unchanged() {
        let mut order = test_order();

        let err = apply(&mut order, OrderStatus::Delivered).unwrap_err();

        assert!(matches!(err, AppError::IllegalTransition(_)));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.status_timestamps.len(), 1);
    }

    #[test]
    fn transition_records_one_timestamp_per_entered_status() {
        let mut order = test_order();

        apply(&mut order, OrderStatus::Confirmed).unwrap();

        assert_eq!(order.status, OrderStatus::Confirmed);
        let entered: Vec<_> = order.status_timestamps.keys().copied().collect();
        assert_eq!(entered, vec![OrderStatus::Pending, OrderStatus::Confirmed]);
        assert!(
            order.status_timestamps[&OrderStatus::Confirmed]
                >= order.status_timestamps[&OrderStatus::Pending]
        );
    }

    #[test]
    fn reapplying_current_status_is_a_noop() {
        let mut order = test_order();
        apply(&mut order, OrderStatus::Confirmed).unwrap();
        let first_stamp = order.status_timestamps[&OrderStatus::Confirmed];

        let applied = apply(&mut order, OrderStatus::Confirmed).unwrap();

        assert_eq!(applied, Applied::NoOp);
        assert_eq!(order.status_timestamps[&OrderStatus::Confirmed], first_stamp);
        assert_eq!(order.status_timestamps.len(), 2);
    }

    #[test]
    fn cancellation_is_blocked_once_en_route() {
        let mut order = test_order();
        for target in [
            OrderStatus::Confirmed,
            OrderStatus::Assigned,
            OrderStatus::PickedUp,
            OrderStatus::EnRoute,
        ] {
            apply(&mut order, target).unwrap();
        }

        let err = apply(&mut order, OrderStatus::Cancelled).unwrap_err();
        assert!(matches!(err, AppError::IllegalTransition(_)));
        assert_eq!(order.status, OrderStatus::EnRoute);
    }
}
