use rust_decimal::Decimal;

use crate::error::AppError;
use crate::models::quote::{FeeBreakdown, PayoutBreakdown, Quote};

/// Split of the margin pool between platform and driver.
const PLATFORM_SHARE: Decimal = Decimal::from_parts(6, 0, 0, false, 1); // 0.6
const DRIVER_SHARE: Decimal = Decimal::from_parts(4, 0, 0, false, 1); // 0.4

/// Computes the pricing snapshot for an order.
///
/// The margin pool (platform fee + delivery fee) is split 60/40 between the
/// platform and the driver. If rounding the two shares independently would
/// leak or invent a cent, the driver share absorbs the difference so the
/// split always reconstitutes the pool exactly. A zero pool is accepted and
/// yields a zero split.
pub fn quote(
    food_subtotal: Decimal,
    platform_fee: Decimal,
    delivery_fee: Decimal,
) -> Result<Quote, AppError> {
    let food_subtotal = validate_amount("food_subtotal", food_subtotal)?;
    let platform_fee = validate_amount("platform_fee", platform_fee)?;
    let delivery_fee = validate_amount("delivery_fee", delivery_fee)?;

    if food_subtotal <= Decimal::ZERO {
        return Err(AppError::Validation(
            "food_subtotal must be > 0".to_string(),
        ));
    }

    let margin_pool = platform_fee + delivery_fee;

    let platform_net = (margin_pool * PLATFORM_SHARE).round_dp(2);
    let mut driver_base = (margin_pool * DRIVER_SHARE).round_dp(2);
    if platform_net + driver_base != margin_pool {
        driver_base = margin_pool - platform_net;
    }

    let customer_total = (food_subtotal + margin_pool).round_dp(2);

    Ok(Quote {
        food_subtotal,
        fees: FeeBreakdown {
            platform_fee,
            delivery_fee,
        },
        margin_pool,
        payouts: PayoutBreakdown {
            restaurant: food_subtotal,
            platform_net,
            driver_base,
        },
        customer_total,
    })
}

fn validate_amount(field: &str, value: Decimal) -> Result<Decimal, AppError> {
    if value < Decimal::ZERO {
        return Err(AppError::Validation(format!("{field} must be >= 0")));
    }
    if value != value.round_dp(2) {
        return Err(AppError::Validation(format!(
            "{field} has more than 2 decimal places"
        )));
    }
    Ok(value.round_dp(2))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::quote;
    use crate::error::AppError;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn standard_pool_splits_sixty_forty() {
        let q = quote(dec("50.00"), dec("3.00"), dec("2.00")).unwrap();

        assert_eq!(q.margin_pool, dec("5.00"));
        assert_eq!(q.payouts.platform_net, dec("3.00"));
        assert_eq!(q.payouts.driver_base, dec("2.00"));
        assert_eq!(q.payouts.restaurant, dec("50.00"));
        assert_eq!(q.customer_total, dec("55.00"));
    }

    #[test]
    fn split_reconstitutes_pool_under_rounding() {
        let pools = [
            ("0.01", "0.00"),
            ("0.00", "0.03"),
            ("1.11", "2.22"),
            ("0.17", "0.46"),
            ("99.99", "0.01"),
            ("7.77", "0.00"),
        ];

        for (platform_fee, delivery_fee) in pools {
            let q = quote(dec("10.00"), dec(platform_fee), dec(delivery_fee)).unwrap();
            assert_eq!(
                q.payouts.platform_net + q.payouts.driver_base,
                q.margin_pool,
                "pool {platform_fee}+{delivery_fee} leaked cents"
            );
        }
    }

    #[test]
    fn zero_pool_is_accepted() {
        let q = quote(dec("12.50"), dec("0.00"), dec("0.00")).unwrap();

        assert_eq!(q.margin_pool, Decimal::ZERO);
        assert_eq!(q.payouts.platform_net, Decimal::ZERO);
        assert_eq!(q.payouts.driver_base, Decimal::ZERO);
        assert_eq!(q.customer_total, dec("12.50"));
    }

    #[test]
    fn non_positive_subtotal_is_rejected() {
        let err = quote(dec("0.00"), dec("1.00"), dec("1.00")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn negative_fee_is_rejected() {
        let err = quote(dec("10.00"), dec("-0.01"), dec("1.00")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn sub_cent_precision_is_rejected() {
        let err = quote(dec("10.001"), dec("1.00"), dec("1.00")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
