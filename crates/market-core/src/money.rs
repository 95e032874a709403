//! Price rules shared by checkout, payment confirmation, and product forms.
//!
//! Prices are stored as `NUMERIC(10,2)` in major units. Two derived integers
//! are computed from a price:
//!
//! - [`order_amount`]: whole major units (`floor(price)`), the unit every
//!   order row and sales aggregate is expressed in.
//! - [`unit_amount_minor`]: minor units (`trunc(price * 100)`), the amount the
//!   payment provider actually charges.
//!
//! The two are not reconciled: `12.99` is charged as `1299`
//! cents but recorded as an order amount of `12`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::ValidationError;

/// Largest price accepted by the `NUMERIC(10,2)` column.
const MAX_PRICE: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 0);

/// Whole-unit order amount recorded for a purchase at `price`.
#[must_use]
pub fn order_amount(price: Decimal) -> i64 {
    price.floor().to_i64().unwrap_or(0)
}

/// Amount in the currency's minor unit sent to the payment provider.
#[must_use]
pub fn unit_amount_minor(price: Decimal) -> i64 {
    (price * Decimal::ONE_HUNDRED).trunc().to_i64().unwrap_or(0)
}

/// Validates a listing price: strictly positive, at most two decimal places,
/// and within the storage column's range.
///
/// # Errors
///
/// Returns a [`ValidationError`] on the `price` field describing the violation.
pub fn validate_price(price: Decimal) -> Result<Decimal, ValidationError> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::new("price", "must be greater than zero"));
    }
    if price.normalize().scale() > 2 {
        return Err(ValidationError::new(
            "price",
            "must have at most two decimal places",
        ));
    }
    if price > MAX_PRICE {
        return Err(ValidationError::new(
            "price",
            format!("must not exceed {MAX_PRICE}"),
        ));
    }
    Ok(price.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal literal")
    }

    #[test]
    fn order_amount_truncates_toward_zero() {
        assert_eq!(order_amount(dec("12.99")), 12);
        assert_eq!(order_amount(dec("12.00")), 12);
        assert_eq!(order_amount(dec("0.50")), 0);
    }

    #[test]
    fn unit_amount_minor_converts_to_cents() {
        assert_eq!(unit_amount_minor(dec("12.99")), 1299);
        assert_eq!(unit_amount_minor(dec("5")), 500);
        assert_eq!(unit_amount_minor(dec("0.01")), 1);
    }

    #[test]
    fn charged_and_recorded_amounts_diverge_for_fractional_prices() {
        let price = dec("19.95");
        assert_eq!(unit_amount_minor(price), 1995);
        assert_eq!(order_amount(price), 19);
    }

    #[test]
    fn validate_price_rejects_zero_and_negative() {
        assert!(validate_price(Decimal::ZERO).is_err());
        assert!(validate_price(dec("-1.00")).is_err());
    }

    #[test]
    fn validate_price_rejects_sub_cent_precision() {
        let err = validate_price(dec("1.005")).unwrap_err();
        assert_eq!(err.field, "price");
    }

    #[test]
    fn validate_price_accepts_trailing_zeros() {
        assert_eq!(validate_price(dec("10.500")).unwrap(), dec("10.50"));
    }

    #[test]
    fn validate_price_rejects_out_of_range() {
        assert!(validate_price(dec("100000000")).is_err());
        assert!(validate_price(dec("99999999")).is_ok());
    }
}
