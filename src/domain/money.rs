//! Bounds of the fixed-point money columns.

use rust_decimal::Decimal;

use crate::config::MONEY_SCALE;
use crate::errors::{AppError, AppResult};

/// Reject `value` unless it is non-negative and fits `numeric(max_digits, 2)`.
pub fn ensure_money(field: &str, value: Decimal, max_digits: u32) -> AppResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::validation(format!("{} cannot be negative", field)));
    }
    if value.normalize().scale() > MONEY_SCALE {
        return Err(AppError::validation(format!(
            "{} allows at most {} decimal places",
            field, MONEY_SCALE
        )));
    }
    let whole_digits = max_digits - MONEY_SCALE;
    if value.trunc() >= Decimal::from(10i64.pow(whole_digits)) {
        return Err(AppError::validation(format!(
            "{} allows at most {} digits before the decimal point",
            field, whole_digits
        )));
    }
    Ok(())
}

/// `a + b`, rejected when the sum leaves `numeric(max_digits, 2)`
pub fn add_money(field: &str, a: Decimal, b: Decimal, max_digits: u32) -> AppResult<Decimal> {
    let sum = a
        .checked_add(b)
        .ok_or_else(|| AppError::validation(format!("{} is too large", field)))?;
    ensure_money(field, sum, max_digits)?;
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AMOUNT_MAX_DIGITS, PRICE_MAX_DIGITS};
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_column_bounds() {
        assert!(ensure_money("Price", dec!(0), PRICE_MAX_DIGITS).is_ok());
        assert!(ensure_money("Price", dec!(99999999.99), PRICE_MAX_DIGITS).is_ok());
        assert!(ensure_money("Price", dec!(5.500000), PRICE_MAX_DIGITS).is_ok());

        assert!(matches!(
            ensure_money("Price", dec!(100000000.00), PRICE_MAX_DIGITS),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ensure_money("Price", dec!(45.005), PRICE_MAX_DIGITS),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ensure_money("Price", dec!(-0.01), PRICE_MAX_DIGITS),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_add_money_stops_at_column_limit() {
        let sum = add_money("Total", dec!(9999999999.00), dec!(0.99), AMOUNT_MAX_DIGITS).unwrap();
        assert_eq!(sum, dec!(9999999999.99));

        let result = add_money("Total", dec!(9999999999.99), dec!(0.01), AMOUNT_MAX_DIGITS);
        assert!(matches!(result, Err(AppError::Validation(msg)) if msg.contains("Total")));
        assert!(add_money("Total", Decimal::MAX, Decimal::MAX, AMOUNT_MAX_DIGITS).is_err());
    }
}
