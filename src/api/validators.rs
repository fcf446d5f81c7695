//! Request field validators for money values.
//!
//! Bodies that fail these get a 400 before reaching a service. The domain
//! re-checks the same bounds.

use rust_decimal::Decimal;
use std::borrow::Cow;
use validator::ValidationError;

use crate::config::{AMOUNT_MAX_DIGITS, PRICE_MAX_DIGITS, WALLET_MONEY_MAX_DIGITS};
use crate::domain::ensure_money;

/// Per-credit price, `numeric(10,2)`
pub fn price(value: &Decimal) -> Result<(), ValidationError> {
    money("Price", value, PRICE_MAX_DIGITS)
}

/// Transaction totals and project money, `numeric(12,2)`
pub fn amount(value: &Decimal) -> Result<(), ValidationError> {
    money("Amount", value, AMOUNT_MAX_DIGITS)
}

/// Money booked against a wallet, `numeric(15,2)`
pub fn wallet_amount(value: &Decimal) -> Result<(), ValidationError> {
    money("Amount", value, WALLET_MONEY_MAX_DIGITS)
}

fn money(field: &str, value: &Decimal, max_digits: u32) -> Result<(), ValidationError> {
    ensure_money(field, *value, max_digits).map_err(|err| {
        let mut error = ValidationError::new("money");
        error.message = Some(Cow::Owned(err.to_string()));
        error
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_bounds() {
        assert!(price(&dec!(99999999.99)).is_ok());

        let err = price(&dec!(100000000)).unwrap_err();
        assert_eq!(err.code, "money");
        assert_eq!(
            err.message.as_deref(),
            Some("Price allows at most 8 digits before the decimal point")
        );
        assert!(price(&dec!(1.001)).is_err());
    }

    #[test]
    fn test_amount_bounds() {
        assert!(amount(&dec!(9999999999.99)).is_ok());
        assert!(amount(&dec!(10000000000)).is_err());
        assert!(wallet_amount(&dec!(10000000000)).is_ok());
        assert!(wallet_amount(&dec!(-1)).is_err());
    }
}
