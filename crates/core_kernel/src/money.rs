//! Money types with precise decimal arithmetic
//!
//! Repair estimates and settlement amounts are represented as `Money` backed
//! by rust_decimal, so no floating-point error can creep into payouts.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use thiserror::Error;

/// Currency codes following ISO 4217
///
/// The platform operates primarily in USD (ML repair-cost bands) and INR
/// (settlements in the home market).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    INR,
    EUR,
    GBP,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::INR => "₹",
            Currency::EUR => "€",
            Currency::GBP => "£",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::INR => "INR",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "INR" => Ok(Currency::INR),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

/// A monetary amount with associated currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value, rounded to the currency's decimal places
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(currency.decimal_places()),
            currency,
        }
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(Self::new(self.amount - other.amount, self.currency))
    }
}

impl Add for Money {
    type Output = Money;

    /// Panics on currency mismatch; use `checked_add` at trust boundaries.
    fn add(self, other: Money) -> Money {
        assert_eq!(
            self.currency, other.currency,
            "currency mismatch in Money addition"
        );
        Money::new(self.amount + other.amount, self.currency)
    }
}

impl Sub for Money {
    type Output = Money;

    /// Panics on currency mismatch; use `checked_sub` at trust boundaries.
    fn sub(self, other: Money) -> Money {
        assert_eq!(
            self.currency, other.currency,
            "currency mismatch in Money subtraction"
        );
        Money::new(self.amount - other.amount, self.currency)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.currency.symbol(), self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_new_rounds_to_currency() {
        let m = Money::new(dec!(1250.005), Currency::USD);
        assert_eq!(m.amount(), dec!(1250.01));
    }

    #[test]
    fn test_money_checked_add() {
        let a = Money::new(dec!(100), Currency::USD);
        let b = Money::new(dec!(50.50), Currency::USD);
        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.amount(), dec!(150.50));
    }

    #[test]
    fn test_money_currency_mismatch() {
        let usd = Money::new(dec!(100), Currency::USD);
        let inr = Money::new(dec!(100), Currency::INR);
        assert!(matches!(
            usd.checked_add(&inr),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
    }

    #[test]
    fn test_money_sign_helpers() {
        assert!(Money::new(dec!(1), Currency::USD).is_positive());
        assert!(Money::new(dec!(-1), Currency::USD).is_negative());
        assert!(Money::zero(Currency::USD).is_zero());
        assert!(!Money::zero(Currency::USD).is_negative());
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!("INR".parse::<Currency>().unwrap(), Currency::INR);
        assert!("XYZ".parse::<Currency>().is_err());
    }
}
