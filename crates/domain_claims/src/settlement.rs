//! Claim settlement records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, SettlementId};

use crate::error::ClaimError;

/// How a settlement is paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMethod {
    BankTransfer,
    Check,
    UpiTransfer,
}

impl SettlementMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementMethod::BankTransfer => "bank_transfer",
            SettlementMethod::Check => "check",
            SettlementMethod::UpiTransfer => "upi_transfer",
        }
    }
}

impl std::str::FromStr for SettlementMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank_transfer" => Ok(SettlementMethod::BankTransfer),
            "check" => Ok(SettlementMethod::Check),
            "upi_transfer" => Ok(SettlementMethod::UpiTransfer),
            other => Err(format!("unknown settlement method: {other}")),
        }
    }
}

/// A recorded claim payout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub id: SettlementId,
    pub amount: Money,
    pub method: SettlementMethod,
    /// Bank / UPI / check reference, if the payment rail supplied one
    pub reference: Option<String>,
    pub settled_at: DateTime<Utc>,
}

impl Settlement {
    /// Creates a settlement record
    ///
    /// # Errors
    ///
    /// `ClaimError::InvalidSettlementAmount` when the amount is not positive
    pub fn new(
        amount: Money,
        method: SettlementMethod,
        reference: Option<String>,
    ) -> Result<Self, ClaimError> {
        if !amount.is_positive() {
            return Err(ClaimError::InvalidSettlementAmount);
        }
        Ok(Self {
            id: SettlementId::new_v7(),
            amount,
            method,
            reference,
            settled_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_settlement_requires_positive_amount() {
        let zero = Money::zero(Currency::USD);
        assert!(matches!(
            Settlement::new(zero, SettlementMethod::BankTransfer, None),
            Err(ClaimError::InvalidSettlementAmount)
        ));

        let negative = Money::new(dec!(-100), Currency::USD);
        assert!(Settlement::new(negative, SettlementMethod::Check, None).is_err());
    }

    #[test]
    fn test_settlement_records_reference() {
        let settlement = Settlement::new(
            Money::new(dec!(4500), Currency::USD),
            SettlementMethod::UpiTransfer,
            Some("UPI/9204811".to_string()),
        )
        .unwrap();
        assert_eq!(settlement.reference.as_deref(), Some("UPI/9204811"));
    }

    #[test]
    fn test_method_round_trip() {
        for method in [
            SettlementMethod::BankTransfer,
            SettlementMethod::Check,
            SettlementMethod::UpiTransfer,
        ] {
            assert_eq!(method.as_str().parse::<SettlementMethod>().unwrap(), method);
        }
    }
}
