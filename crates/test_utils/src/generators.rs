//! Property-based test data generators

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{Currency, Money};
use domain_accidents::DamageSeverity;
use domain_claims::{ClaimStatus, SettlementMethod};

/// Strategy for damage severities
pub fn arb_severity() -> impl Strategy<Value = DamageSeverity> {
    prop_oneof![
        Just(DamageSeverity::Minor),
        Just(DamageSeverity::Moderate),
        Just(DamageSeverity::Severe),
    ]
}

/// Strategy for claim statuses
pub fn arb_claim_status() -> impl Strategy<Value = ClaimStatus> {
    prop_oneof![
        Just(ClaimStatus::Pending),
        Just(ClaimStatus::InReview),
        Just(ClaimStatus::Approved),
        Just(ClaimStatus::Rejected),
        Just(ClaimStatus::Settled),
    ]
}

/// Strategy for settlement methods
pub fn arb_settlement_method() -> impl Strategy<Value = SettlementMethod> {
    prop_oneof![
        Just(SettlementMethod::BankTransfer),
        Just(SettlementMethod::Check),
        Just(SettlementMethod::UpiTransfer),
    ]
}

/// Strategy for positive USD amounts within settlement magnitudes
pub fn arb_positive_usd() -> impl Strategy<Value = Money> {
    (1i64..10_000_000i64).prop_map(|cents| Money::new(Decimal::new(cents, 2), Currency::USD))
}

/// Strategy for well-formed vehicle plates
pub fn arb_vehicle_number() -> impl Strategy<Value = String> {
    ("[A-Z]{2}", 1u8..=99, "[A-Z]{2}", 1u16..=9999).prop_map(|(state, district, series, number)| {
        format!("{state}{district:02}{series}{number:04}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_users::validation::validate_vehicle_number;

    proptest! {
        #[test]
        fn generated_plates_pass_validation(plate in arb_vehicle_number()) {
            prop_assert!(validate_vehicle_number(&plate).is_ok());
        }

        #[test]
        fn generated_amounts_are_positive(amount in arb_positive_usd()) {
            prop_assert!(amount.is_positive());
        }
    }
}
