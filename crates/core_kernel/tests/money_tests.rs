//! Property-based tests for Money arithmetic

use core_kernel::{Currency, Money};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn money_amount() -> impl Strategy<Value = Decimal> {
    // Keep amounts within realistic settlement magnitudes
    (-10_000_000i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #[test]
    fn addition_is_commutative(a in money_amount(), b in money_amount()) {
        let x = Money::new(a, Currency::USD);
        let y = Money::new(b, Currency::USD);
        prop_assert_eq!(
            x.checked_add(&y).unwrap(),
            y.checked_add(&x).unwrap()
        );
    }

    #[test]
    fn add_then_sub_round_trips(a in money_amount(), b in money_amount()) {
        let x = Money::new(a, Currency::INR);
        let y = Money::new(b, Currency::INR);
        let back = x.checked_add(&y).unwrap().checked_sub(&y).unwrap();
        prop_assert_eq!(back, x);
    }

    #[test]
    fn zero_is_additive_identity(a in money_amount()) {
        let x = Money::new(a, Currency::USD);
        let zero = Money::zero(Currency::USD);
        prop_assert_eq!(x.checked_add(&zero).unwrap(), x);
    }

    #[test]
    fn cross_currency_addition_always_fails(a in money_amount(), b in money_amount()) {
        let usd = Money::new(a, Currency::USD);
        let inr = Money::new(b, Currency::INR);
        prop_assert!(usd.checked_add(&inr).is_err());
    }
}
