//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for common entities across the claims platform.
//! Fixtures are consistent and predictable for unit tests; randomized data
//! comes from `generators` instead.

use chrono::{DateTime, TimeZone, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, Currency, Money, ReportId, UserId};
use domain_accidents::GeoLocation;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// A minor-damage repair estimate
    pub fn minor_repair() -> Money {
        Money::new(dec!(1250.00), Currency::USD)
    }

    /// A severe-damage repair estimate
    pub fn severe_repair() -> Money {
        Money::new(dec!(16500.00), Currency::USD)
    }

    /// A typical settlement payout
    pub fn settlement() -> Money {
        Money::new(dec!(4800.00), Currency::USD)
    }

    /// Creates a zero amount
    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// An INR amount for currency mismatch tests
    pub fn inr_100() -> Money {
        Money::new(dec!(100.00), Currency::INR)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A fixed accident timestamp (Mar 5, 2025)
    pub fn accident_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 8, 30, 0).unwrap()
    }

    /// A timestamp after review concluded
    pub fn review_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 14, 0, 0).unwrap()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    pub fn user_id() -> UserId {
        UserId::new_v7()
    }

    pub fn claim_id() -> ClaimId {
        ClaimId::new_v7()
    }

    pub fn report_id() -> ReportId {
        ReportId::new_v7()
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    /// A random realistic person name
    pub fn person_name() -> String {
        Name().fake()
    }

    /// A random safe email address
    pub fn email() -> String {
        SafeEmail().fake()
    }

    /// A well-formed vehicle registration plate
    pub fn vehicle_number() -> &'static str {
        "MH12AB1234"
    }

    /// A FIR number in the station format
    pub fn fir_number() -> &'static str {
        "FIR/2025/0042"
    }
}

/// Fixture for location test data
pub struct LocationFixtures;

impl LocationFixtures {
    /// A highway accident site
    pub fn highway() -> GeoLocation {
        GeoLocation {
            address: "NH48, Pune".to_string(),
            latitude: 18.52,
            longitude: 73.85,
        }
    }

    /// Coordinates outside the valid range
    pub fn invalid() -> GeoLocation {
        GeoLocation {
            address: "nowhere".to_string(),
            latitude: 123.0,
            longitude: 0.0,
        }
    }
}
