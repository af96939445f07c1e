//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the relevant fields and take defaults for the rest.

use rust_decimal_macros::dec;

use core_kernel::UserId;
use domain_accidents::{AccidentReport, DamagePrediction, DamageSeverity, GeoLocation};
use domain_claims::{Claim, ClaimStatus, Settlement, SettlementMethod};
use domain_users::{User, UserRole};

use crate::fixtures::{LocationFixtures, MoneyFixtures, StringFixtures};

/// Builder for test users
pub struct TestUserBuilder {
    name: String,
    email: String,
    role: UserRole,
    is_agent: bool,
    is_traffic: bool,
    is_admin: bool,
    vehicle_number: Option<String>,
}

impl Default for TestUserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestUserBuilder {
    /// Creates a builder for a plain driver
    pub fn new() -> Self {
        Self {
            name: StringFixtures::person_name(),
            email: StringFixtures::email(),
            role: UserRole::Driver,
            is_agent: false,
            is_traffic: false,
            is_admin: false,
            vehicle_number: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub fn as_agent(mut self) -> Self {
        self.is_agent = true;
        self
    }

    pub fn as_traffic(mut self) -> Self {
        self.is_traffic = true;
        self
    }

    pub fn as_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    pub fn with_vehicle(mut self) -> Self {
        self.vehicle_number = Some(StringFixtures::vehicle_number().to_string());
        self
    }

    /// Builds the user
    pub fn build(self) -> User {
        let mut user = User::new_driver(self.name, self.email);
        user.role = self.role;
        user.is_agent = self.is_agent;
        user.is_traffic = self.is_traffic;
        user.is_admin = self.is_admin;
        user.vehicle_number = self.vehicle_number;
        user.is_verified = true;
        user
    }
}

/// Builder for test accident reports
pub struct TestReportBuilder {
    driver_id: UserId,
    severity: DamageSeverity,
    location: GeoLocation,
    verified_by: Option<UserId>,
}

impl TestReportBuilder {
    /// Creates a builder for a pending report
    pub fn new(driver_id: UserId) -> Self {
        Self {
            driver_id,
            severity: DamageSeverity::Moderate,
            location: LocationFixtures::highway(),
            verified_by: None,
        }
    }

    pub fn with_severity(mut self, severity: DamageSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_location(mut self, location: GeoLocation) -> Self {
        self.location = location;
        self
    }

    /// Marks the report as verified by the given officer
    pub fn verified_by(mut self, officer_id: UserId) -> Self {
        self.verified_by = Some(officer_id);
        self
    }

    /// Builds the report
    pub fn build(self) -> AccidentReport {
        let mut report = AccidentReport::submit(
            self.driver_id,
            "https://img.example/crash.jpg",
            self.location,
            DamagePrediction::new(self.severity, dec!(90), None),
        )
        .expect("valid test report");

        if let Some(officer_id) = self.verified_by {
            report.verify(officer_id, None, None).expect("verify fresh report");
        }
        report
    }
}

/// Builder for test claims
///
/// `with_status` walks the real transition path to the target status, so a
/// built claim is always reachable state, never a hand-assembled one.
pub struct TestClaimBuilder {
    driver_id: UserId,
    agent_id: Option<UserId>,
    severity: DamageSeverity,
    status: ClaimStatus,
}

impl TestClaimBuilder {
    pub fn new(driver_id: UserId) -> Self {
        Self {
            driver_id,
            agent_id: None,
            severity: DamageSeverity::Moderate,
            status: ClaimStatus::Pending,
        }
    }

    pub fn assigned_to(mut self, agent_id: UserId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    pub fn with_severity(mut self, severity: DamageSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_status(mut self, status: ClaimStatus) -> Self {
        self.status = status;
        self
    }

    /// Builds the claim, driving it through the lifecycle to the target
    /// status
    pub fn build(self) -> Claim {
        let report = TestReportBuilder::new(self.driver_id)
            .with_severity(self.severity)
            .build();
        let mut claim = Claim::open(&report);

        let agent_id = self.agent_id.unwrap_or_else(UserId::new_v7);
        if self.status != ClaimStatus::Pending || self.agent_id.is_some() {
            claim.assign_to(agent_id).expect("assign open claim");
        }

        match self.status {
            ClaimStatus::Pending => {}
            ClaimStatus::InReview => {
                claim.start_review().expect("enter review");
            }
            ClaimStatus::Approved => {
                claim.start_review().expect("enter review");
                claim.approve(agent_id).expect("approve");
            }
            ClaimStatus::Rejected => {
                claim.start_review().expect("enter review");
                claim.reject(agent_id, "test rejection").expect("reject");
            }
            ClaimStatus::Settled => {
                claim.start_review().expect("enter review");
                claim.approve(agent_id).expect("approve");
                let settlement = Settlement::new(
                    MoneyFixtures::settlement(),
                    SettlementMethod::BankTransfer,
                    None,
                )
                .expect("settlement");
                claim.settle(settlement).expect("settle");
            }
        }
        claim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_builder_defaults() {
        let user = TestUserBuilder::new().build();
        assert_eq!(user.role, UserRole::Driver);
        assert!(user.is_verified);
    }

    #[test]
    fn test_claim_builder_reaches_every_status() {
        for status in [
            ClaimStatus::Pending,
            ClaimStatus::InReview,
            ClaimStatus::Approved,
            ClaimStatus::Rejected,
            ClaimStatus::Settled,
        ] {
            let claim = TestClaimBuilder::new(UserId::new_v7()).with_status(status).build();
            assert_eq!(claim.status, status);
        }
    }

    #[test]
    fn test_report_builder_verified() {
        let officer = UserId::new_v7();
        let report = TestReportBuilder::new(UserId::new_v7()).verified_by(officer).build();
        assert!(!report.is_pending_verification());
        assert_eq!(report.verification.verified_by, Some(officer));
    }
}
