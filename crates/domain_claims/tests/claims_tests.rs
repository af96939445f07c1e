//! Comprehensive tests for domain_claims

use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, UserId};
use domain_accidents::{AccidentReport, DamagePrediction, DamageSeverity, GeoLocation};
use domain_claims::claim::{Claim, ClaimStatus};
use domain_claims::error::ClaimError;
use domain_claims::settlement::{Settlement, SettlementMethod};

fn test_report(driver: UserId) -> AccidentReport {
    AccidentReport::submit(
        driver,
        "https://img.example/crash.jpg",
        GeoLocation {
            address: "NH48, Pune".to_string(),
            latitude: 18.52,
            longitude: 73.85,
        },
        DamagePrediction::new(DamageSeverity::Moderate, dec!(88.5), None),
    )
    .unwrap()
}

fn open_claim() -> Claim {
    Claim::open(&test_report(UserId::new_v7()))
}

fn claim_in_review() -> (Claim, UserId) {
    let mut claim = open_claim();
    let agent = UserId::new_v7();
    claim.assign_to(agent).unwrap();
    claim.start_review().unwrap();
    (claim, agent)
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_open_claim_carries_prediction() {
        let driver = UserId::new_v7();
        let report = test_report(driver);
        let claim = Claim::open(&report);

        assert_eq!(claim.status, ClaimStatus::Pending);
        assert_eq!(claim.driver_id, driver);
        assert_eq!(claim.report_id, report.id);
        assert_eq!(claim.severity, DamageSeverity::Moderate);
        assert_eq!(claim.estimated_cost, report.prediction.estimated_repair_cost);
        assert!(claim.claim_number.starts_with("CLM-"));
        assert!(claim.agent_id.is_none());
    }

    #[test]
    fn test_review_requires_assignment() {
        let mut claim = open_claim();
        assert!(matches!(claim.start_review(), Err(ClaimError::NoAssignedAgent)));
    }

    #[test]
    fn test_full_approval_path() {
        let (mut claim, agent) = claim_in_review();

        claim.approve(agent).unwrap();
        assert_eq!(claim.status, ClaimStatus::Approved);

        let settlement = Settlement::new(
            Money::new(dec!(4800), Currency::USD),
            SettlementMethod::BankTransfer,
            Some("NEFT/4471".to_string()),
        )
        .unwrap();
        claim.settle(settlement).unwrap();

        assert_eq!(claim.status, ClaimStatus::Settled);
        assert!(claim.settlement.is_some());
    }

    #[test]
    fn test_rejection_requires_remarks() {
        let (mut claim, agent) = claim_in_review();

        assert!(matches!(claim.reject(agent, "  "), Err(ClaimError::RemarksRequired)));

        claim.reject(agent, "Damage predates the reported accident").unwrap();
        assert_eq!(claim.status, ClaimStatus::Rejected);
        assert!(claim.remarks.is_some());
    }

    #[test]
    fn test_pending_cannot_be_approved_directly() {
        let mut claim = open_claim();
        let agent = UserId::new_v7();
        claim.assign_to(agent).unwrap();

        assert!(claim.approve(agent).is_err());
    }

    #[test]
    fn test_only_assigned_agent_can_decide() {
        let (mut claim, _agent) = claim_in_review();
        let intruder = UserId::new_v7();

        assert!(matches!(
            claim.approve(intruder),
            Err(ClaimError::NotAssignedAgent(_))
        ));
    }

    #[test]
    fn test_terminal_statuses_reject_transitions() {
        let (mut claim, agent) = claim_in_review();
        claim.reject(agent, "fraud suspected").unwrap();

        assert!(claim.assign_to(UserId::new_v7()).is_err());
        assert!(claim.start_review().is_err());

        let settlement = Settlement::new(
            Money::new(dec!(100), Currency::USD),
            SettlementMethod::Check,
            None,
        )
        .unwrap();
        assert!(claim.settle(settlement).is_err());
    }

    #[test]
    fn test_settle_requires_approval() {
        let (mut claim, _agent) = claim_in_review();
        let settlement = Settlement::new(
            Money::new(dec!(100), Currency::USD),
            SettlementMethod::Check,
            None,
        )
        .unwrap();

        assert!(matches!(
            claim.settle(settlement),
            Err(ClaimError::InvalidStatusTransition { .. })
        ));
    }
}

// ============================================================================
// Assignment Tests
// ============================================================================

mod assignment_tests {
    use super::*;

    #[test]
    fn test_assignment_records_history() {
        let mut claim = open_claim();
        let first = UserId::new_v7();
        let second = UserId::new_v7();

        let previous = claim.assign_to(first).unwrap();
        assert!(previous.is_none());

        let previous = claim.assign_to(second).unwrap();
        assert_eq!(previous, Some(first));

        assert_eq!(claim.assignment_history.len(), 2);
        assert_eq!(claim.assignment_history[0].from_agent, None);
        assert_eq!(claim.assignment_history[0].to_agent, first);
        assert_eq!(claim.assignment_history[1].from_agent, Some(first));
        assert_eq!(claim.assignment_history[1].to_agent, second);
    }

    #[test]
    fn test_reassigning_same_agent_is_noop() {
        let mut claim = open_claim();
        let agent = UserId::new_v7();

        claim.assign_to(agent).unwrap();
        claim.assign_to(agent).unwrap();

        assert_eq!(claim.assignment_history.len(), 1);
    }

    #[test]
    fn test_reassignment_allowed_in_review() {
        let (mut claim, _first) = claim_in_review();
        let second = UserId::new_v7();

        claim.assign_to(second).unwrap();
        assert_eq!(claim.agent_id, Some(second));
        assert_eq!(claim.status, ClaimStatus::InReview);
    }

    #[test]
    fn test_reassignment_blocked_after_approval() {
        let (mut claim, agent) = claim_in_review();
        claim.approve(agent).unwrap();

        assert!(claim.assign_to(UserId::new_v7()).is_err());
    }
}

// ============================================================================
// Status Machine Tests
// ============================================================================

mod status_machine_tests {
    use super::*;

    #[test]
    fn test_transition_matrix() {
        use ClaimStatus::*;
        let legal = [
            (Pending, InReview),
            (InReview, Approved),
            (InReview, Rejected),
            (Approved, Settled),
        ];

        let all = [Pending, InReview, Approved, Rejected, Settled];
        for from in all {
            for to in all {
                let mut claim = open_claim();
                claim.status = from;
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    claim.can_transition_to(to),
                    expected,
                    "transition {from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ClaimStatus::Rejected.is_terminal());
        assert!(ClaimStatus::Settled.is_terminal());
        assert!(!ClaimStatus::Pending.is_terminal());
        assert!(!ClaimStatus::InReview.is_terminal());
        assert!(!ClaimStatus::Approved.is_terminal());
    }

    #[test]
    fn test_status_serialization() {
        for (status, expected) in [
            (ClaimStatus::Pending, "\"pending\""),
            (ClaimStatus::InReview, "\"in_review\""),
            (ClaimStatus::Approved, "\"approved\""),
            (ClaimStatus::Rejected, "\"rejected\""),
            (ClaimStatus::Settled, "\"settled\""),
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), expected);
        }
    }

    #[test]
    fn test_status_parse_round_trip() {
        for status in [
            ClaimStatus::Pending,
            ClaimStatus::InReview,
            ClaimStatus::Approved,
            ClaimStatus::Rejected,
            ClaimStatus::Settled,
        ] {
            assert_eq!(status.as_str().parse::<ClaimStatus>().unwrap(), status);
        }
    }
}
