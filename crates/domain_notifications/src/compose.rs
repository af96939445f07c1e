//! Notification composition
//!
//! One function per platform event, each returning the full recipient set
//! with the documented copy and priorities. Keeping composition pure makes
//! the fan-out trivially testable: callers hand the result to
//! [`crate::service::NotificationService::dispatch_all`].

use serde_json::json;

use core_kernel::{ClaimId, UserId};
use domain_accidents::{AccidentReport, VerificationStatus};
use domain_claims::{Claim, ClaimStatus, Settlement};
use domain_users::User;

use crate::notification::{NewNotification, NotificationKind, Priority};

fn claim_url(claim_id: ClaimId) -> String {
    format!("/claim/{}", claim_id.as_uuid())
}

fn agent_claim_url(claim_id: ClaimId) -> String {
    format!("/agent/claim/{}", claim_id.as_uuid())
}

/// Driver copy when their claim is filed
pub fn claim_created(claim: &Claim, driver: &User) -> Vec<NewNotification> {
    vec![NewNotification::to(
        driver.id,
        NotificationKind::ClaimCreated,
        "Claim Created Successfully",
        format!(
            "Your insurance claim for {} damage has been created and is pending review.",
            claim.severity.as_str()
        ),
    )
    .about_claim(claim.id)
    .about_report(claim.report_id)
    .with_metadata(json!({
        "severity": claim.severity.as_str(),
        "estimatedCost": claim.estimated_cost.amount(),
    }))
    .with_priority(Priority::High)
    .with_action_url(claim_url(claim.id))]
}

/// Both sides of a fresh assignment: the agent gets the case, the driver
/// learns who is handling it
pub fn claim_assigned(claim: &Claim, agent: &User, driver: &User) -> Vec<NewNotification> {
    vec![
        NewNotification::to(
            agent.id,
            NotificationKind::ClaimAssigned,
            "New Claim Assigned",
            format!(
                "You have been assigned a new {} severity claim from {}.",
                claim.severity.as_str(),
                driver.name
            ),
        )
        .about_claim(claim.id)
        .with_metadata(json!({
            "driverName": driver.name,
            "severity": claim.severity.as_str(),
            "estimatedCost": claim.estimated_cost.amount(),
        }))
        .with_priority(Priority::High)
        .with_action_url(agent_claim_url(claim.id)),
        NewNotification::to(
            driver.id,
            NotificationKind::AgentAssigned,
            "Agent Assigned to Your Claim",
            format!("Agent {} has been assigned to review your claim.", agent.name),
        )
        .about_claim(claim.id)
        .with_metadata(json!({ "agentName": agent.name }))
        .with_priority(Priority::Medium)
        .with_action_url(claim_url(claim.id)),
    ]
}

/// Reassignment notifies the outgoing agent (when there was one), the
/// incoming agent, and the driver
pub fn claim_reassigned(
    claim: &Claim,
    old_agent: Option<&User>,
    new_agent: &User,
    driver: &User,
) -> Vec<NewNotification> {
    let mut notifications = Vec::with_capacity(3);

    if let Some(old_agent) = old_agent {
        notifications.push(
            NewNotification::to(
                old_agent.id,
                NotificationKind::ClaimReassigned,
                "Claim Reassigned",
                format!(
                    "Claim from {} has been reassigned to {}.",
                    driver.name, new_agent.name
                ),
            )
            .about_claim(claim.id)
            .with_metadata(json!({ "newAgentName": new_agent.name }))
            .with_priority(Priority::Medium),
        );
    }

    notifications.push(
        NewNotification::to(
            new_agent.id,
            NotificationKind::ClaimAssigned,
            "Claim Reassigned to You",
            format!(
                "A {} severity claim from {} has been reassigned to you.",
                claim.severity.as_str(),
                driver.name
            ),
        )
        .about_claim(claim.id)
        .with_metadata(json!({
            "driverName": driver.name,
            "severity": claim.severity.as_str(),
            "estimatedCost": claim.estimated_cost.amount(),
        }))
        .with_priority(Priority::High)
        .with_action_url(agent_claim_url(claim.id)),
    );

    notifications.push(
        NewNotification::to(
            driver.id,
            NotificationKind::ClaimReassigned,
            "Your Claim Has Been Reassigned",
            format!("Your claim is now being handled by Agent {}.", new_agent.name),
        )
        .about_claim(claim.id)
        .with_metadata(json!({ "agentName": new_agent.name }))
        .with_priority(Priority::Medium)
        .with_action_url(claim_url(claim.id)),
    );

    notifications
}

fn status_display(status: ClaimStatus) -> String {
    status.as_str().replace('_', " ").to_uppercase()
}

fn status_message(status: ClaimStatus) -> String {
    match status {
        ClaimStatus::InReview => "Your claim is now under review".to_string(),
        ClaimStatus::Approved => "Great news! Your claim has been approved".to_string(),
        ClaimStatus::Rejected => "Your claim has been rejected".to_string(),
        ClaimStatus::Settled => "Your claim has been settled".to_string(),
        other => format!("Your claim status has changed to {}", other.as_str()),
    }
}

fn status_priority(status: ClaimStatus) -> Priority {
    match status {
        ClaimStatus::InReview => Priority::Medium,
        ClaimStatus::Approved | ClaimStatus::Rejected => Priority::High,
        ClaimStatus::Settled => Priority::Urgent,
        _ => Priority::Medium,
    }
}

/// Driver copy for any status change; on settlement the handling agent is
/// also congratulated
pub fn claim_status_changed(
    claim: &Claim,
    old_status: ClaimStatus,
    new_status: ClaimStatus,
    driver: &User,
    agent: Option<&User>,
) -> Vec<NewNotification> {
    let mut notifications = vec![NewNotification::to(
        driver.id,
        NotificationKind::ClaimStatusChanged,
        format!("Claim Status: {}", status_display(new_status)),
        status_message(new_status),
    )
    .about_claim(claim.id)
    .with_metadata(json!({
        "oldStatus": old_status.as_str(),
        "newStatus": new_status.as_str(),
        "agentName": agent.map(|a| a.name.clone()),
    }))
    .with_priority(status_priority(new_status))
    .with_action_url(claim_url(claim.id))];

    if let (Some(agent), ClaimStatus::Settled) = (agent, new_status) {
        notifications.push(
            NewNotification::to(
                agent.id,
                NotificationKind::ClaimSettled,
                "Claim Settled Successfully",
                format!("Claim from {} has been settled. Great work!", driver.name),
            )
            .about_claim(claim.id)
            .with_metadata(json!({
                "driverName": driver.name,
                "amount": claim.settlement.as_ref().map(|s| s.amount.amount()),
            }))
            .with_priority(Priority::Medium),
        );
    }

    notifications
}

/// Driver copy on approval
pub fn claim_approved(claim: &Claim, driver: &User, agent: &User) -> Vec<NewNotification> {
    vec![NewNotification::to(
        driver.id,
        NotificationKind::ClaimApproved,
        "Claim Approved!",
        format!(
            "Your claim has been approved by {}. Settlement will be processed soon.",
            agent.name
        ),
    )
    .about_claim(claim.id)
    .with_metadata(json!({
        "agentName": agent.name,
        "estimatedCost": claim.estimated_cost.amount(),
    }))
    .with_priority(Priority::High)
    .with_action_url(claim_url(claim.id))]
}

/// Driver copy on rejection, carrying the agent's remarks
pub fn claim_rejected(
    claim: &Claim,
    driver: &User,
    agent: &User,
    remarks: &str,
) -> Vec<NewNotification> {
    vec![NewNotification::to(
        driver.id,
        NotificationKind::ClaimRejected,
        "Claim Rejected",
        format!(
            "Your claim has been rejected by {}. Reason: {}",
            agent.name, remarks
        ),
    )
    .about_claim(claim.id)
    .with_metadata(json!({
        "agentName": agent.name,
        "remarks": remarks,
    }))
    .with_priority(Priority::High)
    .with_action_url(claim_url(claim.id))]
}

/// Driver copy once the payout lands; the handling agent gets a thank-you
pub fn claim_settled(
    claim: &Claim,
    driver: &User,
    agent: Option<&User>,
    settlement: &Settlement,
) -> Vec<NewNotification> {
    let mut notifications = vec![NewNotification::to(
        driver.id,
        NotificationKind::ClaimSettled,
        "Claim Settled!",
        format!(
            "Your claim has been settled. Amount: {} via {}.",
            settlement.amount,
            settlement.method.as_str().replace('_', " ")
        ),
    )
    .about_claim(claim.id)
    .with_metadata(json!({
        "amount": settlement.amount.amount(),
        "method": settlement.method.as_str(),
        "reference": settlement.reference,
    }))
    .with_priority(Priority::Urgent)
    .with_action_url(claim_url(claim.id))];

    if let Some(agent) = agent {
        notifications.push(
            NewNotification::to(
                agent.id,
                NotificationKind::ClaimSettled,
                "Claim Settled Successfully",
                format!("Claim from {} has been settled. Great work!", driver.name),
            )
            .about_claim(claim.id)
            .with_metadata(json!({
                "driverName": driver.name,
                "amount": settlement.amount.amount(),
            }))
            .with_priority(Priority::Medium),
        );
    }

    notifications
}

/// Chat ping with a 50-character preview
pub fn new_message(
    sender_id: UserId,
    receiver_id: UserId,
    claim_id: ClaimId,
    body: &str,
) -> Vec<NewNotification> {
    let preview: String = body.chars().take(50).collect();
    vec![NewNotification::to(
        receiver_id,
        NotificationKind::NewMessage,
        "New Message",
        "You have a new message regarding your claim.",
    )
    .about_claim(claim_id)
    .with_metadata(json!({
        "senderId": sender_id,
        "preview": preview,
    }))
    .with_priority(Priority::Medium)
    .with_action_url(claim_url(claim_id))]
}

/// Driver copy when traffic decides on their report
pub fn traffic_verification(report: &AccidentReport, driver: &User) -> Vec<NewNotification> {
    let status = report.verification.status;
    let message = match status {
        VerificationStatus::Verified => {
            "Your accident report has been verified by traffic authorities"
        }
        VerificationStatus::Rejected => "Your accident report verification was rejected",
        VerificationStatus::Pending => "Your accident report is pending traffic verification",
    };
    let priority = if status == VerificationStatus::Verified {
        Priority::High
    } else {
        Priority::Medium
    };

    vec![NewNotification::to(
        driver.id,
        NotificationKind::TrafficVerification,
        format!("Traffic Verification: {}", status.as_str().to_uppercase()),
        message,
    )
    .about_report(report.id)
    .with_metadata(json!({
        "status": status.as_str(),
        "location": report.location.address,
    }))
    .with_priority(priority)
    .with_action_url("/my-reports")]
}

/// Admin broadcast to an explicit recipient list
pub fn admin_broadcast(
    user_ids: &[UserId],
    title: &str,
    message: &str,
) -> Vec<NewNotification> {
    user_ids
        .iter()
        .map(|user_id| {
            NewNotification::to(*user_id, NotificationKind::AdminBroadcast, title, message)
                .with_priority(Priority::High)
        })
        .collect()
}

/// System announcement to a resolved audience (all users, or one role)
pub fn system_announcement(
    users: &[User],
    title: &str,
    message: &str,
) -> Vec<NewNotification> {
    users
        .iter()
        .map(|user| {
            NewNotification::to(
                user.id,
                NotificationKind::SystemAnnouncement,
                title,
                message,
            )
            .with_priority(Priority::Medium)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_accidents::{DamagePrediction, DamageSeverity, GeoLocation};
    use domain_claims::SettlementMethod;
    use core_kernel::{Currency, Money};
    use rust_decimal_macros::dec;

    fn driver() -> User {
        User::new_driver("Asha Rao", "asha@example.com")
    }

    fn agent(name: &str) -> User {
        let mut user = User::new_driver(name, format!("{}@example.com", name.to_lowercase()));
        user.is_agent = true;
        user
    }

    fn report_for(driver: &User) -> AccidentReport {
        AccidentReport::submit(
            driver.id,
            "https://img.example/crash.jpg",
            GeoLocation {
                address: "NH48, Pune".to_string(),
                latitude: 18.52,
                longitude: 73.85,
            },
            DamagePrediction::new(DamageSeverity::Severe, dec!(95), None),
        )
        .unwrap()
    }

    fn claim_for(driver: &User) -> Claim {
        Claim::open(&report_for(driver))
    }

    #[test]
    fn test_claim_created_targets_driver() {
        let driver = driver();
        let claim = claim_for(&driver);

        let out = claim_created(&claim, &driver);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].user_id, driver.id);
        assert_eq!(out[0].kind, NotificationKind::ClaimCreated);
        assert_eq!(out[0].priority, Priority::High);
        assert!(out[0].message.contains("severe damage"));
        assert_eq!(out[0].report_id, Some(claim.report_id));
    }

    #[test]
    fn test_claim_assigned_notifies_both_sides() {
        let driver = driver();
        let agent = agent("Vikram");
        let claim = claim_for(&driver);

        let out = claim_assigned(&claim, &agent, &driver);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].user_id, agent.id);
        assert_eq!(out[0].kind, NotificationKind::ClaimAssigned);
        assert_eq!(out[1].user_id, driver.id);
        assert_eq!(out[1].kind, NotificationKind::AgentAssigned);
        assert!(out[1].message.contains("Vikram"));
    }

    #[test]
    fn test_reassignment_without_old_agent_skips_first_copy() {
        let driver = driver();
        let new_agent = agent("Nila");
        let claim = claim_for(&driver);

        let out = claim_reassigned(&claim, None, &new_agent, &driver);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].user_id, new_agent.id);
        assert_eq!(out[1].user_id, driver.id);
    }

    #[test]
    fn test_reassignment_with_old_agent_sends_three() {
        let driver = driver();
        let old_agent = agent("Vikram");
        let new_agent = agent("Nila");
        let claim = claim_for(&driver);

        let out = claim_reassigned(&claim, Some(&old_agent), &new_agent, &driver);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].user_id, old_agent.id);
        assert_eq!(out[0].kind, NotificationKind::ClaimReassigned);
        assert!(out[0].message.contains("Nila"));
    }

    #[test]
    fn test_status_change_priorities() {
        let driver = driver();
        let claim = claim_for(&driver);

        for (status, priority) in [
            (ClaimStatus::InReview, Priority::Medium),
            (ClaimStatus::Approved, Priority::High),
            (ClaimStatus::Rejected, Priority::High),
            (ClaimStatus::Settled, Priority::Urgent),
        ] {
            let out = claim_status_changed(&claim, ClaimStatus::Pending, status, &driver, None);
            assert_eq!(out[0].priority, priority, "status {status:?}");
        }
    }

    #[test]
    fn test_status_change_title_uppercases() {
        let driver = driver();
        let claim = claim_for(&driver);

        let out =
            claim_status_changed(&claim, ClaimStatus::Pending, ClaimStatus::InReview, &driver, None);
        assert_eq!(out[0].title, "Claim Status: IN REVIEW");
    }

    #[test]
    fn test_settled_status_change_thanks_agent() {
        let driver = driver();
        let agent = agent("Vikram");
        let claim = claim_for(&driver);

        let out = claim_status_changed(
            &claim,
            ClaimStatus::Approved,
            ClaimStatus::Settled,
            &driver,
            Some(&agent),
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].user_id, agent.id);
        assert_eq!(out[1].kind, NotificationKind::ClaimSettled);
    }

    #[test]
    fn test_claim_settled_copy_includes_amount_and_method() {
        let driver = driver();
        let claim = claim_for(&driver);
        let settlement = Settlement::new(
            Money::new(dec!(12500), Currency::USD),
            SettlementMethod::BankTransfer,
            None,
        )
        .unwrap();

        let out = claim_settled(&claim, &driver, None, &settlement);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::Urgent);
        assert!(out[0].message.contains("$12500"));
        assert!(out[0].message.contains("bank transfer"));

        let handling_agent = agent("Vikram");
        let out = claim_settled(&claim, &driver, Some(&handling_agent), &settlement);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].user_id, handling_agent.id);
        assert_eq!(out[1].priority, Priority::Medium);
    }

    #[test]
    fn test_new_message_preview_truncates() {
        let body = "x".repeat(200);
        let out = new_message(UserId::new_v7(), UserId::new_v7(), ClaimId::new_v7(), &body);
        let preview = out[0].metadata["preview"].as_str().unwrap();
        assert_eq!(preview.len(), 50);
    }

    #[test]
    fn test_traffic_verification_priority_tracks_status() {
        let driver = driver();
        let mut report = report_for(&driver);
        let officer = UserId::new_v7();

        report.verify(officer, None, None).unwrap();
        let out = traffic_verification(&report, &driver);
        assert_eq!(out[0].priority, Priority::High);
        assert_eq!(out[0].title, "Traffic Verification: VERIFIED");
        assert_eq!(out[0].action_url.as_deref(), Some("/my-reports"));

        let mut rejected = report_for(&driver);
        rejected.reject(officer, None).unwrap();
        let out = traffic_verification(&rejected, &driver);
        assert_eq!(out[0].priority, Priority::Medium);
    }

    #[test]
    fn test_broadcast_fans_out_per_recipient() {
        let ids: Vec<UserId> = (0..5).map(|_| UserId::new_v7()).collect();
        let out = admin_broadcast(&ids, "Maintenance", "Downtime at midnight");
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|n| n.kind == NotificationKind::AdminBroadcast));
        assert!(out.iter().all(|n| n.priority == Priority::High));
    }
}
