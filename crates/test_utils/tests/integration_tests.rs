//! Integration tests for the claims platform
//!
//! These verify cross-domain workflows end to end against the in-memory
//! ports: report submission, claim filing, least-loaded assignment, review,
//! settlement, and the notification fan-out each step produces.

use std::sync::Arc;

use core_kernel::{ClaimId, UserId};
use domain_claims::{Claim, ClaimStatus, Settlement, SettlementMethod};
use domain_notifications::ports::mock::{MockNotificationPush, MockNotificationStore};
use domain_notifications::{compose, ListOptions, NotificationKind, NotificationService, NotificationStore};
use domain_users::ports::mock::MockUserPort;
use domain_users::{RoleGrant, UserPort, UserQuery, UserRole};
use test_utils::{
    assert_claim_status, assert_notified, MoneyFixtures, TestReportBuilder, TestUserBuilder,
};

struct TestPlatform {
    users: Arc<MockUserPort>,
    store: Arc<MockNotificationStore>,
    push: Arc<MockNotificationPush>,
    notifier: NotificationService,
}

impl TestPlatform {
    async fn new() -> Self {
        let users = Arc::new(MockUserPort::new());
        let store = Arc::new(MockNotificationStore::new());
        let push = Arc::new(MockNotificationPush::new());
        let notifier = NotificationService::new(store.clone(), push.clone());
        Self {
            users,
            store,
            push,
            notifier,
        }
    }

    async fn add_agent(&self, name: &str) -> domain_users::User {
        let user = TestUserBuilder::new()
            .with_name(name)
            .with_email(format!("{}@agency.example", name.to_lowercase()))
            .build();
        let created = self
            .users
            .create_user(
                domain_users::CreateUserRequest {
                    name: user.name.clone(),
                    email: user.email.clone(),
                    phone: None,
                    vehicle_number: None,
                    avatar_url: None,
                },
                None,
            )
            .await
            .unwrap();
        self.users
            .set_role(
                created.id,
                RoleGrant { is_agent: Some(true), ..Default::default() },
                None,
            )
            .await
            .unwrap()
    }

    async fn add_driver(&self, name: &str) -> domain_users::User {
        self.users
            .create_user(
                domain_users::CreateUserRequest {
                    name: name.to_string(),
                    email: format!("{}@example.com", name.to_lowercase()),
                    phone: None,
                    vehicle_number: None,
                    avatar_url: None,
                },
                None,
            )
            .await
            .unwrap()
    }
}

mod claim_workflow {
    use super::*;

    /// Full happy path: report -> claim -> assignment -> review -> approval
    /// -> settlement, with workload and notifications checked at each step
    #[tokio::test]
    async fn test_report_to_settlement() {
        let platform = TestPlatform::new().await;
        let driver = platform.add_driver("asha").await;
        let agent = platform.add_agent("Vikram").await;

        // Driver submits a report and files a claim against it
        let report = TestReportBuilder::new(driver.id).build();
        let mut claim = Claim::open(&report);
        assert_claim_status(&claim, ClaimStatus::Pending);

        // Least-loaded selection picks the only agent
        let picked = platform.users.least_loaded_agent(None).await.unwrap().unwrap();
        assert_eq!(picked.id, agent.id);
        claim.assign_to(picked.id).unwrap();
        platform
            .users
            .set_assignment(picked.id, claim.id, true, None)
            .await
            .unwrap();

        let batch = [
            compose::claim_created(&claim, &driver),
            compose::claim_assigned(&claim, &picked, &driver),
        ]
        .concat();
        assert_notified(&batch, driver.id, NotificationKind::ClaimCreated);
        assert_notified(&batch, picked.id, NotificationKind::ClaimAssigned);
        platform.notifier.dispatch_all(batch, None).await.unwrap();

        // Review and approve
        claim.start_review().unwrap();
        claim.approve(picked.id).unwrap();
        platform
            .notifier
            .dispatch_all(compose::claim_approved(&claim, &driver, &picked), None)
            .await
            .unwrap();

        // Settle, freeing the agent
        let settlement = Settlement::new(
            MoneyFixtures::settlement(),
            SettlementMethod::BankTransfer,
            Some("NEFT/4471".to_string()),
        )
        .unwrap();
        claim.settle(settlement.clone()).unwrap();
        platform
            .users
            .set_assignment(picked.id, claim.id, false, None)
            .await
            .unwrap();
        platform
            .notifier
            .dispatch_all(
                compose::claim_settled(&claim, &driver, Some(&picked), &settlement),
                None,
            )
            .await
            .unwrap();

        assert_claim_status(&claim, ClaimStatus::Settled);
        let freed = platform.users.get_user(picked.id, None).await.unwrap();
        assert_eq!(freed.current_load, 0);

        // Everything persisted and pushed
        let inbox = platform
            .store
            .list(driver.id, ListOptions::default(), None)
            .await
            .unwrap();
        assert_eq!(inbox.unread_count, 4);
        assert_eq!(platform.push.pushed().await.len(), 6);
    }

    /// Least-loaded assignment prefers the idle agent, and reassignment
    /// moves the workload across
    #[tokio::test]
    async fn test_reassignment_rebalances_load() {
        let platform = TestPlatform::new().await;
        let driver = platform.add_driver("noor").await;
        let busy = platform.add_agent("Busy").await;
        let idle = platform.add_agent("Idle").await;

        // Load up the first agent
        platform
            .users
            .set_assignment(busy.id, ClaimId::new_v7(), true, None)
            .await
            .unwrap();

        let report = TestReportBuilder::new(driver.id).build();
        let mut claim = Claim::open(&report);

        let picked = platform.users.least_loaded_agent(None).await.unwrap().unwrap();
        assert_eq!(picked.id, idle.id);
        claim.assign_to(picked.id).unwrap();
        platform
            .users
            .set_assignment(picked.id, claim.id, true, None)
            .await
            .unwrap();

        // Admin moves the claim to the other agent
        let previous = claim.assign_to(busy.id).unwrap();
        assert_eq!(previous, Some(idle.id));
        platform
            .users
            .set_assignment(busy.id, claim.id, true, None)
            .await
            .unwrap();
        platform
            .users
            .set_assignment(idle.id, claim.id, false, None)
            .await
            .unwrap();

        let batch = compose::claim_reassigned(&claim, Some(&idle), &busy, &driver);
        assert_eq!(batch.len(), 3);
        assert_notified(&batch, idle.id, NotificationKind::ClaimReassigned);
        assert_notified(&batch, busy.id, NotificationKind::ClaimAssigned);
        assert_notified(&batch, driver.id, NotificationKind::ClaimReassigned);

        let idle_after = platform.users.get_user(idle.id, None).await.unwrap();
        let busy_after = platform.users.get_user(busy.id, None).await.unwrap();
        assert_eq!(idle_after.current_load, 0);
        assert_eq!(busy_after.current_load, 2);
        assert_eq!(claim.assignment_history.len(), 2);
    }

    /// Rejection ends the lifecycle and the claim refuses further work
    #[tokio::test]
    async fn test_rejection_is_terminal() {
        let platform = TestPlatform::new().await;
        let driver = platform.add_driver("kiran").await;
        let agent = platform.add_agent("Nila").await;

        let report = TestReportBuilder::new(driver.id).build();
        let mut claim = Claim::open(&report);
        claim.assign_to(agent.id).unwrap();
        claim.start_review().unwrap();
        claim.reject(agent.id, "Damage predates the policy").unwrap();

        let batch = compose::claim_rejected(&claim, &driver, &agent, "Damage predates the policy");
        platform.notifier.dispatch_all(batch, None).await.unwrap();

        assert!(claim.start_review().is_err());
        assert!(claim.assign_to(UserId::new_v7()).is_err());

        let inbox = platform
            .store
            .list(driver.id, ListOptions::default(), None)
            .await
            .unwrap();
        assert_eq!(inbox.notifications.len(), 1);
        assert!(inbox.notifications[0].message.contains("Damage predates the policy"));
    }
}

mod broadcast_workflow {
    use super::*;

    /// Role-targeted announcements reach exactly that role
    #[tokio::test]
    async fn test_role_targeted_announcement() {
        let platform = TestPlatform::new().await;
        platform.add_driver("d1").await;
        platform.add_driver("d2").await;
        platform.add_agent("A1").await;

        let agents = platform
            .users
            .find_users(UserQuery::by_role(UserRole::Agent), None)
            .await
            .unwrap();
        let batch = compose::system_announcement(&agents, "Policy update", "New SLA from Monday");
        assert_eq!(batch.len(), 1);

        let stored = platform.notifier.dispatch_all(batch, None).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(platform.push.pushed().await.len(), 1);
    }

    /// A dead push transport must not fail a broadcast
    #[tokio::test]
    async fn test_broadcast_survives_push_outage() {
        let platform = TestPlatform::new().await;
        let driver = platform.add_driver("offline").await;
        platform.push.set_failing(true).await;

        let everyone = platform.users.find_users(UserQuery::default(), None).await.unwrap();
        let batch = compose::system_announcement(&everyone, "Maintenance", "Back at 02:00");
        let stored = platform.notifier.dispatch_all(batch, None).await.unwrap();

        assert_eq!(stored.len(), 1);
        assert!(platform.push.pushed().await.is_empty());

        // The inbox still has it for when the driver reconnects
        let count = platform.store.unread_count(driver.id, None).await.unwrap();
        assert_eq!(count, 1);
    }
}
