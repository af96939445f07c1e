//! Custom assertion helpers for domain types

use core_kernel::UserId;
use domain_claims::{Claim, ClaimStatus};
use domain_notifications::{NewNotification, NotificationKind};

/// Asserts a claim is in the expected status
pub fn assert_claim_status(claim: &Claim, expected: ClaimStatus) {
    assert_eq!(
        claim.status, expected,
        "claim {} expected status {:?}, got {:?}",
        claim.claim_number, expected, claim.status
    );
}

/// Asserts a composed batch contains a notification of `kind` for `user`
pub fn assert_notified(batch: &[NewNotification], user: UserId, kind: NotificationKind) {
    assert!(
        batch.iter().any(|n| n.user_id == user && n.kind == kind),
        "expected a {:?} notification for {}, batch had {:?}",
        kind,
        user,
        batch
            .iter()
            .map(|n| (n.user_id, n.kind))
            .collect::<Vec<_>>()
    );
}

/// Asserts no notification in the batch targets `user`
pub fn assert_not_notified(batch: &[NewNotification], user: UserId) {
    assert!(
        batch.iter().all(|n| n.user_id != user),
        "expected no notification for {}",
        user
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{TestClaimBuilder, TestUserBuilder};
    use domain_notifications::compose;

    #[test]
    fn test_assert_notified_finds_copy() {
        let driver = TestUserBuilder::new().build();
        let claim = TestClaimBuilder::new(driver.id).build();

        let batch = compose::claim_created(&claim, &driver);
        assert_notified(&batch, driver.id, NotificationKind::ClaimCreated);
        assert_not_notified(&batch, UserId::new_v7());
    }
}
