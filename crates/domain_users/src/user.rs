//! User aggregate and role model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, UserId};

use crate::error::UserError;

/// Primary role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Vehicle owner who reports accidents and files claims
    Driver,
    /// Reviews, approves, and settles claims
    Agent,
    /// Verifies accident authenticity and files FIR metadata
    Traffic,
    /// Platform administrator
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Driver => "driver",
            UserRole::Agent => "agent",
            UserRole::Traffic => "traffic",
            UserRole::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" => Ok(UserRole::Driver),
            "agent" => Ok(UserRole::Agent),
            "traffic" => Ok(UserRole::Traffic),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A platform user
///
/// Capability flags exist alongside the primary role: access checks accept
/// either, so an operations team can grant agent duty to an existing driver
/// account without rewriting its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Registration plate, unique when present
    pub vehicle_number: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub is_admin: bool,
    pub is_agent: bool,
    pub is_traffic: bool,
    pub is_verified: bool,
    /// Claims currently assigned to this user (agents only)
    pub assigned_claims: Vec<ClaimId>,
    /// Count of actively assigned claims, kept for cheap least-loaded queries
    pub current_load: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new unverified driver account
    pub fn new_driver(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new_v7(),
            name: name.into(),
            email: email.into().to_lowercase(),
            phone: None,
            vehicle_number: None,
            avatar_url: None,
            role: UserRole::Driver,
            is_admin: false,
            is_agent: false,
            is_traffic: false,
            is_verified: false,
            assigned_claims: Vec::new(),
            current_load: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// True if this user may act as a claims agent
    pub fn acts_as_agent(&self) -> bool {
        self.role == UserRole::Agent || self.is_agent
    }

    /// True if this user may act as a traffic officer
    pub fn acts_as_traffic(&self) -> bool {
        self.role == UserRole::Traffic || self.is_traffic
    }

    /// True if this user has administrative access
    pub fn acts_as_admin(&self) -> bool {
        self.role == UserRole::Admin || self.is_admin
    }

    /// Effective role names, used to mint JWT role claims
    pub fn effective_roles(&self) -> Vec<String> {
        let mut roles = vec![self.role.as_str().to_string()];
        for (flag, name) in [
            (self.is_agent, "agent"),
            (self.is_traffic, "traffic"),
            (self.is_admin, "admin"),
        ] {
            if flag && !roles.iter().any(|r| r == name) {
                roles.push(name.to_string());
            }
        }
        roles
    }

    /// Records a claim assignment and bumps the workload counter
    pub fn record_assignment(&mut self, claim_id: ClaimId) -> Result<(), UserError> {
        if !self.acts_as_agent() {
            return Err(UserError::NotAnAgent(self.id.to_string()));
        }
        if !self.assigned_claims.contains(&claim_id) {
            self.assigned_claims.push(claim_id);
            self.current_load += 1;
            self.updated_at = Utc::now();
        }
        Ok(())
    }

    /// Releases a claim assignment and decrements the workload counter
    pub fn release_assignment(&mut self, claim_id: ClaimId) -> Result<(), UserError> {
        let before = self.assigned_claims.len();
        self.assigned_claims.retain(|c| *c != claim_id);
        if self.assigned_claims.len() != before {
            self.current_load = self
                .current_load
                .checked_sub(1)
                .ok_or(UserError::WorkloadUnderflow)?;
            self.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_driver_defaults() {
        let user = User::new_driver("Asha Rao", "Asha@Example.com");
        assert_eq!(user.role, UserRole::Driver);
        assert_eq!(user.email, "asha@example.com");
        assert!(!user.is_verified);
        assert_eq!(user.current_load, 0);
    }

    #[test]
    fn test_capability_flags_grant_access() {
        let mut user = User::new_driver("A", "a@example.com");
        assert!(!user.acts_as_agent());
        user.is_agent = true;
        assert!(user.acts_as_agent());
        assert_eq!(user.role, UserRole::Driver);
    }

    #[test]
    fn test_effective_roles_deduplicates() {
        let mut user = User::new_driver("A", "a@example.com");
        user.role = UserRole::Agent;
        user.is_agent = true;
        assert_eq!(user.effective_roles(), vec!["agent".to_string()]);
    }

    #[test]
    fn test_assignment_updates_load() {
        let mut agent = User::new_driver("B", "b@example.com");
        agent.role = UserRole::Agent;

        let claim = ClaimId::new_v7();
        agent.record_assignment(claim).unwrap();
        assert_eq!(agent.current_load, 1);

        // Idempotent for the same claim
        agent.record_assignment(claim).unwrap();
        assert_eq!(agent.current_load, 1);

        agent.release_assignment(claim).unwrap();
        assert_eq!(agent.current_load, 0);
    }

    #[test]
    fn test_driver_cannot_take_assignment() {
        let mut driver = User::new_driver("C", "c@example.com");
        assert!(driver.record_assignment(ClaimId::new_v7()).is_err());
    }
}
