//! User Domain Ports
//!
//! The `UserPort` trait defines all operations the platform needs from the
//! user store. The internal adapter lives in `infra_db`; an in-memory mock is
//! provided here for tests and for running the API without a database.

use async_trait::async_trait;

use core_kernel::{ClaimId, DomainPort, OperationMetadata, PortError, UserId};

use crate::user::{User, UserRole};

/// Query parameters for finding users
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    /// Filter by email address
    pub email: Option<String>,
    /// Filter by vehicle number
    pub vehicle_number: Option<String>,
    /// Filter by effective role (primary role or capability flag)
    pub role: Option<UserRole>,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl UserQuery {
    /// Creates a query to find by email
    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into().to_lowercase()),
            ..Default::default()
        }
    }

    /// Creates a query to find by effective role
    pub fn by_role(role: UserRole) -> Self {
        Self {
            role: Some(role),
            ..Default::default()
        }
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}

/// Request for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub vehicle_number: Option<String>,
    pub avatar_url: Option<String>,
}

/// Request for updating a user profile
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub vehicle_number: Option<String>,
    pub avatar_url: Option<String>,
    pub is_verified: Option<bool>,
}

/// Role administration request
///
/// `None` leaves the corresponding field untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleGrant {
    pub role: Option<UserRole>,
    pub is_admin: Option<bool>,
    pub is_agent: Option<bool>,
    pub is_traffic: Option<bool>,
}

impl RoleGrant {
    /// Resets a user to a plain driver, clearing all capability flags
    pub fn reset_to_driver() -> Self {
        Self {
            role: Some(UserRole::Driver),
            is_admin: Some(false),
            is_agent: Some(false),
            is_traffic: Some(false),
        }
    }
}

/// The main port trait for user domain operations
#[async_trait]
pub trait UserPort: DomainPort {
    /// Retrieves a user by ID
    async fn get_user(
        &self,
        id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<User, PortError>;

    /// Retrieves multiple users by their IDs
    ///
    /// Missing IDs are silently skipped; callers that need strict lookup use
    /// `get_user` per ID.
    async fn get_users(
        &self,
        ids: Vec<UserId>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<User>, PortError>;

    /// Finds users matching the query criteria
    async fn find_users(
        &self,
        query: UserQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<User>, PortError>;

    /// Creates a new user
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` if the email or vehicle number is taken
    async fn create_user(
        &self,
        request: CreateUserRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<User, PortError>;

    /// Updates an existing user's profile
    async fn update_user(
        &self,
        id: UserId,
        request: UpdateUserRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<User, PortError>;

    /// Applies a role grant (admin tooling)
    async fn set_role(
        &self,
        id: UserId,
        grant: RoleGrant,
        metadata: Option<OperationMetadata>,
    ) -> Result<User, PortError>;

    /// Returns the eligible agent with the lowest current workload
    ///
    /// Ties break toward the longest-standing agent account. Returns `None`
    /// when no agent exists.
    async fn least_loaded_agent(
        &self,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<User>, PortError>;

    /// Records or releases a claim assignment on an agent
    async fn set_assignment(
        &self,
        id: UserId,
        claim_id: ClaimId,
        assigned: bool,
        metadata: Option<OperationMetadata>,
    ) -> Result<User, PortError>;

    /// Checks if a user exists
    async fn exists(
        &self,
        id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<bool, PortError>;
}

/// Extension trait for UserPort with convenience methods
#[async_trait]
pub trait UserPortExt: UserPort {
    /// Finds a single user by email
    async fn find_by_email(
        &self,
        email: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<User>, PortError> {
        let users = self
            .find_users(UserQuery::by_email(email), metadata)
            .await?;
        Ok(users.into_iter().next())
    }
}

// Blanket implementation for all UserPort implementors
impl<T: UserPort> UserPortExt for T {}

/// In-memory mock implementation of UserPort for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    pub struct MockUserPort {
        users: Arc<RwLock<HashMap<UserId, User>>>,
    }

    impl MockUserPort {
        /// Creates a new mock port
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with users for testing
        pub async fn with_users(users: Vec<User>) -> Self {
            let port = Self::new();
            for user in users {
                port.users.write().await.insert(user.id, user);
            }
            port
        }
    }

    impl DomainPort for MockUserPort {}

    #[async_trait]
    impl UserPort for MockUserPort {
        async fn get_user(
            &self,
            id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<User, PortError> {
            self.users
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("User", id))
        }

        async fn get_users(
            &self,
            ids: Vec<UserId>,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<User>, PortError> {
            let users = self.users.read().await;
            Ok(ids.into_iter().filter_map(|id| users.get(&id).cloned()).collect())
        }

        async fn find_users(
            &self,
            query: UserQuery,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<User>, PortError> {
            let users = self.users.read().await;
            let mut results: Vec<_> = users
                .values()
                .filter(|u| {
                    if let Some(ref email) = query.email {
                        if &u.email != email {
                            return false;
                        }
                    }
                    if let Some(ref vehicle) = query.vehicle_number {
                        if u.vehicle_number.as_ref() != Some(vehicle) {
                            return false;
                        }
                    }
                    if let Some(role) = query.role {
                        let acts = match role {
                            UserRole::Driver => u.role == UserRole::Driver,
                            UserRole::Agent => u.acts_as_agent(),
                            UserRole::Traffic => u.acts_as_traffic(),
                            UserRole::Admin => u.acts_as_admin(),
                        };
                        if !acts {
                            return false;
                        }
                    }
                    true
                })
                .cloned()
                .collect();

            results.sort_by_key(|u| u.created_at);

            if let Some(offset) = query.offset {
                results = results.into_iter().skip(offset as usize).collect();
            }
            if let Some(limit) = query.limit {
                results.truncate(limit as usize);
            }

            Ok(results)
        }

        async fn create_user(
            &self,
            request: CreateUserRequest,
            _metadata: Option<OperationMetadata>,
        ) -> Result<User, PortError> {
            let mut users = self.users.write().await;

            let email = request.email.to_lowercase();
            if users.values().any(|u| u.email == email) {
                return Err(PortError::conflict(format!("email taken: {email}")));
            }
            if let Some(ref vehicle) = request.vehicle_number {
                if users.values().any(|u| u.vehicle_number.as_ref() == Some(vehicle)) {
                    return Err(PortError::conflict(format!("vehicle number taken: {vehicle}")));
                }
            }

            let mut user = User::new_driver(request.name, email);
            user.phone = request.phone;
            user.vehicle_number = request.vehicle_number;
            user.avatar_url = request.avatar_url;

            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn update_user(
            &self,
            id: UserId,
            request: UpdateUserRequest,
            _metadata: Option<OperationMetadata>,
        ) -> Result<User, PortError> {
            let mut users = self.users.write().await;
            let user = users
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("User", id))?;

            if let Some(name) = request.name {
                user.name = name;
            }
            if let Some(phone) = request.phone {
                user.phone = Some(phone);
            }
            if let Some(vehicle) = request.vehicle_number {
                user.vehicle_number = Some(vehicle);
            }
            if let Some(avatar) = request.avatar_url {
                user.avatar_url = Some(avatar);
            }
            if let Some(verified) = request.is_verified {
                user.is_verified = verified;
            }
            user.updated_at = Utc::now();

            Ok(user.clone())
        }

        async fn set_role(
            &self,
            id: UserId,
            grant: RoleGrant,
            _metadata: Option<OperationMetadata>,
        ) -> Result<User, PortError> {
            let mut users = self.users.write().await;
            let user = users
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("User", id))?;

            if let Some(role) = grant.role {
                user.role = role;
            }
            if let Some(flag) = grant.is_admin {
                user.is_admin = flag;
            }
            if let Some(flag) = grant.is_agent {
                user.is_agent = flag;
            }
            if let Some(flag) = grant.is_traffic {
                user.is_traffic = flag;
            }
            user.updated_at = Utc::now();

            Ok(user.clone())
        }

        async fn least_loaded_agent(
            &self,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<User>, PortError> {
            let users = self.users.read().await;
            Ok(users
                .values()
                .filter(|u| u.acts_as_agent())
                .min_by_key(|u| (u.current_load, u.created_at))
                .cloned())
        }

        async fn set_assignment(
            &self,
            id: UserId,
            claim_id: ClaimId,
            assigned: bool,
            _metadata: Option<OperationMetadata>,
        ) -> Result<User, PortError> {
            let mut users = self.users.write().await;
            let user = users
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("User", id))?;

            let result = if assigned {
                user.record_assignment(claim_id)
            } else {
                user.release_assignment(claim_id)
            };
            result.map_err(|e| PortError::validation(e.to_string()))?;

            Ok(user.clone())
        }

        async fn exists(
            &self,
            id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<bool, PortError> {
            Ok(self.users.read().await.contains_key(&id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockUserPort;
    use super::*;

    fn request(name: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            vehicle_number: None,
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_mock_port_create_and_get() {
        let port = MockUserPort::new();

        let user = port.create_user(request("Asha", "asha@example.com"), None).await.unwrap();

        let retrieved = port.get_user(user.id, None).await.unwrap();
        assert_eq!(retrieved.id, user.id);
        assert_eq!(retrieved.email, "asha@example.com");
    }

    #[tokio::test]
    async fn test_mock_port_duplicate_email() {
        let port = MockUserPort::new();
        port.create_user(request("A", "a@example.com"), None).await.unwrap();

        let result = port.create_user(request("B", "A@Example.com"), None).await;
        assert!(matches!(result, Err(PortError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_mock_port_find_by_email() {
        let port = MockUserPort::new();
        port.create_user(request("A", "a@example.com"), None).await.unwrap();

        let found = port.find_by_email("a@example.com", None).await.unwrap();
        assert!(found.is_some());

        let missing = port.find_by_email("b@example.com", None).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_least_loaded_agent_selection() {
        let port = MockUserPort::new();

        let busy = port.create_user(request("Busy", "busy@example.com"), None).await.unwrap();
        let idle = port.create_user(request("Idle", "idle@example.com"), None).await.unwrap();

        for id in [busy.id, idle.id] {
            port.set_role(id, RoleGrant { is_agent: Some(true), ..Default::default() }, None)
                .await
                .unwrap();
        }
        port.set_assignment(busy.id, ClaimId::new_v7(), true, None).await.unwrap();

        let picked = port.least_loaded_agent(None).await.unwrap().unwrap();
        assert_eq!(picked.id, idle.id);
    }

    #[tokio::test]
    async fn test_least_loaded_agent_none_without_agents() {
        let port = MockUserPort::new();
        port.create_user(request("Driver", "d@example.com"), None).await.unwrap();

        assert!(port.least_loaded_agent(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_role_reset_to_driver() {
        let port = MockUserPort::new();
        let user = port.create_user(request("A", "a@example.com"), None).await.unwrap();

        port.set_role(
            user.id,
            RoleGrant { is_admin: Some(true), is_agent: Some(true), ..Default::default() },
            None,
        )
        .await
        .unwrap();

        let reset = port.set_role(user.id, RoleGrant::reset_to_driver(), None).await.unwrap();
        assert!(!reset.is_admin && !reset.is_agent && !reset.is_traffic);
        assert_eq!(reset.role, UserRole::Driver);
    }
}
