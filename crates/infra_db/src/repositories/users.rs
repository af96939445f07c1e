//! User repository
//!
//! PostgreSQL adapter for the user domain. Implements `UserPort`, so the API
//! can run against this or the in-memory mock interchangeably. Assigned
//! claims are kept in a `UUID[]` column next to the `current_load` counter;
//! both are updated in the same statement so the counter can never drift from
//! the array.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use core_kernel::{ClaimId, DomainPort, OperationMetadata, PortError, UserId};
use domain_users::{CreateUserRequest, RoleGrant, UpdateUserRequest, User, UserPort, UserQuery, UserRole};

use crate::error::DatabaseError;

const USER_COLUMNS: &str = "user_id, name, email, phone, vehicle_number, avatar_url, \
     role, is_admin, is_agent, is_traffic, is_verified, assigned_claims, \
     current_load, created_at, updated_at";

/// Repository for user accounts and role administration
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, user_id: Uuid) -> Result<UserRow, DatabaseError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?
            .ok_or_else(|| DatabaseError::not_found("User", user_id))
    }
}

/// Database row for user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub vehicle_number: Option<String>,
    pub avatar_url: Option<String>,
    pub role: String,
    pub is_admin: bool,
    pub is_agent: bool,
    pub is_traffic: bool,
    pub is_verified: bool,
    pub assigned_claims: Vec<Uuid>,
    pub current_load: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Maps the row onto the domain aggregate
    pub fn into_user(self) -> Result<User, DatabaseError> {
        let role: UserRole = self
            .role
            .parse()
            .map_err(DatabaseError::row_mapping)?;
        Ok(User {
            id: UserId::from_uuid(self.user_id),
            name: self.name,
            email: self.email,
            phone: self.phone,
            vehicle_number: self.vehicle_number,
            avatar_url: self.avatar_url,
            role,
            is_admin: self.is_admin,
            is_agent: self.is_agent,
            is_traffic: self.is_traffic,
            is_verified: self.is_verified,
            assigned_claims: self
                .assigned_claims
                .into_iter()
                .map(ClaimId::from_uuid)
                .collect(),
            current_load: self.current_load.max(0) as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn rows_to_users(rows: Vec<UserRow>) -> Result<Vec<User>, DatabaseError> {
    rows.into_iter().map(UserRow::into_user).collect()
}

impl DomainPort for UserRepository {}

#[async_trait]
impl UserPort for UserRepository {
    async fn get_user(
        &self,
        id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<User, PortError> {
        let row = self.fetch(*id.as_uuid()).await.map_err(PortError::from)?;
        row.into_user().map_err(PortError::from)
    }

    async fn get_users(
        &self,
        ids: Vec<UserId>,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<User>, PortError> {
        let uuids: Vec<Uuid> = ids.into_iter().map(Uuid::from).collect();
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ANY($1)");
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .bind(&uuids)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
            .map_err(PortError::from)?;
        rows_to_users(rows).map_err(PortError::from)
    }

    async fn find_users(
        &self,
        query: UserQuery,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<User>, PortError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1=1"));

        if let Some(email) = &query.email {
            builder.push(" AND email = ").push_bind(email.clone());
        }
        if let Some(vehicle) = &query.vehicle_number {
            builder
                .push(" AND vehicle_number = ")
                .push_bind(vehicle.clone());
        }
        if let Some(role) = query.role {
            // Effective role: primary role or the matching capability flag
            match role {
                UserRole::Driver => {
                    builder.push(" AND role = 'driver'");
                }
                UserRole::Agent => {
                    builder.push(" AND (role = 'agent' OR is_agent)");
                }
                UserRole::Traffic => {
                    builder.push(" AND (role = 'traffic' OR is_traffic)");
                }
                UserRole::Admin => {
                    builder.push(" AND (role = 'admin' OR is_admin)");
                }
            }
        }

        builder.push(" ORDER BY created_at ASC");
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            builder.push(" OFFSET ").push_bind(offset as i64);
        }

        let rows: Vec<UserRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
            .map_err(PortError::from)?;
        rows_to_users(rows).map_err(PortError::from)
    }

    async fn create_user(
        &self,
        request: CreateUserRequest,
        _metadata: Option<OperationMetadata>,
    ) -> Result<User, PortError> {
        let user_id = Uuid::now_v7();
        let now = Utc::now();
        let email = request.email.to_lowercase();

        let query = format!(
            "INSERT INTO users ( \
                 user_id, name, email, phone, vehicle_number, avatar_url, \
                 role, is_admin, is_agent, is_traffic, is_verified, \
                 assigned_claims, current_load, created_at, updated_at \
             ) VALUES ($1, $2, $3, $4, $5, $6, 'driver', false, false, false, false, \
                 '{{}}', 0, $7, $7) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(user_id)
            .bind(&request.name)
            .bind(&email)
            .bind(&request.phone)
            .bind(&request.vehicle_number)
            .bind(&request.avatar_url)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
            .map_err(PortError::from)?;

        row.into_user().map_err(PortError::from)
    }

    async fn update_user(
        &self,
        id: UserId,
        request: UpdateUserRequest,
        _metadata: Option<OperationMetadata>,
    ) -> Result<User, PortError> {
        let query = format!(
            "UPDATE users SET \
                 name = COALESCE($2, name), \
                 phone = COALESCE($3, phone), \
                 vehicle_number = COALESCE($4, vehicle_number), \
                 avatar_url = COALESCE($5, avatar_url), \
                 is_verified = COALESCE($6, is_verified), \
                 updated_at = $7 \
             WHERE user_id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(*id.as_uuid())
            .bind(&request.name)
            .bind(&request.phone)
            .bind(&request.vehicle_number)
            .bind(&request.avatar_url)
            .bind(request.is_verified)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
            .map_err(PortError::from)?
            .ok_or_else(|| PortError::not_found("User", id))?;

        row.into_user().map_err(PortError::from)
    }

    async fn set_role(
        &self,
        id: UserId,
        grant: RoleGrant,
        _metadata: Option<OperationMetadata>,
    ) -> Result<User, PortError> {
        let query = format!(
            "UPDATE users SET \
                 role = COALESCE($2, role), \
                 is_admin = COALESCE($3, is_admin), \
                 is_agent = COALESCE($4, is_agent), \
                 is_traffic = COALESCE($5, is_traffic), \
                 updated_at = $6 \
             WHERE user_id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(*id.as_uuid())
            .bind(grant.role.map(|r| r.as_str()))
            .bind(grant.is_admin)
            .bind(grant.is_agent)
            .bind(grant.is_traffic)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
            .map_err(PortError::from)?
            .ok_or_else(|| PortError::not_found("User", id))?;

        row.into_user().map_err(PortError::from)
    }

    async fn least_loaded_agent(
        &self,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Option<User>, PortError> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE role = 'agent' OR is_agent \
             ORDER BY current_load ASC, created_at ASC \
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
            .map_err(PortError::from)?;

        row.map(UserRow::into_user)
            .transpose()
            .map_err(PortError::from)
    }

    async fn set_assignment(
        &self,
        id: UserId,
        claim_id: ClaimId,
        assigned: bool,
        _metadata: Option<OperationMetadata>,
    ) -> Result<User, PortError> {
        // Array and counter move together; the WHERE guard makes the update
        // idempotent for repeated assign/release of the same claim.
        let query = if assigned {
            format!(
                "UPDATE users SET \
                     assigned_claims = array_append(assigned_claims, $2), \
                     current_load = current_load + 1, \
                     updated_at = $3 \
                 WHERE user_id = $1 AND NOT ($2 = ANY(assigned_claims)) \
                 RETURNING {USER_COLUMNS}"
            )
        } else {
            format!(
                "UPDATE users SET \
                     assigned_claims = array_remove(assigned_claims, $2), \
                     current_load = GREATEST(current_load - 1, 0), \
                     updated_at = $3 \
                 WHERE user_id = $1 AND $2 = ANY(assigned_claims) \
                 RETURNING {USER_COLUMNS}"
            )
        };

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(*id.as_uuid())
            .bind(Uuid::from(claim_id))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
            .map_err(PortError::from)?;

        match row {
            Some(row) => row.into_user().map_err(PortError::from),
            // Guard did not match: the assignment was already in the desired
            // state, return the current row
            None => self.get_user(id, None).await,
        }
    }

    async fn exists(
        &self,
        id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<bool, PortError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)")
                .bind(*id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(DatabaseError::from_sqlx)
                .map_err(PortError::from)?;
        Ok(exists.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_mapping_rejects_unknown_role() {
        let row = UserRow {
            user_id: Uuid::new_v4(),
            name: "A".to_string(),
            email: "a@example.com".to_string(),
            phone: None,
            vehicle_number: None,
            avatar_url: None,
            role: "superuser".to_string(),
            is_admin: false,
            is_agent: false,
            is_traffic: false,
            is_verified: false,
            assigned_claims: vec![],
            current_load: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(row.into_user().is_err());
    }

    #[test]
    fn test_row_mapping_clamps_negative_load() {
        let row = UserRow {
            user_id: Uuid::new_v4(),
            name: "A".to_string(),
            email: "a@example.com".to_string(),
            phone: None,
            vehicle_number: None,
            avatar_url: None,
            role: "agent".to_string(),
            is_admin: false,
            is_agent: true,
            is_traffic: false,
            is_verified: true,
            assigned_claims: vec![],
            current_load: -3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(row.into_user().unwrap().current_load, 0);
    }
}
