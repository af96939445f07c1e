//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_users::User;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub vehicle_number: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdateRequest {
    /// One of `admin`, `agent`, `traffic`, `all`, or `driver` (reset)
    pub role: String,
    /// `add` (default) or `remove`
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
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
    pub current_load: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            vehicle_number: user.vehicle_number.clone(),
            avatar_url: user.avatar_url.clone(),
            role: user.role.as_str().to_string(),
            is_admin: user.is_admin,
            is_agent: user.is_agent,
            is_traffic: user.is_traffic,
            is_verified: user.is_verified,
            current_load: user.current_load,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}
