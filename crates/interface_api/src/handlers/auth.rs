//! Auth handlers
//!
//! Identity federation (OAuth) lives upstream; this API issues and trusts
//! its own JWTs. Registration creates the account and hands back the first
//! token; role upgrades are admin operations.

use axum::{extract::State, Extension, Json};
use validator::Validate;

use domain_users::{validation, CreateUserRequest};

use crate::auth::{create_token, AuthUser};
use crate::dto::users::{AuthResponse, RegisterRequest, UserResponse};
use crate::error::ApiError;
use crate::AppState;

/// Registers a new driver account and issues its first token
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    validation::validate_email(&request.email)?;

    let vehicle_number = request
        .vehicle_number
        .as_deref()
        .map(validation::validate_vehicle_number)
        .transpose()?;

    let user = state
        .users
        .create_user(
            CreateUserRequest {
                name: request.name,
                email: request.email,
                phone: request.phone,
                vehicle_number,
                avatar_url: request.avatar_url,
            },
            None,
        )
        .await?;

    let token = create_token(&user, &state.config.jwt_secret, state.config.jwt_expiration_secs)
        .map_err(|_| ApiError::Internal("token minting failed".to_string()))?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

/// Returns the caller's profile
pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.get_user(auth.id, None).await?;
    Ok(Json(UserResponse::from(&user)))
}
