//! Authentication and authorization

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::UserId;
use domain_users::User;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's effective roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
}

/// The authenticated caller, attached to the request by the auth middleware
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role || r == "admin")
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == "admin")
    }

    pub fn is_agent(&self) -> bool {
        self.has_role("agent")
    }

    pub fn is_traffic(&self) -> bool {
        self.has_role("traffic")
    }
}

impl TryFrom<&Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let id: UserId = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            id,
            roles: claims.roles.clone(),
        })
    }
}

/// Creates a new JWT token for a user
pub fn create_token(
    user: &User,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    mint_token(
        &user.id.as_uuid().to_string(),
        user.effective_roles(),
        secret,
        expiration_secs,
    )
}

/// Mints a token for an arbitrary subject and role set
pub fn mint_token(
    user_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        if matches!(
            e.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ) {
            AuthError::TokenExpired
        } else {
            AuthError::InvalidToken
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let user = User::new_driver("Asha", "asha@example.com");
        let token = create_token(&user, SECRET, 3600).unwrap();

        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user.id.as_uuid().to_string());
        assert_eq!(claims.roles, vec!["driver".to_string()]);
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let user = User::new_driver("Asha", "asha@example.com");
        let token = create_token(&user, SECRET, 3600).unwrap();
        assert!(validate_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_auth_user_role_checks() {
        let agent = AuthUser {
            id: UserId::new_v7(),
            roles: vec!["driver".to_string(), "agent".to_string()],
        };
        assert!(agent.is_agent());
        assert!(!agent.is_admin());
        assert!(!agent.is_traffic());

        // Admin passes every role gate
        let admin = AuthUser {
            id: UserId::new_v7(),
            roles: vec!["admin".to_string()],
        };
        assert!(admin.is_agent());
        assert!(admin.is_traffic());
    }

    #[test]
    fn test_auth_user_from_claims() {
        let user = User::new_driver("Asha", "asha@example.com");
        let token = create_token(&user, SECRET, 3600).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();

        let auth_user = AuthUser::try_from(&claims).unwrap();
        assert_eq!(auth_user.id, user.id);
    }
}
