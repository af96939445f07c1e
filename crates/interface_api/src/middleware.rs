//! API middleware

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use tracing::{info, warn};

use infra_cache::response_key;

use crate::auth::{validate_token, AuthUser};
use crate::AppState;

/// Responses above this size are served uncached rather than buffered
const CACHE_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Authentication middleware
///
/// Validates the bearer token and attaches the caller as [`AuthUser`]
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            warn!("Missing or invalid Authorization header");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    match validate_token(token, &state.config.jwt_secret) {
        Ok(claims) => {
            let user = AuthUser::try_from(&claims).map_err(|_| StatusCode::UNAUTHORIZED)?;
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(e) => {
            warn!("Token validation failed: {:?}", e);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Requires the caller to act as an admin
pub async fn require_admin(
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    require(request, next, AuthUser::is_admin).await
}

/// Requires the caller to act as a traffic officer (admins pass)
pub async fn require_traffic(
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    require(request, next, AuthUser::is_traffic).await
}

/// Requires the caller to act as an agent (admins pass)
pub async fn require_agent(
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    require(request, next, AuthUser::is_agent).await
}

async fn require(
    request: Request<Body>,
    next: Next,
    check: fn(&AuthUser) -> bool,
) -> Result<Response, StatusCode> {
    match request.extensions().get::<AuthUser>() {
        Some(user) if check(user) => Ok(next.run(request).await),
        Some(_) => Err(StatusCode::FORBIDDEN),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Audit logging middleware
///
/// Logs all API requests for compliance and debugging
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_id = request
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        user = %user_id,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}

/// Response cache middleware for GET listings
///
/// Hits are served straight from the cache with `X-Cache: HIT`; misses run
/// the handler and store successful JSON responses under
/// `{prefix}_{request_uri}` with the configured TTL. Cache failures fall
/// through to the handler, never to the client.
pub async fn cache_middleware(
    State((state, prefix)): State<(AppState, &'static str)>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET || !state.cache.is_enabled() {
        return next.run(request).await;
    }

    let key = response_key(prefix, &request.uri().to_string());

    match state.cache.get::<serde_json::Value>(&key).await {
        Ok(Some(cached)) => {
            let mut response = Json(cached).into_response();
            response
                .headers_mut()
                .insert("X-Cache", HeaderValue::from_static("HIT"));
            return response;
        }
        Ok(None) => {}
        Err(error) => {
            warn!(%error, key, "Cache read failed, serving uncached");
            return next.run(request).await;
        }
    }

    let response = next.run(request).await;
    let (mut parts, body) = response.into_parts();

    if parts.status != StatusCode::OK {
        return Response::from_parts(parts, body);
    }

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(%error, key, "Failed to read response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Oversized listings are served but not cached
    if bytes.len() <= CACHE_BODY_LIMIT {
        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&bytes) {
            if let Err(error) = state.cache.put(&key, &json, None).await {
                warn!(%error, key, "Cache write failed");
            }
        }
    }

    parts
        .headers
        .insert("X-Cache", HeaderValue::from_static("MISS"));
    Response::from_parts(parts, Body::from(bytes))
}
