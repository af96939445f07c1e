//! Admin handlers: user administration, analytics, CSV export

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use core_kernel::UserId;
use domain_users::{RoleGrant, UserQuery, UserRole};

use crate::dto::users::{RoleUpdateRequest, UserResponse};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Lists users with optional role filter
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let page = query.page.unwrap_or(1).max(1);

    let mut user_query = UserQuery::default().paginate(limit, (page - 1) * limit);
    if let Some(role) = query.role.as_deref() {
        let role: UserRole = role.parse().map_err(ApiError::BadRequest)?;
        user_query.role = Some(role);
    }

    let users = state.users.find_users(user_query, None).await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// Grants or revokes a role
///
/// `role` is one of `admin`, `agent`, `traffic`, `all`, or `driver` (which
/// resets every capability flag); `action` is `add` or `remove`.
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RoleUpdateRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let value = match request.action.as_deref() {
        None | Some("add") => true,
        Some("remove") => false,
        Some(other) => {
            return Err(ApiError::BadRequest(format!("unknown action: {other}")))
        }
    };

    let grant = match request.role.as_str() {
        "admin" => RoleGrant { is_admin: Some(value), ..Default::default() },
        "agent" => RoleGrant { is_agent: Some(value), ..Default::default() },
        "traffic" => RoleGrant { is_traffic: Some(value), ..Default::default() },
        "all" => RoleGrant {
            is_admin: Some(value),
            is_agent: Some(value),
            is_traffic: Some(value),
            ..Default::default()
        },
        "driver" => RoleGrant::reset_to_driver(),
        other => return Err(ApiError::BadRequest(format!("unknown role: {other}"))),
    };

    let user = state
        .users
        .set_role(UserId::from_uuid(id), grant, None)
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Platform totals for the admin dashboard
pub async fn analytics_summary(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let claims_by_status = state.claims.count_by_status().await?;
    let reports_by_severity = state.reports.count_by_severity().await?;

    let total_claims: i64 = claims_by_status.iter().map(|(_, count)| count).sum();
    let total_reports: i64 = reports_by_severity.iter().map(|(_, count)| count).sum();

    Ok(Json(json!({
        "total_claims": total_claims,
        "total_reports": total_reports,
        "claims_by_status": claims_by_status
            .into_iter()
            .collect::<std::collections::BTreeMap<String, i64>>(),
        "reports_by_severity": reports_by_severity
            .into_iter()
            .collect::<std::collections::BTreeMap<String, i64>>(),
    })))
}

/// Exports all claims as CSV
pub async fn export_claims_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let rows = state.claims.export_rows().await?;

    let mut csv = String::from("claim_id,claim_number,driver_name,driver_email,severity,estimated_cost,status,created_at\n");
    for row in rows {
        csv.push_str(&csv_line(&[
            &row.claim_id.to_string(),
            &row.claim_number,
            &row.driver_name,
            &row.driver_email,
            &row.severity,
            &row.estimated_cost.to_string(),
            &row.status,
            &row.created_at.to_rfc3339(),
        ]));
    }

    Ok(csv_response("claims.csv", csv))
}

/// Exports all accident reports as CSV
pub async fn export_accidents_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let rows = state.reports.export_rows().await?;

    let mut csv = String::from(
        "report_id,driver_name,driver_email,vehicle_number,severity,estimated_cost,address,created_at\n",
    );
    for row in rows {
        csv.push_str(&csv_line(&[
            &row.report_id.to_string(),
            &row.driver_name,
            &row.driver_email,
            row.vehicle_number.as_deref().unwrap_or(""),
            &row.severity,
            &row.estimated_cost.to_string(),
            &row.address,
            &row.created_at.to_rfc3339(),
        ]));
    }

    Ok(csv_response("accidents.csv", csv))
}

fn csv_response(filename: &str, body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        body,
    )
        .into_response()
}

fn csv_line(fields: &[&str]) -> String {
    let mut line = fields
        .iter()
        .map(|field| csv_escape(field))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// RFC 4180 quoting: fields containing commas, quotes, or newlines are
/// wrapped and inner quotes doubled
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escape_plain_field() {
        assert_eq!(csv_escape("minor"), "minor");
    }

    #[test]
    fn test_csv_escape_comma_and_quote() {
        assert_eq!(csv_escape("NH48, Pune"), "\"NH48, Pune\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_line() {
        assert_eq!(csv_line(&["a", "b,c", "d"]), "a,\"b,c\",d\n");
    }
}
