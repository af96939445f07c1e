//! Traffic officer handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use core_kernel::ReportId;
use domain_accidents::{FirRecord, VerificationStatus};
use domain_notifications::compose;

use crate::auth::AuthUser;
use crate::dto::accidents::{ReportResponse, VerifyReportRequest};
use crate::error::ApiError;
use crate::AppState;

/// Cache prefix shared by the cached report listings
pub const CACHE_PREFIX: &str = "traffic_reports";

/// Lists all accident reports
pub async fn list_reports(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReportResponse>>, ApiError> {
    let reports = state.reports.list_for_review(None).await?;
    Ok(Json(reports.iter().map(ReportResponse::from).collect()))
}

/// Lists reports still awaiting a decision
pub async fn list_pending_reports(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReportResponse>>, ApiError> {
    let reports = state
        .reports
        .list_for_review(Some(VerificationStatus::Pending))
        .await?;
    Ok(Json(reports.iter().map(ReportResponse::from).collect()))
}

/// Fetches one report
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportResponse>, ApiError> {
    let report = state.reports.get_by_id(ReportId::from_uuid(id)).await?;
    Ok(Json(ReportResponse::from(&report)))
}

/// Records a verification decision and notifies the driver
pub async fn verify_report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<VerifyReportRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    let mut report = state.reports.get_by_id(ReportId::from_uuid(id)).await?;

    match request.status.as_str() {
        "verified" => {
            let fir = request.fir.map(|f| FirRecord {
                fir_number: f.fir_number,
                station: f.station,
                filed_at: Utc::now(),
            });
            report.verify(auth.id, fir, request.notes)?;
        }
        "rejected" => {
            report.reject(auth.id, request.notes)?;
        }
        other => {
            return Err(ApiError::BadRequest(format!(
                "unknown verification status: {other}"
            )))
        }
    }

    state.reports.save_verification(&report).await?;

    // Cached listings are stale the moment a decision lands
    if let Err(error) = state.cache.invalidate_prefix(CACHE_PREFIX).await {
        warn!(%error, "Cache invalidation failed after verification");
    }

    let driver = state.users.get_user(report.driver_id, None).await?;
    state
        .notifier
        .dispatch_all(compose::traffic_verification(&report, &driver), None)
        .await?;

    info!(
        report_id = %report.id,
        officer_id = %auth.id,
        status = report.verification.status.as_str(),
        "Report verification recorded"
    );

    Ok(Json(ReportResponse::from(&report)))
}
