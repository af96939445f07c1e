//! Accident report handlers

use axum::{extract::State, Extension, Json};
use tracing::info;
use validator::Validate;

use domain_accidents::{image, AccidentReport, GeoLocation, MAX_IMAGE_BYTES};

use crate::auth::AuthUser;
use crate::dto::accidents::{ReportResponse, SubmitReportRequest};
use crate::error::ApiError;
use crate::AppState;

/// Submits an accident report
///
/// The damage photo is fetched from the given URL, screened locally, and
/// scored by the damage predictor before the report is persisted with
/// traffic verification pending.
pub async fn submit_report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<SubmitReportRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let image_bytes = fetch_image(&state, &request.image_url).await?;
    image::validate_image(&image_bytes)?;

    let prediction = state.predictor.predict(&image_bytes).await?;

    let report = AccidentReport::submit(
        auth.id,
        request.image_url,
        GeoLocation {
            address: request.address,
            latitude: request.latitude,
            longitude: request.longitude,
        },
        prediction,
    )?;

    state.reports.create(&report).await?;

    info!(
        report_id = %report.id,
        driver_id = %auth.id,
        severity = report.prediction.severity.as_str(),
        "Accident report submitted"
    );

    Ok(Json(ReportResponse::from(&report)))
}

/// Lists the caller's reports, newest first
pub async fn my_reports(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<ReportResponse>>, ApiError> {
    let reports = state.reports.list_by_driver(auth.id).await?;
    Ok(Json(reports.iter().map(ReportResponse::from).collect()))
}

/// Downloads the damage photo, bounded by the upload size cap
async fn fetch_image(state: &AppState, url: &str) -> Result<Vec<u8>, ApiError> {
    let response = state
        .http
        .get(url)
        .send()
        .await
        .map_err(|e| ApiError::BadRequest(format!("image fetch failed: {e}")))?;

    if !response.status().is_success() {
        return Err(ApiError::BadRequest(format!(
            "image fetch returned {}",
            response.status()
        )));
    }
    if let Some(length) = response.content_length() {
        if length as usize > MAX_IMAGE_BYTES {
            return Err(ApiError::Validation(format!(
                "image exceeds {MAX_IMAGE_BYTES} bytes"
            )));
        }
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("image read failed: {e}")))?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::Validation(format!(
            "image exceeds {MAX_IMAGE_BYTES} bytes"
        )));
    }
    Ok(bytes.to_vec())
}
