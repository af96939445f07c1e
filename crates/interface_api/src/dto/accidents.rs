//! Accident report DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_accidents::AccidentReport;

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitReportRequest {
    /// Where the damage photo was uploaded
    #[validate(url)]
    pub image_url: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct VerifyReportRequest {
    /// `verified` or `rejected`
    pub status: String,
    pub fir: Option<FirRequest>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FirRequest {
    pub fir_number: String,
    pub station: String,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub severity: String,
    pub confidence: Decimal,
    pub estimated_repair_cost: Decimal,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub status: String,
    pub fir_number: Option<String>,
    pub fir_station: Option<String>,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub image_url: String,
    pub location: LocationResponse,
    pub prediction: PredictionResponse,
    pub verification: VerificationResponse,
    pub created_at: DateTime<Utc>,
}

impl From<&AccidentReport> for ReportResponse {
    fn from(report: &AccidentReport) -> Self {
        Self {
            id: *report.id.as_uuid(),
            driver_id: *report.driver_id.as_uuid(),
            image_url: report.image_url.clone(),
            location: LocationResponse {
                address: report.location.address.clone(),
                latitude: report.location.latitude,
                longitude: report.location.longitude,
            },
            prediction: PredictionResponse {
                severity: report.prediction.severity.as_str().to_string(),
                confidence: report.prediction.confidence,
                estimated_repair_cost: report.prediction.estimated_repair_cost.amount(),
                currency: report.prediction.estimated_repair_cost.currency().code().to_string(),
            },
            verification: VerificationResponse {
                status: report.verification.status.as_str().to_string(),
                fir_number: report.verification.fir.as_ref().map(|f| f.fir_number.clone()),
                fir_station: report.verification.fir.as_ref().map(|f| f.station.clone()),
                verified_by: report.verification.verified_by.map(|id| *id.as_uuid()),
                verified_at: report.verification.verified_at,
                notes: report.verification.notes.clone(),
            },
            created_at: report.created_at,
        }
    }
}
