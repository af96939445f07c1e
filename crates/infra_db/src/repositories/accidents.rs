//! Accident report repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use core_kernel::{Currency, Money, ReportId, UserId};
use domain_accidents::{
    AccidentReport, DamagePrediction, DamageSeverity, FirRecord, GeoLocation,
    TrafficVerification, VerificationStatus,
};

use crate::error::DatabaseError;

const REPORT_COLUMNS: &str = "report_id, driver_id, image_url, address, latitude, longitude, \
     severity, confidence, estimated_cost, cost_currency, \
     verification_status, fir_number, fir_station, fir_filed_at, \
     verified_by, verified_at, verification_notes, created_at";

/// Repository for accident reports and their traffic verification state
#[derive(Debug, Clone)]
pub struct AccidentRepository {
    pool: PgPool,
}

impl AccidentRepository {
    /// Creates a new AccidentRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persists a newly submitted report
    pub async fn create(&self, report: &AccidentReport) -> Result<(), DatabaseError> {
        let query = "INSERT INTO accident_reports ( \
                 report_id, driver_id, image_url, address, latitude, longitude, \
                 severity, confidence, estimated_cost, cost_currency, \
                 verification_status, created_at \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)";
        sqlx::query(query)
            .bind(Uuid::from(report.id))
            .bind(Uuid::from(report.driver_id))
            .bind(&report.image_url)
            .bind(&report.location.address)
            .bind(report.location.latitude)
            .bind(report.location.longitude)
            .bind(report.prediction.severity.as_str())
            .bind(report.prediction.confidence)
            .bind(report.prediction.estimated_repair_cost.amount())
            .bind(report.prediction.estimated_repair_cost.currency().code())
            .bind(report.verification.status.as_str())
            .bind(report.created_at)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(())
    }

    /// Retrieves a report by its identifier
    pub async fn get_by_id(&self, report_id: ReportId) -> Result<AccidentReport, DatabaseError> {
        let query = format!("SELECT {REPORT_COLUMNS} FROM accident_reports WHERE report_id = $1");
        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(Uuid::from(report_id))
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?
            .ok_or_else(|| DatabaseError::not_found("AccidentReport", report_id))?;
        row.into_report()
    }

    /// Lists a driver's reports, newest first
    pub async fn list_by_driver(
        &self,
        driver_id: UserId,
    ) -> Result<Vec<AccidentReport>, DatabaseError> {
        let query = format!(
            "SELECT {REPORT_COLUMNS} FROM accident_reports \
             WHERE driver_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ReportRow>(&query)
            .bind(Uuid::from(driver_id))
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        rows.into_iter().map(ReportRow::into_report).collect()
    }

    /// Lists reports for traffic review, optionally only those still pending
    pub async fn list_for_review(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<AccidentReport>, DatabaseError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {REPORT_COLUMNS} FROM accident_reports"));
        if let Some(status) = status {
            builder
                .push(" WHERE verification_status = ")
                .push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at DESC");

        let rows: Vec<ReportRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        rows.into_iter().map(ReportRow::into_report).collect()
    }

    /// Persists a verification decision
    pub async fn save_verification(&self, report: &AccidentReport) -> Result<(), DatabaseError> {
        let verification = &report.verification;
        let result = sqlx::query(
            "UPDATE accident_reports SET \
                 verification_status = $2, \
                 fir_number = $3, fir_station = $4, fir_filed_at = $5, \
                 verified_by = $6, verified_at = $7, verification_notes = $8 \
             WHERE report_id = $1",
        )
        .bind(Uuid::from(report.id))
        .bind(verification.status.as_str())
        .bind(verification.fir.as_ref().map(|f| f.fir_number.clone()))
        .bind(verification.fir.as_ref().map(|f| f.station.clone()))
        .bind(verification.fir.as_ref().map(|f| f.filed_at))
        .bind(verification.verified_by.map(Uuid::from))
        .bind(verification.verified_at)
        .bind(&verification.notes)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("AccidentReport", report.id));
        }
        Ok(())
    }

    /// Reports flattened for CSV export, newest first
    pub async fn export_rows(&self) -> Result<Vec<ReportExportRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ReportExportRow>(
            "SELECT r.report_id, u.name AS driver_name, u.email AS driver_email, \
                    u.vehicle_number, r.severity, r.estimated_cost, r.address, r.created_at \
             FROM accident_reports r JOIN users u ON u.user_id = r.driver_id \
             ORDER BY r.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;
        Ok(rows)
    }

    /// Severity histogram for the admin analytics summary
    pub async fn count_by_severity(&self) -> Result<Vec<(String, i64)>, DatabaseError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT severity, COUNT(*) FROM accident_reports GROUP BY severity",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;
        Ok(rows)
    }
}

/// A report row flattened for CSV export, driver details joined in
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportExportRow {
    pub report_id: Uuid,
    pub driver_name: String,
    pub driver_email: String,
    pub vehicle_number: Option<String>,
    pub severity: String,
    pub estimated_cost: Decimal,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// Database row for accident report
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRow {
    pub report_id: Uuid,
    pub driver_id: Uuid,
    pub image_url: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: String,
    pub confidence: Decimal,
    pub estimated_cost: Decimal,
    pub cost_currency: String,
    pub verification_status: String,
    pub fir_number: Option<String>,
    pub fir_station: Option<String>,
    pub fir_filed_at: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verification_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReportRow {
    /// Maps the row onto the domain aggregate
    pub fn into_report(self) -> Result<AccidentReport, DatabaseError> {
        let severity: DamageSeverity = self
            .severity
            .parse()
            .map_err(DatabaseError::row_mapping)?;
        let status: VerificationStatus = match self.verification_status.as_str() {
            "pending" => VerificationStatus::Pending,
            "verified" => VerificationStatus::Verified,
            "rejected" => VerificationStatus::Rejected,
            other => {
                return Err(DatabaseError::row_mapping(format!(
                    "unknown verification status: {other}"
                )))
            }
        };
        let currency: Currency = self
            .cost_currency
            .parse()
            .map_err(|e: core_kernel::MoneyError| DatabaseError::row_mapping(e.to_string()))?;

        let fir = match (self.fir_number, self.fir_station, self.fir_filed_at) {
            (Some(fir_number), Some(station), Some(filed_at)) => Some(FirRecord {
                fir_number,
                station,
                filed_at,
            }),
            _ => None,
        };

        Ok(AccidentReport {
            id: ReportId::from_uuid(self.report_id),
            driver_id: UserId::from_uuid(self.driver_id),
            image_url: self.image_url,
            location: GeoLocation {
                address: self.address,
                latitude: self.latitude,
                longitude: self.longitude,
            },
            prediction: DamagePrediction {
                severity,
                confidence: self.confidence,
                estimated_repair_cost: Money::new(self.estimated_cost, currency),
            },
            verification: TrafficVerification {
                status,
                fir,
                verified_by: self.verified_by.map(UserId::from_uuid),
                verified_at: self.verified_at,
                notes: self.verification_notes,
            },
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_row() -> ReportRow {
        ReportRow {
            report_id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            image_url: "https://img.example/a.jpg".to_string(),
            address: "NH48".to_string(),
            latitude: 18.5,
            longitude: 73.8,
            severity: "moderate".to_string(),
            confidence: dec!(90),
            estimated_cost: dec!(5000),
            cost_currency: "USD".to_string(),
            verification_status: "pending".to_string(),
            fir_number: None,
            fir_station: None,
            fir_filed_at: None,
            verified_by: None,
            verified_at: None,
            verification_notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_mapping_round_trips_pending_report() {
        let report = base_row().into_report().unwrap();
        assert_eq!(report.prediction.severity, DamageSeverity::Moderate);
        assert!(report.is_pending_verification());
        assert!(report.verification.fir.is_none());
    }

    #[test]
    fn test_row_mapping_requires_complete_fir() {
        let mut row = base_row();
        row.fir_number = Some("FIR/1".to_string());
        // Station and filing date missing: FIR is dropped rather than invented
        let report = row.into_report().unwrap();
        assert!(report.verification.fir.is_none());
    }

    #[test]
    fn test_row_mapping_rejects_unknown_status() {
        let mut row = base_row();
        row.verification_status = "maybe".to_string();
        assert!(row.into_report().is_err());
    }
}
