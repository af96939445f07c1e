//! Accident report aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money, ReportId, UserId};

use crate::error::ReportError;

/// Predicted damage severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSeverity {
    Minor,
    Moderate,
    Severe,
}

impl DamageSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DamageSeverity::Minor => "minor",
            DamageSeverity::Moderate => "moderate",
            DamageSeverity::Severe => "severe",
        }
    }

    /// Repair-cost band for this severity class, in USD
    ///
    /// Bands match the scoring model's published cost mapping.
    pub fn repair_cost_band(&self) -> (Money, Money) {
        let (min, max) = match self {
            DamageSeverity::Minor => (dec!(500), dec!(2000)),
            DamageSeverity::Moderate => (dec!(2000), dec!(8000)),
            DamageSeverity::Severe => (dec!(8000), dec!(25000)),
        };
        (
            Money::new(min, Currency::USD),
            Money::new(max, Currency::USD),
        )
    }

    /// Midpoint repair estimate used when the scorer gives no cost
    pub fn average_repair_cost(&self) -> Money {
        let avg = match self {
            DamageSeverity::Minor => dec!(1250),
            DamageSeverity::Moderate => dec!(5000),
            DamageSeverity::Severe => dec!(16500),
        };
        Money::new(avg, Currency::USD)
    }
}

impl std::str::FromStr for DamageSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minor" => Ok(DamageSeverity::Minor),
            "moderate" => Ok(DamageSeverity::Moderate),
            "severe" => Ok(DamageSeverity::Severe),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Where the accident happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    /// Validates coordinate ranges
    pub fn validate(&self) -> Result<(), ReportError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ReportError::InvalidLocation(format!(
                "latitude out of range: {}",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ReportError::InvalidLocation(format!(
                "longitude out of range: {}",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// Output of the damage scoring model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamagePrediction {
    pub severity: DamageSeverity,
    /// Model confidence in percent (0-100)
    pub confidence: Decimal,
    pub estimated_repair_cost: Money,
}

impl DamagePrediction {
    /// Builds a prediction, falling back to the severity band average when
    /// the scorer returned no cost estimate.
    pub fn new(
        severity: DamageSeverity,
        confidence: Decimal,
        estimated_repair_cost: Option<Money>,
    ) -> Self {
        Self {
            severity,
            confidence,
            estimated_repair_cost: estimated_repair_cost
                .unwrap_or_else(|| severity.average_repair_cost()),
        }
    }
}

/// Traffic verification outcome of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

/// First Information Report metadata filed by the verifying officer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirRecord {
    pub fir_number: String,
    pub station: String,
    pub filed_at: DateTime<Utc>,
}

/// Verification state attached to a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficVerification {
    pub status: VerificationStatus,
    pub fir: Option<FirRecord>,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Default for TrafficVerification {
    fn default() -> Self {
        Self {
            status: VerificationStatus::Pending,
            fir: None,
            verified_by: None,
            verified_at: None,
            notes: None,
        }
    }
}

/// A driver-submitted accident report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccidentReport {
    pub id: ReportId,
    pub driver_id: UserId,
    /// Where the damage photo is stored
    pub image_url: String,
    pub location: GeoLocation,
    pub prediction: DamagePrediction,
    pub verification: TrafficVerification,
    pub created_at: DateTime<Utc>,
}

impl AccidentReport {
    /// Creates a report with verification pending
    pub fn submit(
        driver_id: UserId,
        image_url: impl Into<String>,
        location: GeoLocation,
        prediction: DamagePrediction,
    ) -> Result<Self, ReportError> {
        location.validate()?;
        Ok(Self {
            id: ReportId::new_v7(),
            driver_id,
            image_url: image_url.into(),
            location,
            prediction,
            verification: TrafficVerification::default(),
            created_at: Utc::now(),
        })
    }

    /// True while the report awaits a traffic decision
    pub fn is_pending_verification(&self) -> bool {
        self.verification.status == VerificationStatus::Pending
    }

    /// Marks the report verified by a traffic officer
    ///
    /// Verification is one-shot: a decided report cannot be re-decided.
    pub fn verify(
        &mut self,
        officer_id: UserId,
        fir: Option<FirRecord>,
        notes: Option<String>,
    ) -> Result<(), ReportError> {
        self.decide(VerificationStatus::Verified, officer_id, fir, notes)
    }

    /// Marks the report rejected by a traffic officer
    pub fn reject(
        &mut self,
        officer_id: UserId,
        notes: Option<String>,
    ) -> Result<(), ReportError> {
        self.decide(VerificationStatus::Rejected, officer_id, None, notes)
    }

    fn decide(
        &mut self,
        status: VerificationStatus,
        officer_id: UserId,
        fir: Option<FirRecord>,
        notes: Option<String>,
    ) -> Result<(), ReportError> {
        if !self.is_pending_verification() {
            return Err(ReportError::AlreadyVerified(
                self.verification.status.as_str().to_string(),
            ));
        }
        self.verification = TrafficVerification {
            status,
            fir,
            verified_by: Some(officer_id),
            verified_at: Some(Utc::now()),
            notes,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_location() -> GeoLocation {
        GeoLocation {
            address: "NH48, Pune".to_string(),
            latitude: 18.52,
            longitude: 73.85,
        }
    }

    fn test_prediction() -> DamagePrediction {
        DamagePrediction::new(DamageSeverity::Moderate, dec!(91.5), None)
    }

    #[test]
    fn test_submit_starts_pending() {
        let report = AccidentReport::submit(
            UserId::new_v7(),
            "https://img.example/crash.jpg",
            test_location(),
            test_prediction(),
        )
        .unwrap();

        assert!(report.is_pending_verification());
        assert!(report.verification.fir.is_none());
    }

    #[test]
    fn test_submit_rejects_bad_coordinates() {
        let mut location = test_location();
        location.latitude = 123.0;

        let result = AccidentReport::submit(
            UserId::new_v7(),
            "https://img.example/crash.jpg",
            location,
            test_prediction(),
        );
        assert!(matches!(result, Err(ReportError::InvalidLocation(_))));
    }

    #[test]
    fn test_verify_records_officer_and_fir() {
        let mut report = AccidentReport::submit(
            UserId::new_v7(),
            "https://img.example/crash.jpg",
            test_location(),
            test_prediction(),
        )
        .unwrap();

        let officer = UserId::new_v7();
        let fir = FirRecord {
            fir_number: "FIR/2025/0042".to_string(),
            station: "Shivajinagar".to_string(),
            filed_at: Utc::now(),
        };

        report.verify(officer, Some(fir.clone()), Some("matches CCTV".to_string())).unwrap();

        assert_eq!(report.verification.status, VerificationStatus::Verified);
        assert_eq!(report.verification.verified_by, Some(officer));
        assert_eq!(report.verification.fir, Some(fir));
    }

    #[test]
    fn test_verification_is_one_shot() {
        let mut report = AccidentReport::submit(
            UserId::new_v7(),
            "https://img.example/crash.jpg",
            test_location(),
            test_prediction(),
        )
        .unwrap();

        let officer = UserId::new_v7();
        report.reject(officer, None).unwrap();

        assert!(matches!(
            report.verify(officer, None, None),
            Err(ReportError::AlreadyVerified(_))
        ));
    }

    #[test]
    fn test_repair_cost_bands_are_ordered() {
        for severity in [DamageSeverity::Minor, DamageSeverity::Moderate, DamageSeverity::Severe] {
            let (min, max) = severity.repair_cost_band();
            assert!(min.amount() < max.amount());
            let avg = severity.average_repair_cost();
            assert!(min.amount() <= avg.amount() && avg.amount() <= max.amount());
        }
    }

    #[test]
    fn test_prediction_falls_back_to_band_average() {
        let prediction = DamagePrediction::new(DamageSeverity::Severe, dec!(77), None);
        assert_eq!(
            prediction.estimated_repair_cost,
            DamageSeverity::Severe.average_repair_cost()
        );
    }
}
