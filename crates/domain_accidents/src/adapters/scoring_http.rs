//! HTTP adapter for the ML damage-scoring service
//!
//! The scoring service is a separate deployment exposing `POST /predict`,
//! which takes the damage photo and returns a severity class, a confidence
//! percentage, and a repair-cost estimate. This adapter maps its responses
//! onto [`DamagePrediction`] and its failures onto `PortError`:
//!
//! - 4xx -> `PortError::Validation`
//! - 5xx -> `PortError::ServiceUnavailable`
//! - timeouts -> `PortError::Timeout`

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use core_kernel::{Currency, DomainPort, Money, PortError};

use crate::prediction::DamagePredictor;
use crate::report::{DamagePrediction, DamageSeverity};

/// Configuration for the scoring service adapter
#[derive(Debug, Clone)]
pub struct ScoringServiceConfig {
    /// Base URL of the scoring service (e.g. "http://localhost:5000")
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ScoringServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Calls the ML scoring service over HTTP
pub struct HttpDamagePredictor {
    config: ScoringServiceConfig,
    client: reqwest::Client,
}

impl HttpDamagePredictor {
    /// Creates the adapter with a pooled HTTP client
    pub fn new(config: ScoringServiceConfig) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PortError::connection(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn predict_url(&self) -> String {
        format!("{}/predict", self.config.base_url.trim_end_matches('/'))
    }
}

/// Wire format of the scoring service response
#[derive(Debug, Deserialize)]
struct ScoreResponse {
    prediction: ScorePrediction,
    #[serde(default)]
    repair_cost: Option<ScoreRepairCost>,
}

#[derive(Debug, Deserialize)]
struct ScorePrediction {
    severity: String,
    confidence: Decimal,
}

#[derive(Debug, Deserialize)]
struct ScoreRepairCost {
    #[serde(rename = "avg")]
    average: Decimal,
}

impl DomainPort for HttpDamagePredictor {}

#[async_trait]
impl DamagePredictor for HttpDamagePredictor {
    async fn predict(&self, image: &[u8]) -> Result<DamagePrediction, PortError> {
        let url = self.predict_url();
        debug!(url = %url, bytes = image.len(), "Scoring damage photo");

        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name("damage.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| PortError::internal(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PortError::Timeout {
                        operation: "predict_damage".to_string(),
                        duration_ms: self.config.timeout_secs * 1000,
                    }
                } else {
                    PortError::connection(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Scoring service rejected image");
            return Err(PortError::validation(format!(
                "scoring service rejected image: {body}"
            )));
        }
        if !status.is_success() {
            return Err(PortError::ServiceUnavailable(format!(
                "scoring service returned {status}"
            )));
        }

        let score: ScoreResponse = response
            .json()
            .await
            .map_err(|e| PortError::Serialization(e.to_string()))?;

        let severity: DamageSeverity = score
            .prediction
            .severity
            .parse()
            .map_err(PortError::Serialization)?;
        let cost = score
            .repair_cost
            .map(|c| Money::new(c.average, Currency::USD));

        Ok(DamagePrediction::new(
            severity,
            score.prediction.confidence,
            cost,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_url_normalizes_trailing_slash() {
        let adapter = HttpDamagePredictor::new(ScoringServiceConfig {
            base_url: "http://ml:5000/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(adapter.predict_url(), "http://ml:5000/predict");
    }

    #[test]
    fn test_score_response_parsing() {
        let json = r#"{
            "success": true,
            "prediction": {"severity": "moderate", "confidence": 91.25, "class_probabilities": {}},
            "repair_cost": {"min": 2000, "max": 8000, "avg": 5000}
        }"#;
        let parsed: ScoreResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.prediction.severity, "moderate");
        assert_eq!(parsed.repair_cost.unwrap().average, Decimal::from(5000));
    }

    #[test]
    fn test_score_response_without_cost() {
        let json = r#"{"prediction": {"severity": "severe", "confidence": 77}}"#;
        let parsed: ScoreResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.repair_cost.is_none());
    }
}
