//! Damage severity prediction port

use async_trait::async_trait;
use rust_decimal_macros::dec;

use core_kernel::{DomainPort, PortError};

use crate::report::{DamagePrediction, DamageSeverity};

/// Port for the damage scoring model
///
/// The production adapter calls the ML scoring service over HTTP
/// ([`crate::adapters::HttpDamagePredictor`]); deployments without the
/// service fall back to [`HeuristicPredictor`].
#[async_trait]
pub trait DamagePredictor: DomainPort {
    /// Scores a damage photo
    async fn predict(&self, image: &[u8]) -> Result<DamagePrediction, PortError>;
}

/// Development stand-in for the scoring service
///
/// Buckets by payload size only, so predictions are deterministic in tests.
/// Confidence is reported as zero to make the stand-in recognizable in data.
#[derive(Debug, Default)]
pub struct HeuristicPredictor;

#[async_trait]
impl DamagePredictor for HeuristicPredictor {
    async fn predict(&self, image: &[u8]) -> Result<DamagePrediction, PortError> {
        let severity = match image.len() {
            0..=262_144 => DamageSeverity::Minor,
            262_145..=2_097_152 => DamageSeverity::Moderate,
            _ => DamageSeverity::Severe,
        };
        Ok(DamagePrediction::new(severity, dec!(0), None))
    }
}

impl DomainPort for HeuristicPredictor {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_heuristic_buckets_by_size() {
        let predictor = HeuristicPredictor;

        let small = predictor.predict(&vec![0u8; 1024]).await.unwrap();
        assert_eq!(small.severity, DamageSeverity::Minor);

        let large = predictor.predict(&vec![0u8; 3 * 1024 * 1024]).await.unwrap();
        assert_eq!(large.severity, DamageSeverity::Severe);
    }

    #[tokio::test]
    async fn test_heuristic_cost_comes_from_band() {
        let predictor = HeuristicPredictor;
        let prediction = predictor.predict(&vec![0u8; 1024]).await.unwrap();
        assert_eq!(
            prediction.estimated_repair_cost,
            DamageSeverity::Minor.average_repair_cost()
        );
    }
}
