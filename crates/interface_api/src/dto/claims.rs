//! Claims DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_claims::Claim;

#[derive(Debug, Deserialize)]
pub struct CreateClaimRequest {
    pub report_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// `in_review`, `approved`, or `rejected`
    pub status: String,
    /// Required when rejecting
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SettleClaimRequest {
    pub amount: Decimal,
    /// ISO 4217 code, e.g. `USD`
    pub currency: String,
    /// `bank_transfer`, `check`, or `upi_transfer`
    pub method: String,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignClaimRequest {
    /// Explicit agent; omitted selects the least-loaded agent
    pub agent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimListQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatMessageRequest {
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub reference: Option<String>,
    pub settled_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentChangeResponse {
    pub from_agent: Option<Uuid>,
    pub to_agent: Uuid,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: Uuid,
    pub claim_number: String,
    pub report_id: Uuid,
    pub driver_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub status: String,
    pub severity: String,
    pub estimated_cost: Decimal,
    pub currency: String,
    pub remarks: Option<String>,
    pub settlement: Option<SettlementResponse>,
    pub assignment_history: Vec<AssignmentChangeResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Claim> for ClaimResponse {
    fn from(claim: &Claim) -> Self {
        Self {
            id: *claim.id.as_uuid(),
            claim_number: claim.claim_number.clone(),
            report_id: *claim.report_id.as_uuid(),
            driver_id: *claim.driver_id.as_uuid(),
            agent_id: claim.agent_id.map(|id| *id.as_uuid()),
            status: claim.status.as_str().to_string(),
            severity: claim.severity.as_str().to_string(),
            estimated_cost: claim.estimated_cost.amount(),
            currency: claim.estimated_cost.currency().code().to_string(),
            remarks: claim.remarks.clone(),
            settlement: claim.settlement.as_ref().map(|s| SettlementResponse {
                amount: s.amount.amount(),
                currency: s.amount.currency().code().to_string(),
                method: s.method.as_str().to_string(),
                reference: s.reference.clone(),
                settled_at: s.settled_at,
            }),
            assignment_history: claim
                .assignment_history
                .iter()
                .map(|change| AssignmentChangeResponse {
                    from_agent: change.from_agent.map(|id| *id.as_uuid()),
                    to_agent: *change.to_agent.as_uuid(),
                    changed_at: change.changed_at,
                })
                .collect(),
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        }
    }
}
