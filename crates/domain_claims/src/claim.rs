//! Claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, Money, ReportId, UserId};
use domain_accidents::{AccidentReport, DamageSeverity};

use crate::error::ClaimError;
use crate::settlement::Settlement;

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Filed, awaiting agent review
    Pending,
    /// Assigned agent is reviewing
    InReview,
    /// Approved for settlement
    Approved,
    /// Rejected with remarks
    Rejected,
    /// Paid out and closed
    Settled,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::InReview => "in_review",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Settled => "settled",
        }
    }

    /// True for statuses that accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Rejected | ClaimStatus::Settled)
    }
}

impl std::str::FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClaimStatus::Pending),
            "in_review" => Ok(ClaimStatus::InReview),
            "approved" => Ok(ClaimStatus::Approved),
            "rejected" => Ok(ClaimStatus::Rejected),
            "settled" => Ok(ClaimStatus::Settled),
            other => Err(format!("unknown claim status: {other}")),
        }
    }
}

/// One entry in a claim's assignment history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentChange {
    pub from_agent: Option<UserId>,
    pub to_agent: UserId,
    pub changed_at: DateTime<Utc>,
}

/// An insurance claim raised against an accident report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,
    /// Human-facing claim number
    pub claim_number: String,
    /// The accident report this claim is based on
    pub report_id: ReportId,
    /// Filing driver
    pub driver_id: UserId,
    /// Currently assigned agent
    pub agent_id: Option<UserId>,
    /// Status
    pub status: ClaimStatus,
    /// Severity carried over from the report's prediction
    pub severity: DamageSeverity,
    /// Estimated repair cost carried over from the report's prediction
    pub estimated_cost: Money,
    /// Agent remarks, required on rejection
    pub remarks: Option<String>,
    /// Settlement record once paid out
    pub settlement: Option<Settlement>,
    /// Every (re)assignment, oldest first
    pub assignment_history: Vec<AssignmentChange>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Opens a claim from a driver's accident report
    ///
    /// Severity and estimated cost are carried from the report's prediction so
    /// agents triage without re-opening the report.
    pub fn open(report: &AccidentReport) -> Self {
        let now = Utc::now();
        let id = ClaimId::new_v7();

        Self {
            id,
            claim_number: generate_claim_number(&id),
            report_id: report.id,
            driver_id: report.driver_id,
            agent_id: None,
            status: ClaimStatus::Pending,
            severity: report.prediction.severity,
            estimated_cost: report.prediction.estimated_repair_cost,
            remarks: None,
            settlement: None,
            assignment_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Assigns or reassigns the claim to an agent
    ///
    /// Allowed while the claim is open (Pending or InReview). Records the
    /// change in the assignment history.
    pub fn assign_to(&mut self, agent_id: UserId) -> Result<Option<UserId>, ClaimError> {
        if self.status.is_terminal() || self.status == ClaimStatus::Approved {
            return Err(ClaimError::InvalidStatusTransition {
                from: self.status.as_str().to_string(),
                to: "reassignment".to_string(),
            });
        }
        let previous = self.agent_id;
        if previous == Some(agent_id) {
            return Ok(previous);
        }
        self.assignment_history.push(AssignmentChange {
            from_agent: previous,
            to_agent: agent_id,
            changed_at: Utc::now(),
        });
        self.agent_id = Some(agent_id);
        self.updated_at = Utc::now();
        Ok(previous)
    }

    /// Moves the claim into review
    pub fn start_review(&mut self) -> Result<(), ClaimError> {
        if self.agent_id.is_none() {
            return Err(ClaimError::NoAssignedAgent);
        }
        self.transition(ClaimStatus::InReview)
    }

    /// Approves the claim
    pub fn approve(&mut self, agent_id: UserId) -> Result<(), ClaimError> {
        self.require_assigned(agent_id)?;
        self.transition(ClaimStatus::Approved)
    }

    /// Rejects the claim with remarks
    pub fn reject(&mut self, agent_id: UserId, remarks: impl Into<String>) -> Result<(), ClaimError> {
        let remarks = remarks.into();
        if remarks.trim().is_empty() {
            return Err(ClaimError::RemarksRequired);
        }
        self.require_assigned(agent_id)?;
        self.transition(ClaimStatus::Rejected)?;
        self.remarks = Some(remarks);
        Ok(())
    }

    /// Records the settlement and closes the claim
    pub fn settle(&mut self, settlement: Settlement) -> Result<(), ClaimError> {
        if self.status == ClaimStatus::Settled {
            return Err(ClaimError::AlreadySettled);
        }
        self.transition(ClaimStatus::Settled)?;
        self.settlement = Some(settlement);
        Ok(())
    }

    /// Checks if transition is valid
    pub fn can_transition_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self.status, target),
            (Pending, InReview) | (InReview, Approved) | (InReview, Rejected) | (Approved, Settled)
        )
    }

    fn transition(&mut self, target: ClaimStatus) -> Result<(), ClaimError> {
        if !self.can_transition_to(target) {
            return Err(ClaimError::InvalidStatusTransition {
                from: self.status.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn require_assigned(&self, agent_id: UserId) -> Result<(), ClaimError> {
        match self.agent_id {
            Some(assigned) if assigned == agent_id => Ok(()),
            Some(_) | None => Err(ClaimError::NotAssignedAgent(agent_id.to_string())),
        }
    }
}

fn generate_claim_number(id: &ClaimId) -> String {
    // Format: CLM-YYYY-NNNNNNN, last digits derived from the id so numbers
    // stay stable across retries
    let (hi, ..) = id.as_uuid().as_fields();
    format!("CLM-{}-{:07}", Utc::now().format("%Y"), hi % 10_000_000)
}
