//! Claims repository
//!
//! Database access for the claim lifecycle. Assignment history rides along
//! as JSONB on the claim row; status changes are additionally journaled into
//! `claim_status_history` for audit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use core_kernel::{ClaimId, Currency, Money, ReportId, SettlementId, UserId};
use domain_claims::{AssignmentChange, Claim, ClaimStatus, Settlement, SettlementMethod};

use crate::error::DatabaseError;

const CLAIM_COLUMNS: &str = "claim_id, claim_number, report_id, driver_id, agent_id, status, \
     severity, estimated_cost, cost_currency, remarks, \
     settlement_id, settlement_amount, settlement_currency, settlement_method, \
     settlement_reference, settled_at, assignment_history, created_at, updated_at";

/// Filter for admin claim listings
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimFilter {
    pub status: Option<ClaimStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// A claim row flattened for CSV export, driver details joined in
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimExportRow {
    pub claim_id: Uuid,
    pub claim_number: String,
    pub driver_name: String,
    pub driver_email: String,
    pub severity: String,
    pub estimated_cost: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for managing claims data
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    /// Creates a new ClaimsRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persists a newly opened claim
    pub async fn create(&self, claim: &Claim) -> Result<(), DatabaseError> {
        let history = serde_json::to_value(&claim.assignment_history)
            .map_err(|e| DatabaseError::row_mapping(e.to_string()))?;
        sqlx::query(
            "INSERT INTO claims ( \
                 claim_id, claim_number, report_id, driver_id, agent_id, status, \
                 severity, estimated_cost, cost_currency, remarks, \
                 assignment_history, created_at, updated_at \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(Uuid::from(claim.id))
        .bind(&claim.claim_number)
        .bind(Uuid::from(claim.report_id))
        .bind(Uuid::from(claim.driver_id))
        .bind(claim.agent_id.map(Uuid::from))
        .bind(claim.status.as_str())
        .bind(claim.severity.as_str())
        .bind(claim.estimated_cost.amount())
        .bind(claim.estimated_cost.currency().code())
        .bind(&claim.remarks)
        .bind(history)
        .bind(claim.created_at)
        .bind(claim.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;
        Ok(())
    }

    /// Retrieves a claim by its identifier
    pub async fn get_by_id(&self, claim_id: ClaimId) -> Result<Claim, DatabaseError> {
        let query = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE claim_id = $1");
        let row = sqlx::query_as::<_, ClaimRow>(&query)
            .bind(Uuid::from(claim_id))
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?
            .ok_or_else(|| DatabaseError::not_found("Claim", claim_id))?;
        row.into_claim()
    }

    /// Lists a driver's claims, newest first
    pub async fn list_by_driver(&self, driver_id: UserId) -> Result<Vec<Claim>, DatabaseError> {
        let query = format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE driver_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ClaimRow>(&query)
            .bind(Uuid::from(driver_id))
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        rows.into_iter().map(ClaimRow::into_claim).collect()
    }

    /// Lists an agent's assigned claims, newest first
    pub async fn list_by_agent(&self, agent_id: UserId) -> Result<Vec<Claim>, DatabaseError> {
        let query = format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE agent_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ClaimRow>(&query)
            .bind(Uuid::from(agent_id))
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        rows.into_iter().map(ClaimRow::into_claim).collect()
    }

    /// Lists claims for admin views with optional status filter and paging
    pub async fn list(&self, filter: ClaimFilter) -> Result<Vec<Claim>, DatabaseError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {CLAIM_COLUMNS} FROM claims"));
        if let Some(status) = filter.status {
            builder.push(" WHERE status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }
        if let Some(offset) = filter.offset {
            builder.push(" OFFSET ").push_bind(offset as i64);
        }

        let rows: Vec<ClaimRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        rows.into_iter().map(ClaimRow::into_claim).collect()
    }

    /// Writes back every mutable field of the aggregate
    pub async fn save(&self, claim: &Claim) -> Result<(), DatabaseError> {
        let result = self.update_query(claim).execute(&self.pool).await
            .map_err(DatabaseError::from_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Claim", claim.id));
        }
        Ok(())
    }

    /// Writes the aggregate back and journals the status change in one
    /// transaction
    pub async fn save_status_change(
        &self,
        claim: &Claim,
        reason: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from_sqlx)?;

        sqlx::query(
            "INSERT INTO claim_status_history (history_id, claim_id, status, reason, changed_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(Uuid::from(claim.id))
        .bind(claim.status.as_str())
        .bind(reason)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        let result = self.update_query(claim).execute(&mut *tx).await
            .map_err(DatabaseError::from_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Claim", claim.id));
        }

        tx.commit().await.map_err(DatabaseError::from_sqlx)?;
        Ok(())
    }

    /// Status histogram for the admin analytics summary
    pub async fn count_by_status(&self) -> Result<Vec<(String, i64)>, DatabaseError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM claims GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(DatabaseError::from_sqlx)?;
        Ok(rows)
    }

    /// Claims flattened for CSV export, newest first
    pub async fn export_rows(&self) -> Result<Vec<ClaimExportRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ClaimExportRow>(
            "SELECT c.claim_id, c.claim_number, u.name AS driver_name, \
                    u.email AS driver_email, c.severity, c.estimated_cost, \
                    c.status, c.created_at \
             FROM claims c JOIN users u ON u.user_id = c.driver_id \
             ORDER BY c.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;
        Ok(rows)
    }

    fn update_query<'a>(
        &self,
        claim: &'a Claim,
    ) -> sqlx::query::Query<'a, sqlx::Postgres, sqlx::postgres::PgArguments> {
        let history = serde_json::to_value(&claim.assignment_history)
            .unwrap_or_else(|_| serde_json::Value::Array(Vec::new()));
        sqlx::query(
            "UPDATE claims SET \
                 agent_id = $2, status = $3, remarks = $4, \
                 settlement_id = $5, settlement_amount = $6, settlement_currency = $7, \
                 settlement_method = $8, settlement_reference = $9, settled_at = $10, \
                 assignment_history = $11, updated_at = $12 \
             WHERE claim_id = $1",
        )
        .bind(Uuid::from(claim.id))
        .bind(claim.agent_id.map(Uuid::from))
        .bind(claim.status.as_str())
        .bind(claim.remarks.clone())
        .bind(claim.settlement.as_ref().map(|s| Uuid::from(s.id)))
        .bind(claim.settlement.as_ref().map(|s| s.amount.amount()))
        .bind(claim.settlement.as_ref().map(|s| s.amount.currency().code()))
        .bind(claim.settlement.as_ref().map(|s| s.method.as_str()))
        .bind(claim.settlement.as_ref().and_then(|s| s.reference.clone()))
        .bind(claim.settlement.as_ref().map(|s| s.settled_at))
        .bind(history)
        .bind(claim.updated_at)
    }
}

/// Database row for claim
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimRow {
    pub claim_id: Uuid,
    pub claim_number: String,
    pub report_id: Uuid,
    pub driver_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub status: String,
    pub severity: String,
    pub estimated_cost: Decimal,
    pub cost_currency: String,
    pub remarks: Option<String>,
    pub settlement_id: Option<Uuid>,
    pub settlement_amount: Option<Decimal>,
    pub settlement_currency: Option<String>,
    pub settlement_method: Option<String>,
    pub settlement_reference: Option<String>,
    pub settled_at: Option<DateTime<Utc>>,
    pub assignment_history: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClaimRow {
    /// Maps the row onto the domain aggregate
    pub fn into_claim(self) -> Result<Claim, DatabaseError> {
        let status: ClaimStatus = self.status.parse().map_err(DatabaseError::row_mapping)?;
        let severity = self.severity.parse().map_err(DatabaseError::row_mapping)?;
        let cost_currency: Currency = self
            .cost_currency
            .parse()
            .map_err(|e: core_kernel::MoneyError| DatabaseError::row_mapping(e.to_string()))?;

        let settlement = match (
            self.settlement_id,
            self.settlement_amount,
            self.settlement_currency,
            self.settlement_method,
            self.settled_at,
        ) {
            (Some(id), Some(amount), Some(currency), Some(method), Some(settled_at)) => {
                let currency: Currency = currency
                    .parse()
                    .map_err(|e: core_kernel::MoneyError| DatabaseError::row_mapping(e.to_string()))?;
                let method: SettlementMethod =
                    method.parse().map_err(DatabaseError::row_mapping)?;
                Some(Settlement {
                    id: SettlementId::from_uuid(id),
                    amount: Money::new(amount, currency),
                    method,
                    reference: self.settlement_reference,
                    settled_at,
                })
            }
            _ => None,
        };

        let assignment_history: Vec<AssignmentChange> =
            serde_json::from_value(self.assignment_history)
                .map_err(|e| DatabaseError::row_mapping(e.to_string()))?;

        Ok(Claim {
            id: ClaimId::from_uuid(self.claim_id),
            claim_number: self.claim_number,
            report_id: ReportId::from_uuid(self.report_id),
            driver_id: UserId::from_uuid(self.driver_id),
            agent_id: self.agent_id.map(UserId::from_uuid),
            status,
            severity,
            estimated_cost: Money::new(self.estimated_cost, cost_currency),
            remarks: self.remarks,
            settlement,
            assignment_history,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_row() -> ClaimRow {
        ClaimRow {
            claim_id: Uuid::new_v4(),
            claim_number: "CLM-2025-0000042".to_string(),
            report_id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            agent_id: None,
            status: "pending".to_string(),
            severity: "minor".to_string(),
            estimated_cost: dec!(1250),
            cost_currency: "USD".to_string(),
            remarks: None,
            settlement_id: None,
            settlement_amount: None,
            settlement_currency: None,
            settlement_method: None,
            settlement_reference: None,
            settled_at: None,
            assignment_history: serde_json::json!([]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_mapping_pending_claim() {
        let claim = base_row().into_claim().unwrap();
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert!(claim.settlement.is_none());
        assert!(claim.assignment_history.is_empty());
    }

    #[test]
    fn test_row_mapping_settled_claim() {
        let mut row = base_row();
        row.status = "settled".to_string();
        row.settlement_id = Some(Uuid::new_v4());
        row.settlement_amount = Some(dec!(4800));
        row.settlement_currency = Some("USD".to_string());
        row.settlement_method = Some("bank_transfer".to_string());
        row.settled_at = Some(Utc::now());

        let claim = row.into_claim().unwrap();
        let settlement = claim.settlement.unwrap();
        assert_eq!(settlement.amount.amount(), dec!(4800));
        assert_eq!(settlement.method, SettlementMethod::BankTransfer);
    }

    #[test]
    fn test_row_mapping_partial_settlement_is_dropped() {
        let mut row = base_row();
        row.settlement_amount = Some(dec!(100));
        let claim = row.into_claim().unwrap();
        assert!(claim.settlement.is_none());
    }

    #[test]
    fn test_row_mapping_rejects_unknown_status() {
        let mut row = base_row();
        row.status = "escalated".to_string();
        assert!(row.into_claim().is_err());
    }
}
