//! Claims handlers
//!
//! The orchestration layer of the claim lifecycle: every operation here is a
//! domain transition plus its persistence, agent-workload bookkeeping, and
//! notification fan-out, in that order. Notifications go out only after the
//! database write succeeded.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClaimId, Currency, Money, ReportId, UserId};
use domain_claims::{Claim, ClaimStatus, Settlement, SettlementMethod};
use domain_notifications::compose;
use domain_users::User;
use infra_db::repositories::claims::ClaimFilter;
use infra_realtime::{ChatMessage, RealtimeHub, ServerEvent};

use crate::auth::AuthUser;
use crate::dto::claims::{
    AssignClaimRequest, ChatMessageRequest, ClaimListQuery, ClaimResponse, CreateClaimRequest,
    SettleClaimRequest, UpdateStatusRequest,
};
use crate::error::ApiError;
use crate::AppState;

/// Files a claim against one of the caller's accident reports
///
/// The claim is auto-assigned to the least-loaded agent when one exists;
/// otherwise it stays pending until an admin assigns it.
pub async fn create_claim(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let report = state
        .reports
        .get_by_id(ReportId::from_uuid(request.report_id))
        .await?;
    if report.driver_id != auth.id {
        return Err(ApiError::Forbidden(
            "report belongs to another driver".to_string(),
        ));
    }

    let mut claim = Claim::open(&report);
    let driver = state.users.get_user(auth.id, None).await?;

    let agent = state.users.least_loaded_agent(None).await?;
    if let Some(ref agent) = agent {
        claim.assign_to(agent.id)?;
    }

    state.claims.create(&claim).await?;

    let mut notifications = compose::claim_created(&claim, &driver);
    if let Some(ref agent) = agent {
        state
            .users
            .set_assignment(agent.id, claim.id, true, None)
            .await?;
        notifications.extend(compose::claim_assigned(&claim, agent, &driver));
    }
    state.notifier.dispatch_all(notifications, None).await?;

    info!(
        claim_id = %claim.id,
        claim_number = %claim.claim_number,
        agent = agent.as_ref().map(|a| a.id.to_string()),
        "Claim created"
    );

    Ok(Json(ClaimResponse::from(&claim)))
}

/// Lists claims scoped by role: drivers see their own, agents their
/// assignments, admins everything
pub async fn list_claims(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ClaimListQuery>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let claims = if auth.is_admin() {
        let status = query
            .status
            .as_deref()
            .map(str::parse::<ClaimStatus>)
            .transpose()
            .map_err(ApiError::BadRequest)?;
        let limit = query.limit.unwrap_or(20).min(100);
        let page = query.page.unwrap_or(1).max(1);
        state
            .claims
            .list(ClaimFilter {
                status,
                limit: Some(limit),
                offset: Some((page - 1) * limit),
            })
            .await?
    } else if auth.is_agent() {
        state.claims.list_by_agent(auth.id).await?
    } else {
        state.claims.list_by_driver(auth.id).await?
    };

    Ok(Json(claims.iter().map(ClaimResponse::from).collect()))
}

/// Fetches one claim; visible to its driver, its agent, and admins
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.claims.get_by_id(ClaimId::from_uuid(id)).await?;
    authorize_view(&claim, &auth)?;
    Ok(Json(ClaimResponse::from(&claim)))
}

/// Agent review transitions: `in_review`, `approved`, `rejected`
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let mut claim = state.claims.get_by_id(ClaimId::from_uuid(id)).await?;
    let old_status = claim.status;

    let driver = state.users.get_user(claim.driver_id, None).await?;
    let agent = state.users.get_user(auth.id, None).await?;

    let notifications = match request.status.as_str() {
        "in_review" => {
            if claim.agent_id != Some(auth.id) && !auth.is_admin() {
                return Err(ApiError::Forbidden(
                    "claim is assigned to another agent".to_string(),
                ));
            }
            claim.start_review()?;
            compose::claim_status_changed(&claim, old_status, claim.status, &driver, Some(&agent))
        }
        "approved" => {
            claim.approve(auth.id)?;
            compose::claim_approved(&claim, &driver, &agent)
        }
        "rejected" => {
            let remarks = request
                .remarks
                .as_deref()
                .ok_or_else(|| ApiError::Validation("rejection requires remarks".to_string()))?;
            claim.reject(auth.id, remarks)?;
            compose::claim_rejected(&claim, &driver, &agent, remarks)
        }
        other => {
            return Err(ApiError::BadRequest(format!(
                "unsupported status transition: {other}"
            )))
        }
    };

    state
        .claims
        .save_status_change(&claim, request.remarks.as_deref())
        .await?;

    // A rejected claim no longer occupies its agent
    if claim.status == ClaimStatus::Rejected {
        if let Some(agent_id) = claim.agent_id {
            state
                .users
                .set_assignment(agent_id, claim.id, false, None)
                .await?;
        }
    }

    state.notifier.dispatch_all(notifications, None).await?;

    info!(
        claim_id = %claim.id,
        from = old_status.as_str(),
        to = claim.status.as_str(),
        "Claim status updated"
    );

    Ok(Json(ClaimResponse::from(&claim)))
}

/// Records the settlement and closes the claim
pub async fn settle_claim(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<SettleClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let mut claim = state.claims.get_by_id(ClaimId::from_uuid(id)).await?;
    if claim.agent_id != Some(auth.id) && !auth.is_admin() {
        return Err(ApiError::Forbidden(
            "claim is assigned to another agent".to_string(),
        ));
    }

    let currency: Currency = request
        .currency
        .parse()
        .map_err(|e: core_kernel::MoneyError| ApiError::Validation(e.to_string()))?;
    let method: SettlementMethod = request
        .method
        .parse()
        .map_err(ApiError::Validation)?;
    let settlement = Settlement::new(
        Money::new(request.amount, currency),
        method,
        request.reference,
    )?;

    claim.settle(settlement.clone())?;
    state
        .claims
        .save_status_change(&claim, Some("settled"))
        .await?;

    // Settlement frees the agent's slot
    if let Some(agent_id) = claim.agent_id {
        state
            .users
            .set_assignment(agent_id, claim.id, false, None)
            .await?;
    }

    let driver = state.users.get_user(claim.driver_id, None).await?;
    let agent = maybe_user(&state, claim.agent_id).await?;
    state
        .notifier
        .dispatch_all(
            compose::claim_settled(&claim, &driver, agent.as_ref(), &settlement),
            None,
        )
        .await?;

    info!(claim_id = %claim.id, amount = %settlement.amount, "Claim settled");

    Ok(Json(ClaimResponse::from(&claim)))
}

/// Admin assignment: explicit agent, or the least-loaded one
pub async fn assign_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    reassign(state, id, request.agent_id).await
}

/// Admin reassignment to a named agent
pub async fn reassign_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let agent_id = request
        .agent_id
        .ok_or_else(|| ApiError::BadRequest("agent_id is required".to_string()))?;
    reassign(state, id, Some(agent_id)).await
}

async fn reassign(
    state: AppState,
    claim_id: Uuid,
    agent_id: Option<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let mut claim = state.claims.get_by_id(ClaimId::from_uuid(claim_id)).await?;

    let agent = match agent_id {
        Some(id) => {
            let user = state.users.get_user(UserId::from_uuid(id), None).await?;
            if !user.acts_as_agent() {
                return Err(ApiError::Validation(format!(
                    "user {} is not an agent",
                    user.id
                )));
            }
            user
        }
        None => state
            .users
            .least_loaded_agent(None)
            .await?
            .ok_or_else(|| ApiError::Conflict("no eligible agent available".to_string()))?,
    };

    let previous = claim.assign_to(agent.id)?;
    if previous == Some(agent.id) {
        return Ok(Json(ClaimResponse::from(&claim)));
    }

    state.claims.save(&claim).await?;
    state
        .users
        .set_assignment(agent.id, claim.id, true, None)
        .await?;
    if let Some(old_id) = previous {
        state
            .users
            .set_assignment(old_id, claim.id, false, None)
            .await?;
    }

    let driver = state.users.get_user(claim.driver_id, None).await?;
    let old_agent = maybe_user(&state, previous).await?;
    let notifications = match old_agent {
        Some(ref old_agent) => {
            compose::claim_reassigned(&claim, Some(old_agent), &agent, &driver)
        }
        None => compose::claim_assigned(&claim, &agent, &driver),
    };
    state.notifier.dispatch_all(notifications, None).await?;

    info!(
        claim_id = %claim.id,
        agent_id = %agent.id,
        previous = previous.map(|p| p.to_string()),
        "Claim assignment updated"
    );

    Ok(Json(ClaimResponse::from(&claim)))
}

/// Relays a chat message into the claim room and notifies the counterparty
pub async fn send_chat_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChatMessageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let claim = state.claims.get_by_id(ClaimId::from_uuid(id)).await?;
    authorize_view(&claim, &auth)?;

    let message = ChatMessage::new(claim.id, auth.id, request.body.clone());
    let delivered = state
        .hub
        .emit_to_claim(
            claim.id,
            ServerEvent::ReceiveChat {
                message: message.clone(),
            },
        )
        .await;

    // The counterparty gets an inbox notification as well: driver if an
    // agent wrote, agent otherwise
    let receiver = if auth.id == claim.driver_id {
        claim.agent_id
    } else {
        Some(claim.driver_id)
    };
    if let Some(receiver) = receiver {
        state
            .notifier
            .dispatch_all(
                compose::new_message(auth.id, receiver, claim.id, &request.body),
                None,
            )
            .await?;
    }

    Ok(Json(serde_json::json!({
        "message_id": message.id.as_uuid(),
        "delivered": delivered,
        "room": RealtimeHub::claim_room(claim.id),
    })))
}

fn authorize_view(claim: &Claim, auth: &AuthUser) -> Result<(), ApiError> {
    let allowed =
        auth.is_admin() || claim.driver_id == auth.id || claim.agent_id == Some(auth.id);
    if allowed {
        Ok(())
    } else {
        Err(ApiError::Forbidden("not a party to this claim".to_string()))
    }
}

async fn maybe_user(state: &AppState, id: Option<UserId>) -> Result<Option<User>, ApiError> {
    match id {
        Some(id) => Ok(Some(state.users.get_user(id, None).await?)),
        None => Ok(None),
    }
}
