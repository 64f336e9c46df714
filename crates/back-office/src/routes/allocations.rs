//! Staff allocation routes.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use notifier::Notice;
use review::dispatch;
use serde::{Deserialize, Serialize};
use tracing::warn;

use database::models::AllocationStatus;

use crate::error::{AppError, Result};
use crate::identity;
use crate::state::AppState;

/// Request to allocate a collaborator to a service.
#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    pub profile_id: String,
    pub service_id: String,
    #[serde(default)]
    pub scheduled_at: Option<String>,
}

/// Request to update an allocation's invite status.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// One of `pending|accepted|rejected|uncertain`.
    pub status: String,
}

/// A team member with their allocation state.
#[derive(Serialize)]
pub struct TeamMember {
    pub profile_id: String,
    pub full_name: String,
    pub whatsapp_number: Option<String>,
    pub status: String,
    pub scheduled_at: Option<String>,
}

/// Mutation confirmation.
#[derive(Serialize)]
pub struct ActionResponse {
    pub message: String,
    /// Webhook outcome for the allocation notice, when one was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_status: Option<String>,
}

/// The team allocated to a service, with invite statuses.
pub async fn team_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(service_id): Path<String>,
) -> Result<Json<Vec<TeamMember>>> {
    let profile = identity::require_profile(&state, &headers).await?;
    let organization_id = identity::organization_of(&profile)?;

    let service = database::service::get_service(state.db.pool(), &service_id).await?;
    if service.organization_id != organization_id {
        return Err(AppError::Database(database::DatabaseError::NotFound {
            entity: "Service",
            id: service_id,
        }));
    }

    let allocations =
        database::allocation::list_allocations_for_service(state.db.pool(), &service_id).await?;
    let team = database::allocation::list_team_for_service(state.db.pool(), &service_id).await?;
    let by_id: HashMap<String, (String, Option<String>)> = allocations
        .into_iter()
        .map(|a| (a.profile_id, (a.status, a.scheduled_at)))
        .collect();

    let members = team
        .into_iter()
        .map(|p| {
            let (status, scheduled_at) = by_id
                .get(&p.id)
                .cloned()
                .unwrap_or_else(|| (AllocationStatus::Uncertain.as_str().to_string(), None));
            TeamMember {
                profile_id: p.id,
                full_name: p.full_name,
                whatsapp_number: p.whatsapp_number,
                status,
                scheduled_at,
            }
        })
        .collect();

    Ok(Json(members))
}

/// Allocate a collaborator and fire the allocation notice.
///
/// The allocation stands even when the notice fails; the webhook outcome
/// is reported, never fatal.
pub async fn create_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AllocateRequest>,
) -> Result<Json<ActionResponse>> {
    let profile = identity::require_profile(&state, &headers).await?;

    let confirmation = dispatch::allocate_staff(
        state.db.pool(),
        &profile,
        &request.profile_id,
        &request.service_id,
        request.scheduled_at.as_deref(),
    )
    .await?;

    let webhook_status = send_allocation_notice(&state, &profile, &request).await;

    Ok(Json(ActionResponse {
        message: confirmation.message,
        webhook_status: Some(webhook_status),
    }))
}

/// Update an allocation's invite status (accepted/rejected/uncertain).
pub async fn status_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((profile_id, service_id)): Path<(String, String)>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<ActionResponse>> {
    let profile = identity::require_profile(&state, &headers).await?;

    let status = AllocationStatus::parse(&request.status).ok_or_else(|| {
        AppError::BadRequest(format!("unknown allocation status '{}'", request.status))
    })?;

    if !review::can(&profile, review::Action::AllocateStaff) {
        return Err(AppError::Review(review::ReviewError::Forbidden(format!(
            "Seu cargo é '{}'. Esta ação não está disponível para você.",
            profile.role
        ))));
    }

    database::allocation::set_status(state.db.pool(), &profile_id, &service_id, status.as_str())
        .await?;

    Ok(Json(ActionResponse {
        message: "Status atualizado.".to_string(),
        webhook_status: None,
    }))
}

/// Remove an allocation.
pub async fn delete_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((profile_id, service_id)): Path<(String, String)>,
) -> Result<Json<ActionResponse>> {
    let profile = identity::require_profile(&state, &headers).await?;

    let confirmation =
        dispatch::deallocate_staff(state.db.pool(), &profile, &profile_id, &service_id).await?;

    Ok(Json(ActionResponse {
        message: confirmation.message,
        webhook_status: None,
    }))
}

/// Best-effort allocation notice; failures are logged only.
async fn send_allocation_notice(
    state: &AppState,
    actor: &database::models::Profile,
    request: &AllocateRequest,
) -> String {
    let target = database::profile::find_profile(state.db.pool(), &request.profile_id)
        .await
        .ok()
        .flatten();
    let service_name =
        match database::service::get_service(state.db.pool(), &request.service_id).await {
            Ok(service) => service.name,
            Err(_) => "Serviço não identificado".to_string(),
        };

    let (full_name, email, whatsapp) = match target {
        Some(p) => (
            p.full_name,
            p.email.unwrap_or_default(),
            p.whatsapp_number.unwrap_or_default(),
        ),
        None => ("Colaborador".to_string(), String::new(), String::new()),
    };

    let status = state
        .notifier
        .send(&Notice::AllocationInvite {
            profile_id: request.profile_id.clone(),
            service_id: request.service_id.clone(),
            email,
            full_name,
            whatsapp,
            service_name,
            date_time: request.scheduled_at.clone().unwrap_or_default(),
            organization_id: actor.organization_id.clone(),
            invited_by: actor.id.clone(),
            invited_by_name: actor.full_name.clone(),
        })
        .await;

    if !status.is_delivered() {
        warn!(status = %status.as_str(), "Allocation notice not delivered");
    }

    status.as_str()
}
