//! Collaborator routes.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use review::dispatch;
use serde::{Deserialize, Serialize};

use database::models::Profile;

use crate::error::Result;
use crate::identity;
use crate::state::AppState;

/// Collaborator listing filter.
#[derive(Debug, Deserialize)]
pub struct CollaboratorFilter {
    /// Name or WhatsApp substring.
    pub search: Option<String>,
}

/// Request to create a no-login collaborator.
#[derive(Debug, Deserialize)]
pub struct CreateCollaboratorRequest {
    pub full_name: String,
    pub whatsapp_number: String,
}

/// A collaborator with their current allocation, if any.
#[derive(Serialize)]
pub struct CollaboratorView {
    pub id: String,
    pub full_name: String,
    pub whatsapp_number: Option<String>,
    pub organization_id: Option<String>,
    /// Name of the accepted service allocation, when present.
    pub allocated_service: Option<String>,
}

/// List the organization's field collaborators (drivers).
pub async fn list_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<CollaboratorFilter>,
) -> Result<Json<Vec<CollaboratorView>>> {
    let profile = identity::require_profile(&state, &headers).await?;
    let organization_id = identity::organization_of(&profile)?;

    let drivers = database::profile::list_profiles_by_role(
        state.db.pool(),
        &organization_id,
        "driver",
        filter.search.as_deref(),
    )
    .await?;

    let mut views = Vec::with_capacity(drivers.len());
    for driver in drivers {
        let allocated_service =
            database::allocation::active_service_for_profile(state.db.pool(), &driver.id)
                .await?
                .map(|s| s.name);
        views.push(CollaboratorView {
            id: driver.id,
            full_name: driver.full_name,
            whatsapp_number: driver.whatsapp_number,
            organization_id: driver.organization_id,
            allocated_service,
        });
    }

    Ok(Json(views))
}

/// Create a collaborator without system access, used only to link
/// expenses.
pub async fn create_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCollaboratorRequest>,
) -> Result<Json<Profile>> {
    let profile = identity::require_profile(&state, &headers).await?;

    let created = dispatch::create_collaborator(
        state.db.pool(),
        &profile,
        &request.full_name,
        &request.whatsapp_number,
    )
    .await?;

    Ok(Json(created))
}
