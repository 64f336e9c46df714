//! Account routes: company sign-up completion and logout.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use review::provision::{self, CompanySignup};
use serde::{Deserialize, Serialize};

use database::models::{Organization, Profile};

use crate::error::{AppError, Result};
use crate::identity;
use crate::state::AppState;

/// Company registration body. The auth account already exists (created
/// by the external identity provider); this attaches the organization
/// and owner profile to it.
#[derive(Debug, Deserialize)]
pub struct CompanySignupRequest {
    pub company_name: String,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(default)]
    pub size_range: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Registration result.
#[derive(Serialize)]
pub struct CompanySignupResponse {
    pub organization: Organization,
    pub profile: Profile,
}

/// Mutation confirmation.
#[derive(Serialize)]
pub struct ActionResponse {
    pub message: String,
}

/// Register the caller's company and owner profile.
pub async fn signup_company_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CompanySignupRequest>,
) -> Result<Json<CompanySignupResponse>> {
    // No profile requirement here: this request is what creates it.
    let caller = identity::identity_from_headers(&headers).ok_or(AppError::Unauthorized)?;

    let (organization, profile) = provision::register_company(
        state.db.pool(),
        &CompanySignup {
            company_name: request.company_name,
            cnpj: request.cnpj,
            size_range: request.size_range,
            owner_user_id: caller.user_id,
            owner_full_name: caller
                .display_name
                .unwrap_or_else(|| "Proprietário".to_string()),
            owner_email: request.email,
        },
    )
    .await?;

    Ok(Json(CompanySignupResponse {
        organization,
        profile,
    }))
}

/// Dispose the caller's review session.
pub async fn logout_api(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ActionResponse>> {
    let caller = identity::identity_from_headers(&headers).ok_or(AppError::Unauthorized)?;
    state.dispose_session(&caller.user_id).await;

    Ok(Json(ActionResponse {
        message: "Sessão encerrada.".to_string(),
    }))
}
