//! CasaEmOrdem invite endpoints.
//!
//! Two JSON endpoints kept out of the main back-office process, so the
//! notification automation can be granted a narrower surface:
//!
//! - `POST /invites/system`: generate and record a system access invite
//!   (admin/owner only) and forward it to the notification webhook.
//! - `POST /invites/allocation`: forward an allocation notice for an
//!   already-created allocation.
//!
//! Callers authenticate with a static bearer token; the acting user
//! arrives in the `x-auth-user-id` header set by the auth proxy, and is
//! authorized by profile role.

use std::env;
use std::net::SocketAddr;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use database::models::{InviteRecord, Profile};
use database::Database;
use notifier::{Notice, Notifier};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
struct AppState {
    db: Database,
    notifier: Notifier,
    api_token: Option<String>,
    frontend_url: String,
}

#[derive(Debug, Deserialize)]
struct SystemInviteRequest {
    email: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    organization_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SystemInviteResponse {
    message: String,
    id: String,
    webhook_status: String,
}

#[derive(Debug, Deserialize)]
struct AllocationInviteRequest {
    #[serde(default)]
    profile_id: Option<String>,
    #[serde(default)]
    service_id: Option<String>,
    #[serde(default)]
    date_time: Option<String>,
}

#[derive(Debug, Serialize)]
struct OkResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
}

#[derive(Debug)]
enum ApiError {
    Unauthorized,
    Forbidden(String),
    BadRequest(String),
    Database(database::DatabaseError),
}

impl From<database::DatabaseError> for ApiError {
    fn from(err: database::DatabaseError) -> Self {
        ApiError::Database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Sessão inválida ou expirada".to_string(),
            ),
            ApiError::Forbidden(details) => (StatusCode::FORBIDDEN, details),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Database(err @ database::DatabaseError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            ApiError::Database(err) => {
                error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let addr: SocketAddr = env::var("INVITE_GATEWAY_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8791".to_string())
        .parse()?;
    let database_url =
        env::var("SQLITE_PATH").unwrap_or_else(|_| "sqlite:casaemordem.db?mode=rwc".to_string());
    let api_token = env::var("INVITE_GATEWAY_TOKEN").ok();
    let webhook_url = env::var("NOTIFY_WEBHOOK_URL").ok();
    let frontend_url = env::var("FRONTEND_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string();

    if api_token.is_none() {
        warn!("INVITE_GATEWAY_TOKEN not set; requests will not require a bearer token");
    }

    let db = Database::connect(&database_url).await?;
    db.migrate().await?;

    let state = AppState {
        db,
        notifier: Notifier::new(webhook_url),
        api_token,
        frontend_url,
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/invites/system", post(system_invite))
        .route("/invites/allocation", post(allocation_invite))
        .with_state(state);

    info!(%addr, "Invite gateway listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

/// Generate, record, and forward a system access invite.
async fn system_invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SystemInviteRequest>,
) -> Result<Json<SystemInviteResponse>, ApiError> {
    authorize(&state, &headers)?;
    let caller = caller_profile(&state, &headers).await?;

    info!(caller = %caller.id, role = %caller.role, "System invite requested");

    if !matches!(caller.role.as_str(), "admin" | "owner") {
        return Err(ApiError::Forbidden(format!(
            "Seu cargo é '{}'. Apenas Administradores ou Donos podem convidar usuários.",
            caller.role
        )));
    }

    let email = payload.email.trim().to_string();
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email é obrigatório".to_string()));
    }

    let role = payload.role.unwrap_or_else(|| "manager".to_string());
    let organization_id = payload
        .organization_id
        .or_else(|| caller.organization_id.clone());

    // The identity provider's admin API is outside this service; the
    // invite token is minted here and resolved by the set-password page.
    let invite_token = Uuid::new_v4().to_string();
    let invite_link = format!(
        "{}/definir-senha?invite={}",
        state.frontend_url, invite_token
    );

    let invited_id = Uuid::new_v4().to_string();

    // Recording failures are logged but do not abort the invite.
    let record = InviteRecord {
        id: invite_token.clone(),
        email: email.clone(),
        full_name: payload.full_name.clone(),
        role: Some(role.clone()),
        organization_id: organization_id.clone(),
        invite_link: invite_link.clone(),
        status: String::new(),
        created_at: String::new(),
    };
    if let Err(err) = database::invite::enqueue_invite(state.db.pool(), &record).await {
        warn!(error = %err, "Failed to record invite, continuing");
    }

    let invited = Profile {
        id: invited_id.clone(),
        organization_id: organization_id.clone(),
        full_name: payload
            .full_name
            .clone()
            .unwrap_or_else(|| "Convidado".to_string()),
        email: Some(email.clone()),
        role: role.clone(),
        whatsapp_number: None,
        phone: None,
        is_active: true,
        created_at: String::new(),
    };
    if let Err(err) = database::profile::upsert_profile(state.db.pool(), &invited).await {
        error!(error = %err, "Failed to create invited profile");
    }

    let status = state
        .notifier
        .send(&Notice::SystemInvite {
            email: email.clone(),
            full_name: invited.full_name.clone(),
            role,
            invite_link,
            organization_id,
            invited_by: caller.id.clone(),
            invited_by_name: caller.full_name.clone(),
        })
        .await;

    if status.is_delivered() {
        if let Err(err) = database::invite::mark_sent(state.db.pool(), &email).await {
            warn!(error = %err, "Failed to flip invite to sent");
        }
    }

    Ok(Json(SystemInviteResponse {
        message: "Convite processado com sucesso.".to_string(),
        id: invited_id,
        webhook_status: status.as_str(),
    }))
}

/// Forward an allocation notice for a collaborator and service.
async fn allocation_invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AllocationInviteRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    authorize(&state, &headers)?;
    let caller = caller_profile(&state, &headers).await?;

    let (Some(profile_id), Some(service_id)) = (payload.profile_id, payload.service_id) else {
        return Err(ApiError::BadRequest(
            "'profile_id' e 'service_id' são obrigatórios.".to_string(),
        ));
    };

    // Target display fields are best-effort; the notice still goes out
    // with fallbacks when lookups miss.
    let target = database::profile::find_profile(state.db.pool(), &profile_id).await?;
    let service_name = match database::service::get_service(state.db.pool(), &service_id).await {
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

    info!(profile = %profile_id, service = %service_id, "Forwarding allocation notice");

    let status = state
        .notifier
        .send(&Notice::AllocationInvite {
            profile_id,
            service_id,
            email,
            full_name,
            whatsapp,
            service_name,
            date_time: payload
                .date_time
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
            organization_id: caller.organization_id.clone(),
            invited_by: caller.id,
            invited_by_name: caller.full_name,
        })
        .await;

    // Delivery failure is logged by the notifier and deliberately not
    // surfaced as an error: the allocation itself already happened.
    if !status.is_delivered() {
        warn!(status = %status.as_str(), "Allocation notice not delivered");
    }

    Ok(Json(OkResponse {
        message: "OK".to_string(),
    }))
}

/// Check the static service bearer token, when one is configured.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.api_token.as_deref() else {
        return Ok(());
    };

    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(ApiError::Unauthorized);
    };

    let Ok(value) = value.to_str() else {
        return Err(ApiError::Unauthorized);
    };

    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    if token != expected {
        return Err(ApiError::Unauthorized);
    }

    Ok(())
}

/// Resolve the acting profile from the trusted auth headers.
async fn caller_profile(state: &AppState, headers: &HeaderMap) -> Result<Profile, ApiError> {
    let Some(user_id) = headers
        .get("x-auth-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    else {
        return Err(ApiError::Unauthorized);
    };

    database::profile::find_profile(state.db.pool(), user_id)
        .await?
        .ok_or_else(|| {
            ApiError::Forbidden("Não foi possível validar seu perfil de acesso.".to_string())
        })
}
