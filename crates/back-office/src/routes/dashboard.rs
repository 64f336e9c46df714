//! Dashboard routes.

use askama::Template;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::error::Result;
use crate::identity;
use crate::state::AppState;

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub viewer_name: String,
    pub viewer_role: String,
    pub locked: bool,
    pub stats: Stats,
}

/// Dashboard statistics.
#[derive(Clone, Default, Serialize)]
pub struct Stats {
    pub pending_count: i64,
    pub processing_count: i64,
    pub approved_count: i64,
    pub rejected_count: i64,
    pub pending_by_service: Vec<ServicePending>,
}

/// Pending documents for a single service.
#[derive(Clone, Serialize)]
pub struct ServicePending {
    pub service_name: String,
    pub count: i64,
}

/// Render the dashboard page.
///
/// Anonymous or unprovisionable visitors get the locked rendering, not an
/// error page.
pub async fn dashboard_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<DashboardTemplate> {
    let Some(profile) = identity::optional_profile(&state, &headers).await else {
        return Ok(DashboardTemplate {
            viewer_name: String::new(),
            viewer_role: String::new(),
            locked: true,
            stats: Stats::default(),
        });
    };

    let stats = get_stats(&state, &profile).await?;
    Ok(DashboardTemplate {
        viewer_name: profile.full_name.clone(),
        viewer_role: profile.role.clone(),
        locked: false,
        stats,
    })
}

/// Get dashboard statistics as JSON.
pub async fn stats_api(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Stats>> {
    let profile = identity::require_profile(&state, &headers).await?;
    let stats = get_stats(&state, &profile).await?;
    Ok(Json(stats))
}

/// Fetch statistics from the database.
async fn get_stats(state: &AppState, profile: &database::models::Profile) -> Result<Stats> {
    let pool = state.db.pool();
    let organization_id = identity::organization_of(profile)?;

    let by_status = database::document::count_by_status(pool, &organization_id).await?;
    let by_service =
        database::document::pending_counts_by_service(pool, &organization_id).await?;

    let mut stats = Stats::default();
    for (status, count) in by_status {
        match status.as_str() {
            "review_needed" => stats.pending_count = count,
            "processing" => stats.processing_count = count,
            "approved" => stats.approved_count = count,
            "rejected" => stats.rejected_count = count,
            _ => {}
        }
    }

    stats.pending_by_service = by_service
        .into_iter()
        .map(|(service_name, count)| ServicePending {
            service_name,
            count,
        })
        .collect();

    Ok(stats)
}
