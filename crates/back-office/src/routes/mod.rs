//! Route handlers for the back-office interface.

pub mod account;
pub mod allocations;
pub mod audit;
pub mod collaborators;
pub mod dashboard;
pub mod health;
pub mod reports;
pub mod services;

use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // HTML pages
        .route("/", get(dashboard::dashboard_page))
        .route("/audit", get(audit::audit_page))
        // Health check
        .route("/health", get(health::health))
        // Account
        .route("/api/signup/company", post(account::signup_company_api))
        .route("/api/logout", post(account::logout_api))
        // Dashboard
        .route("/api/stats", get(dashboard::stats_api))
        // Audit queue
        .route("/api/queue", get(audit::queue_api))
        .route("/api/documents/:id", get(audit::document_api))
        .route("/api/documents/:id/match", get(audit::match_api))
        .route("/api/documents/:id/approve", post(audit::approve_api))
        .route("/api/documents/:id/reject", post(audit::reject_api))
        // Services and their classification children
        .route(
            "/api/services",
            get(services::list_api).post(services::create_api),
        )
        .route("/api/services/:id", delete(services::delete_api))
        .route("/api/services/:id/options", get(services::options_api))
        .route(
            "/api/services/:id/tasks",
            get(services::tasks_api).post(services::create_task_api),
        )
        .route(
            "/api/services/:id/cost-centers",
            get(services::cost_centers_api).post(services::create_cost_center_api),
        )
        .route("/api/services/:id/team", get(allocations::team_api))
        // Collaborators
        .route(
            "/api/collaborators",
            get(collaborators::list_api).post(collaborators::create_api),
        )
        // Allocations
        .route("/api/allocations", post(allocations::create_api))
        .route(
            "/api/allocations/:profile_id/:service_id",
            patch(allocations::status_api).delete(allocations::delete_api),
        )
        // Reports
        .route("/api/reports/expenses", get(reports::expenses_api))
}
