//! Service management routes: services, tasks, cost centers, and the
//! classification options the audit screen cascades through.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use review::{can, classifier, Action};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use database::models::{CostCenter, Service, Task};

use crate::error::{AppError, Result};
use crate::identity;
use crate::state::AppState;

/// Request to create a service.
#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    #[serde(default)]
    pub manager_id: Option<String>,
}

/// Request to create a task.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
}

/// Request to create a cost center.
#[derive(Debug, Deserialize)]
pub struct CreateCostCenterRequest {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Classification options for a service, with the configuration-gap flag
/// the audit screen surfaces.
#[derive(Serialize)]
pub struct OptionsResponse {
    pub cost_centers: Vec<CostCenter>,
    pub expense_types: Vec<database::models::ExpenseType>,
    /// True when the service has nothing configured; approval is blocked
    /// until someone fixes the setup.
    pub configuration_gap: bool,
}

/// Mutation confirmation.
#[derive(Serialize)]
pub struct ActionResponse {
    pub message: String,
}

/// List the organization's services.
pub async fn list_api(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Service>>> {
    let profile = identity::require_profile(&state, &headers).await?;
    let organization_id = identity::organization_of(&profile)?;

    let services = database::service::list_services(state.db.pool(), &organization_id).await?;
    Ok(Json(services))
}

/// Create a service.
pub async fn create_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateServiceRequest>,
) -> Result<Json<Service>> {
    let profile = identity::require_profile(&state, &headers).await?;
    require(&profile, Action::ManageServices)?;
    let organization_id = identity::organization_of(&profile)?;

    database::validation::validate_name("service name", &request.name)
        .map_err(review::ReviewError::Validation)?;

    let service = Service {
        id: Uuid::new_v4().to_string(),
        organization_id,
        name: request.name.trim().to_string(),
        is_active: true,
        manager_id: request.manager_id,
        created_at: String::new(),
    };
    database::service::create_service(state.db.pool(), &service).await?;

    let created = database::service::get_service(state.db.pool(), &service.id).await?;
    Ok(Json(created))
}

/// Delete a service.
pub async fn delete_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>> {
    let profile = identity::require_profile(&state, &headers).await?;
    require(&profile, Action::ManageServices)?;

    check_service_org(&state, &profile, &id).await?;
    database::service::delete_service(state.db.pool(), &id).await?;

    Ok(Json(ActionResponse {
        message: "Serviço removido.".to_string(),
    }))
}

/// Valid child classification options for a service.
pub async fn options_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OptionsResponse>> {
    let profile = identity::require_profile(&state, &headers).await?;
    check_service_org(&state, &profile, &id).await?;

    let options = classifier::load_options(state.db.pool(), &id).await?;
    let configuration_gap = options.is_empty();

    Ok(Json(OptionsResponse {
        cost_centers: options.cost_centers,
        expense_types: options.expense_types,
        configuration_gap,
    }))
}

/// List a service's tasks.
pub async fn tasks_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<Task>>> {
    let profile = identity::require_profile(&state, &headers).await?;
    check_service_org(&state, &profile, &id).await?;

    let tasks = database::task::list_tasks_for_service(state.db.pool(), &id).await?;
    Ok(Json(tasks))
}

/// Create a task under a service.
pub async fn create_task_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<Json<Task>> {
    let profile = identity::require_profile(&state, &headers).await?;
    require(&profile, Action::ManageServices)?;
    let organization_id = identity::organization_of(&profile)?;
    check_service_org(&state, &profile, &id).await?;

    database::validation::validate_name("task title", &request.title)
        .map_err(review::ReviewError::Validation)?;

    let task = Task {
        id: Uuid::new_v4().to_string(),
        organization_id,
        service_id: id,
        title: request.title.trim().to_string(),
        status: "pending".to_string(),
        created_at: String::new(),
    };
    database::task::create_task(state.db.pool(), &task).await?;

    Ok(Json(task))
}

/// List a service's cost centers.
pub async fn cost_centers_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<CostCenter>>> {
    let profile = identity::require_profile(&state, &headers).await?;
    check_service_org(&state, &profile, &id).await?;

    let centers =
        database::cost_center::list_cost_centers_for_service(state.db.pool(), &id).await?;
    Ok(Json(centers))
}

/// Create a cost center under a service.
pub async fn create_cost_center_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<CreateCostCenterRequest>,
) -> Result<Json<CostCenter>> {
    let profile = identity::require_profile(&state, &headers).await?;
    require(&profile, Action::ManageServices)?;
    let organization_id = identity::organization_of(&profile)?;
    check_service_org(&state, &profile, &id).await?;

    database::validation::validate_name("cost center name", &request.name)
        .map_err(review::ReviewError::Validation)?;

    let cc = CostCenter {
        id: Uuid::new_v4().to_string(),
        organization_id,
        service_id: id,
        name: request.name.trim().to_string(),
        code: request.code,
        created_at: String::new(),
    };
    database::cost_center::create_cost_center(state.db.pool(), &cc).await?;

    Ok(Json(cc))
}

/// A service outside the caller's organization is indistinguishable from
/// a missing one.
async fn check_service_org(
    state: &AppState,
    profile: &database::models::Profile,
    service_id: &str,
) -> Result<Service> {
    let organization_id = identity::organization_of(profile)?;
    let service = database::service::get_service(state.db.pool(), service_id).await?;
    if service.organization_id != organization_id {
        return Err(AppError::Database(database::DatabaseError::NotFound {
            entity: "Service",
            id: service_id.to_string(),
        }));
    }
    Ok(service)
}

fn require(profile: &database::models::Profile, action: Action) -> Result<()> {
    if can(profile, action) {
        Ok(())
    } else {
        Err(AppError::Review(review::ReviewError::Forbidden(format!(
            "Seu cargo é '{}'. Esta ação não está disponível para você.",
            profile.role
        ))))
    }
}
