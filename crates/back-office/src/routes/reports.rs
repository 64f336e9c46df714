//! Expense report routes.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use extraction::format_brl;
use review::{can, Action};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::identity;
use crate::state::AppState;

/// Spend within one cost center of a service.
#[derive(Serialize)]
pub struct CostCenterSpend {
    pub cost_center_name: String,
    pub total_centavos: i64,
    pub total_display: String,
}

/// Spend for one service, broken down by cost center.
#[derive(Serialize)]
pub struct ServiceSpend {
    pub service_name: String,
    pub total_centavos: i64,
    pub total_display: String,
    pub cost_centers: Vec<CostCenterSpend>,
}

/// The consolidated expenses report.
#[derive(Serialize)]
pub struct ExpensesReport {
    /// Distinct cost center names across services (stack keys).
    pub cost_center_keys: Vec<String>,
    /// Per-service breakdown, highest spend first.
    pub services: Vec<ServiceSpend>,
    pub total_centavos: i64,
    pub total_display: String,
}

/// Approved spend per service and cost center.
pub async fn expenses_api(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ExpensesReport>> {
    let profile = identity::require_profile(&state, &headers).await?;
    if !can(&profile, Action::ViewReports) {
        return Err(AppError::Review(review::ReviewError::Forbidden(format!(
            "Seu cargo é '{}'. Esta ação não está disponível para você.",
            profile.role
        ))));
    }
    let organization_id = identity::organization_of(&profile)?;

    let rows = database::report::expenses_summary(state.db.pool(), &organization_id).await?;

    // Group rows by service; unnamed cost centers fall under "Geral".
    let mut keys: Vec<String> = Vec::new();
    let mut grouped: BTreeMap<String, Vec<CostCenterSpend>> = BTreeMap::new();
    let mut grand_total = 0i64;

    for row in rows {
        let cc_name = row
            .cost_center_name
            .unwrap_or_else(|| "Geral".to_string());
        if !keys.contains(&cc_name) {
            keys.push(cc_name.clone());
        }
        grand_total += row.total_spent;
        grouped.entry(row.service_name).or_default().push(CostCenterSpend {
            cost_center_name: cc_name,
            total_centavos: row.total_spent,
            total_display: format_brl(row.total_spent),
        });
    }

    let mut services: Vec<ServiceSpend> = grouped
        .into_iter()
        .map(|(service_name, cost_centers)| {
            let total: i64 = cost_centers.iter().map(|c| c.total_centavos).sum();
            ServiceSpend {
                service_name,
                total_centavos: total,
                total_display: format_brl(total),
                cost_centers,
            }
        })
        .collect();
    services.sort_by(|a, b| b.total_centavos.cmp(&a.total_centavos));

    Ok(Json(ExpensesReport {
        cost_center_keys: keys,
        services,
        total_centavos: grand_total,
        total_display: format_brl(grand_total),
    }))
}
