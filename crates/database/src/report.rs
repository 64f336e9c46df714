//! Aggregated reads for reports.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::ExpensesSummaryRow;

/// Approved spend per service and cost center for an organization, from
/// `view_expenses_summary`.
pub async fn expenses_summary(
    pool: &SqlitePool,
    organization_id: &str,
) -> Result<Vec<ExpensesSummaryRow>> {
    let rows = sqlx::query_as::<_, ExpensesSummaryRow>(
        r#"
        SELECT service_name, cost_center_name, total_spent, month_year
        FROM view_expenses_summary
        WHERE organization_id = ?
        ORDER BY service_name, cost_center_name
        "#,
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
