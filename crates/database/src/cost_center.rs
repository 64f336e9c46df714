//! Cost center CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::CostCenter;

/// Create a new cost center under a service.
pub async fn create_cost_center(pool: &SqlitePool, cc: &CostCenter) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO cost_centers (id, organization_id, service_id, name, code)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&cc.id)
    .bind(&cc.organization_id)
    .bind(&cc.service_id)
    .bind(&cc.name)
    .bind(&cc.code)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a cost center by ID.
pub async fn get_cost_center(pool: &SqlitePool, id: &str) -> Result<CostCenter> {
    sqlx::query_as::<_, CostCenter>(
        r#"
        SELECT id, organization_id, service_id, name, code, created_at
        FROM cost_centers
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "CostCenter",
        id: id.to_string(),
    })
}

/// List a service's cost centers, ordered by code.
pub async fn list_cost_centers_for_service(
    pool: &SqlitePool,
    service_id: &str,
) -> Result<Vec<CostCenter>> {
    let centers = sqlx::query_as::<_, CostCenter>(
        r#"
        SELECT id, organization_id, service_id, name, code, created_at
        FROM cost_centers
        WHERE service_id = ?
        ORDER BY code
        "#,
    )
    .bind(service_id)
    .fetch_all(pool)
    .await?;

    Ok(centers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Organization, Service};
    use crate::{organization, service, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        organization::create_organization(
            db.pool(),
            &Organization {
                id: "org-1".to_string(),
                name: "Construtora Alfa".to_string(),
                slug: "construtora-alfa-t3".to_string(),
                cnpj: None,
                size_range: None,
                owner_id: None,
                created_at: String::new(),
            },
        )
        .await
        .unwrap();
        service::create_service(
            db.pool(),
            &Service {
                id: "s1".to_string(),
                organization_id: "org-1".to_string(),
                name: "Obra Centro".to_string(),
                is_active: true,
                manager_id: None,
                created_at: String::new(),
            },
        )
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_create_and_list_ordered_by_code() {
        let db = test_db().await;
        for (id, name, code) in [
            ("cc-2", "Mão de Obra", "MO-02"),
            ("cc-1", "Combustível", "CB-01"),
        ] {
            create_cost_center(
                db.pool(),
                &CostCenter {
                    id: id.to_string(),
                    organization_id: "org-1".to_string(),
                    service_id: "s1".to_string(),
                    name: name.to_string(),
                    code: Some(code.to_string()),
                    created_at: String::new(),
                },
            )
            .await
            .unwrap();
        }

        let centers = list_cost_centers_for_service(db.pool(), "s1").await.unwrap();
        assert_eq!(centers.len(), 2);
        assert_eq!(centers[0].code.as_deref(), Some("CB-01"));

        let missing = get_cost_center(db.pool(), "cc-9").await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }
}
