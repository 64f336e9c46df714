//! Expense type CRUD and per-service enablement.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::ExpenseType;

/// Create a new expense type for an organization.
pub async fn create_expense_type(pool: &SqlitePool, expense_type: &ExpenseType) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO expense_types (id, organization_id, name)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&expense_type.id)
    .bind(&expense_type.organization_id)
    .bind(&expense_type.name)
    .execute(pool)
    .await?;

    Ok(())
}

/// List an organization's expense types, ordered by name.
pub async fn list_expense_types(
    pool: &SqlitePool,
    organization_id: &str,
) -> Result<Vec<ExpenseType>> {
    let types = sqlx::query_as::<_, ExpenseType>(
        r#"
        SELECT id, organization_id, name, created_at
        FROM expense_types
        WHERE organization_id = ?
        ORDER BY name
        "#,
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await?;

    Ok(types)
}

/// Enable an expense type for a service.
pub async fn enable_for_service(
    pool: &SqlitePool,
    service_id: &str,
    expense_type_id: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO service_expense_types (service_id, expense_type_id)
        VALUES (?, ?)
        "#,
    )
    .bind(service_id)
    .bind(expense_type_id)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "ServiceExpenseType",
                    id: format!("{}/{}", service_id, expense_type_id),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Disable an expense type for a service.
pub async fn disable_for_service(
    pool: &SqlitePool,
    service_id: &str,
    expense_type_id: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM service_expense_types
        WHERE service_id = ? AND expense_type_id = ?
        "#,
    )
    .bind(service_id)
    .bind(expense_type_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ServiceExpenseType",
            id: format!("{}/{}", service_id, expense_type_id),
        });
    }

    Ok(())
}

/// Expense types enabled for a service, ordered by name.
pub async fn list_enabled_for_service(
    pool: &SqlitePool,
    service_id: &str,
) -> Result<Vec<ExpenseType>> {
    let types = sqlx::query_as::<_, ExpenseType>(
        r#"
        SELECT et.id, et.organization_id, et.name, et.created_at
        FROM expense_types et
        INNER JOIN service_expense_types sete ON sete.expense_type_id = et.id
        WHERE sete.service_id = ?
        ORDER BY et.name
        "#,
    )
    .bind(service_id)
    .fetch_all(pool)
    .await?;

    Ok(types)
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
                slug: "construtora-alfa-t4".to_string(),
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

    fn expense_type(id: &str, name: &str) -> ExpenseType {
        ExpenseType {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            name: name.to_string(),
            created_at: String::new(),
        }
    }

    #[tokio::test]
    async fn test_enablement_scopes_listing() {
        let db = test_db().await;
        create_expense_type(db.pool(), &expense_type("et-1", "Combustível"))
            .await
            .unwrap();
        create_expense_type(db.pool(), &expense_type("et-2", "Alimentação"))
            .await
            .unwrap();

        enable_for_service(db.pool(), "s1", "et-1").await.unwrap();

        let enabled = list_enabled_for_service(db.pool(), "s1").await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "Combustível");

        // Enabling twice is a conflict, not a silent no-op.
        let dup = enable_for_service(db.pool(), "s1", "et-1").await;
        assert!(matches!(dup, Err(DatabaseError::AlreadyExists { .. })));

        disable_for_service(db.pool(), "s1", "et-1").await.unwrap();
        assert!(list_enabled_for_service(db.pool(), "s1")
            .await
            .unwrap()
            .is_empty());
    }
}
