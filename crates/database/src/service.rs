//! Service (jobsite/contract) CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Service;

/// Create a new service.
pub async fn create_service(pool: &SqlitePool, service: &Service) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO services (id, organization_id, name, is_active, manager_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&service.id)
    .bind(&service.organization_id)
    .bind(&service.name)
    .bind(service.is_active)
    .bind(&service.manager_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a service by ID.
pub async fn get_service(pool: &SqlitePool, id: &str) -> Result<Service> {
    sqlx::query_as::<_, Service>(
        r#"
        SELECT id, organization_id, name, is_active, manager_id, created_at
        FROM services
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Service",
        id: id.to_string(),
    })
}

/// List an organization's services, ordered by name.
pub async fn list_services(pool: &SqlitePool, organization_id: &str) -> Result<Vec<Service>> {
    let services = sqlx::query_as::<_, Service>(
        r#"
        SELECT id, organization_id, name, is_active, manager_id, created_at
        FROM services
        WHERE organization_id = ?
        ORDER BY name
        "#,
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await?;

    Ok(services)
}

/// List an organization's active services, ordered by name.
pub async fn list_active_services(
    pool: &SqlitePool,
    organization_id: &str,
) -> Result<Vec<Service>> {
    let services = sqlx::query_as::<_, Service>(
        r#"
        SELECT id, organization_id, name, is_active, manager_id, created_at
        FROM services
        WHERE organization_id = ? AND is_active = 1
        ORDER BY name
        "#,
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await?;

    Ok(services)
}

/// IDs of the services a manager is responsible for.
pub async fn list_managed_service_ids(
    pool: &SqlitePool,
    manager_id: &str,
) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        r#"
        SELECT id
        FROM services
        WHERE manager_id = ?
        ORDER BY id
        "#,
    )
    .bind(manager_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Delete a service by ID.
///
/// Fails if documents, cost centers, or other children still reference it
/// (foreign keys are enforced).
pub async fn delete_service(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM services
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Service",
            id: id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Organization;
    use crate::{organization, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        organization::create_organization(
            db.pool(),
            &Organization {
                id: "org-1".to_string(),
                name: "Construtora Alfa".to_string(),
                slug: "construtora-alfa-t2".to_string(),
                cnpj: None,
                size_range: None,
                owner_id: None,
                created_at: String::new(),
            },
        )
        .await
        .unwrap();
        db
    }

    fn service(id: &str, name: &str, active: bool) -> Service {
        Service {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            name: name.to_string(),
            is_active: active,
            manager_id: None,
            created_at: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let db = test_db().await;
        create_service(db.pool(), &service("s1", "Obra Centro", true))
            .await
            .unwrap();
        create_service(db.pool(), &service("s2", "Obra Norte", false))
            .await
            .unwrap();

        assert_eq!(list_services(db.pool(), "org-1").await.unwrap().len(), 2);
        assert_eq!(
            list_active_services(db.pool(), "org-1").await.unwrap().len(),
            1
        );

        delete_service(db.pool(), "s2").await.unwrap();
        assert_eq!(list_services(db.pool(), "org-1").await.unwrap().len(), 1);

        let result = delete_service(db.pool(), "s2").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_managed_service_ids() {
        let db = test_db().await;
        crate::profile::create_profile(
            db.pool(),
            &crate::models::Profile {
                id: "mgr-1".to_string(),
                organization_id: Some("org-1".to_string()),
                full_name: "Gestora".to_string(),
                email: None,
                role: "manager".to_string(),
                whatsapp_number: None,
                phone: None,
                is_active: true,
                created_at: String::new(),
            },
        )
        .await
        .unwrap();

        let mut managed = service("s1", "Obra Centro", true);
        managed.manager_id = Some("mgr-1".to_string());
        create_service(db.pool(), &managed).await.unwrap();
        create_service(db.pool(), &service("s2", "Obra Norte", true))
            .await
            .unwrap();

        let ids = list_managed_service_ids(db.pool(), "mgr-1").await.unwrap();
        assert_eq!(ids, vec!["s1".to_string()]);

        let none = list_managed_service_ids(db.pool(), "ghost").await.unwrap();
        assert!(none.is_empty());
    }
}
