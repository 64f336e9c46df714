//! Staff allocation (profile↔service) operations.
//!
//! Allocations carry an invite lifecycle: `pending` until the collaborator
//! responds, then `accepted`, `rejected`, or `uncertain`.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Allocation, Profile, Service};

/// Allocate a profile to a service with `pending` status.
pub async fn allocate(
    pool: &SqlitePool,
    profile_id: &str,
    service_id: &str,
    scheduled_at: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profile_services (profile_id, service_id, status, scheduled_at)
        VALUES (?, ?, 'pending', ?)
        "#,
    )
    .bind(profile_id)
    .bind(service_id)
    .bind(scheduled_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Allocation",
                    id: format!("{}/{}", profile_id, service_id),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Update an allocation's invite status.
pub async fn set_status(
    pool: &SqlitePool,
    profile_id: &str,
    service_id: &str,
    status: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE profile_services
        SET status = ?
        WHERE profile_id = ? AND service_id = ?
        "#,
    )
    .bind(status)
    .bind(profile_id)
    .bind(service_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Allocation",
            id: format!("{}/{}", profile_id, service_id),
        });
    }

    Ok(())
}

/// Remove an allocation.
pub async fn deallocate(pool: &SqlitePool, profile_id: &str, service_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM profile_services
        WHERE profile_id = ? AND service_id = ?
        "#,
    )
    .bind(profile_id)
    .bind(service_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Allocation",
            id: format!("{}/{}", profile_id, service_id),
        });
    }

    Ok(())
}

/// Get a single allocation.
pub async fn get_allocation(
    pool: &SqlitePool,
    profile_id: &str,
    service_id: &str,
) -> Result<Allocation> {
    sqlx::query_as::<_, Allocation>(
        r#"
        SELECT profile_id, service_id, status, scheduled_at, created_at
        FROM profile_services
        WHERE profile_id = ? AND service_id = ?
        "#,
    )
    .bind(profile_id)
    .bind(service_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Allocation",
        id: format!("{}/{}", profile_id, service_id),
    })
}

/// Profiles allocated to a service (any status), ordered by name.
pub async fn list_team_for_service(pool: &SqlitePool, service_id: &str) -> Result<Vec<Profile>> {
    let profiles = sqlx::query_as::<_, Profile>(
        r#"
        SELECT p.id, p.organization_id, p.full_name, p.email, p.role,
               p.whatsapp_number, p.phone, p.is_active, p.created_at
        FROM profiles p
        INNER JOIN profile_services ps ON ps.profile_id = p.id
        WHERE ps.service_id = ?
        ORDER BY p.full_name
        "#,
    )
    .bind(service_id)
    .fetch_all(pool)
    .await?;

    Ok(profiles)
}

/// Allocations for a service with their statuses, ordered by creation.
pub async fn list_allocations_for_service(
    pool: &SqlitePool,
    service_id: &str,
) -> Result<Vec<Allocation>> {
    let allocations = sqlx::query_as::<_, Allocation>(
        r#"
        SELECT profile_id, service_id, status, scheduled_at, created_at
        FROM profile_services
        WHERE service_id = ?
        ORDER BY created_at
        "#,
    )
    .bind(service_id)
    .fetch_all(pool)
    .await?;

    Ok(allocations)
}

/// The service a profile is currently working on: its most recent accepted
/// allocation, if any. One active service per collaborator is the rule the
/// audit flow assumes.
pub async fn active_service_for_profile(
    pool: &SqlitePool,
    profile_id: &str,
) -> Result<Option<Service>> {
    let service = sqlx::query_as::<_, Service>(
        r#"
        SELECT s.id, s.organization_id, s.name, s.is_active, s.manager_id, s.created_at
        FROM services s
        INNER JOIN profile_services ps ON ps.service_id = s.id
        WHERE ps.profile_id = ? AND ps.status = 'accepted'
        ORDER BY ps.created_at DESC
        LIMIT 1
        "#,
    )
    .bind(profile_id)
    .fetch_optional(pool)
    .await?;

    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Organization, Service};
    use crate::{organization, profile, service, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        organization::create_organization(
            db.pool(),
            &Organization {
                id: "org-1".to_string(),
                name: "Construtora Alfa".to_string(),
                slug: "construtora-alfa-t5".to_string(),
                cnpj: None,
                size_range: None,
                owner_id: None,
                created_at: String::new(),
            },
        )
        .await
        .unwrap();
        for (id, name) in [("s1", "Obra Centro"), ("s2", "Obra Norte")] {
            service::create_service(
                db.pool(),
                &Service {
                    id: id.to_string(),
                    organization_id: "org-1".to_string(),
                    name: name.to_string(),
                    is_active: true,
                    manager_id: None,
                    created_at: String::new(),
                },
            )
            .await
            .unwrap();
        }
        profile::create_profile(
            db.pool(),
            &crate::models::Profile {
                id: "d1".to_string(),
                organization_id: Some("org-1".to_string()),
                full_name: "João".to_string(),
                email: None,
                role: "driver".to_string(),
                whatsapp_number: Some("5511999990001".to_string()),
                phone: None,
                is_active: true,
                created_at: String::new(),
            },
        )
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_allocation_lifecycle() {
        let db = test_db().await;
        allocate(db.pool(), "d1", "s1", Some("2026-08-10 07:00:00"))
            .await
            .unwrap();

        let allocation = get_allocation(db.pool(), "d1", "s1").await.unwrap();
        assert_eq!(allocation.status, "pending");

        // Pending allocations do not count as an active service yet.
        assert!(active_service_for_profile(db.pool(), "d1")
            .await
            .unwrap()
            .is_none());

        set_status(db.pool(), "d1", "s1", "accepted").await.unwrap();
        let active = active_service_for_profile(db.pool(), "d1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.id, "s1");

        deallocate(db.pool(), "d1", "s1").await.unwrap();
        assert!(active_service_for_profile(db.pool(), "d1")
            .await
            .unwrap()
            .is_none());

        let gone = deallocate(db.pool(), "d1", "s1").await;
        assert!(matches!(gone, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_allocation_rejected() {
        let db = test_db().await;
        allocate(db.pool(), "d1", "s1", None).await.unwrap();
        let dup = allocate(db.pool(), "d1", "s1", None).await;
        assert!(matches!(dup, Err(DatabaseError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_team_listing() {
        let db = test_db().await;
        allocate(db.pool(), "d1", "s1", None).await.unwrap();

        let team = list_team_for_service(db.pool(), "s1").await.unwrap();
        assert_eq!(team.len(), 1);
        assert_eq!(team[0].full_name, "João");

        assert!(list_team_for_service(db.pool(), "s2")
            .await
            .unwrap()
            .is_empty());
    }
}
