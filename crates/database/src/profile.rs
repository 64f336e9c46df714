//! Profile CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Profile;

const PROFILE_COLUMNS: &str = "id, organization_id, full_name, email, role, \
     whatsapp_number, phone, is_active, created_at";

/// Create a new profile.
pub async fn create_profile(pool: &SqlitePool, profile: &Profile) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (id, organization_id, full_name, email, role,
                              whatsapp_number, phone, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.organization_id)
    .bind(&profile.full_name)
    .bind(&profile.email)
    .bind(&profile.role)
    .bind(&profile.whatsapp_number)
    .bind(&profile.phone)
    .bind(profile.is_active)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Profile",
                    id: profile.id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a profile by ID.
pub async fn get_profile(pool: &SqlitePool, id: &str) -> Result<Profile> {
    find_profile(pool, id).await?.ok_or_else(|| DatabaseError::NotFound {
        entity: "Profile",
        id: id.to_string(),
    })
}

/// Get a profile by ID, returning `None` when absent.
///
/// The provisioner needs the absent case to be a value, not an error.
pub async fn find_profile(pool: &SqlitePool, id: &str) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(&format!(
        r#"
        SELECT {PROFILE_COLUMNS}
        FROM profiles
        WHERE id = ?
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

/// Create or update a profile keyed by ID (used by the invite flow).
pub async fn upsert_profile(pool: &SqlitePool, profile: &Profile) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (id, organization_id, full_name, email, role,
                              whatsapp_number, phone, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            organization_id = excluded.organization_id,
            full_name = excluded.full_name,
            email = excluded.email,
            role = excluded.role
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.organization_id)
    .bind(&profile.full_name)
    .bind(&profile.email)
    .bind(&profile.role)
    .bind(&profile.whatsapp_number)
    .bind(&profile.phone)
    .bind(profile.is_active)
    .execute(pool)
    .await?;

    Ok(())
}

/// Attach a profile to an organization.
pub async fn update_profile_organization(
    pool: &SqlitePool,
    profile_id: &str,
    organization_id: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE profiles
        SET organization_id = ?
        WHERE id = ?
        "#,
    )
    .bind(organization_id)
    .bind(profile_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Profile",
            id: profile_id.to_string(),
        });
    }

    Ok(())
}

/// List profiles of a role within an organization, optionally filtered by
/// a name/WhatsApp search term, ordered by name.
pub async fn list_profiles_by_role(
    pool: &SqlitePool,
    organization_id: &str,
    role: &str,
    search: Option<&str>,
) -> Result<Vec<Profile>> {
    let profiles = match search {
        Some(term) if !term.trim().is_empty() => {
            let pattern = format!("%{}%", term.trim());
            sqlx::query_as::<_, Profile>(&format!(
                r#"
                SELECT {PROFILE_COLUMNS}
                FROM profiles
                WHERE organization_id = ? AND role = ?
                  AND (full_name LIKE ? OR whatsapp_number LIKE ?)
                ORDER BY full_name
                "#
            ))
            .bind(organization_id)
            .bind(role)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(pool)
            .await?
        }
        _ => {
            sqlx::query_as::<_, Profile>(&format!(
                r#"
                SELECT {PROFILE_COLUMNS}
                FROM profiles
                WHERE organization_id = ? AND role = ?
                ORDER BY full_name
                "#
            ))
            .bind(organization_id)
            .bind(role)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(profiles)
}

/// List every profile in an organization, ordered by name.
pub async fn list_profiles(pool: &SqlitePool, organization_id: &str) -> Result<Vec<Profile>> {
    let profiles = sqlx::query_as::<_, Profile>(&format!(
        r#"
        SELECT {PROFILE_COLUMNS}
        FROM profiles
        WHERE organization_id = ?
        ORDER BY full_name
        "#
    ))
    .bind(organization_id)
    .fetch_all(pool)
    .await?;

    Ok(profiles)
}
