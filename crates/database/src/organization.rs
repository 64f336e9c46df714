//! Organization CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Organization;

/// Create a new organization.
pub async fn create_organization(pool: &SqlitePool, org: &Organization) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO organizations (id, name, slug, cnpj, size_range, owner_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&org.id)
    .bind(&org.name)
    .bind(&org.slug)
    .bind(&org.cnpj)
    .bind(&org.size_range)
    .bind(&org.owner_id)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Organization",
                    id: org.slug.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get an organization by ID.
pub async fn get_organization(pool: &SqlitePool, id: &str) -> Result<Organization> {
    sqlx::query_as::<_, Organization>(
        r#"
        SELECT id, name, slug, cnpj, size_range, owner_id, created_at
        FROM organizations
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Organization",
        id: id.to_string(),
    })
}

/// Count organizations.
pub async fn count_organizations(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM organizations
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Derive a URL-safe slug from an organization name.
///
/// Lowercases, strips common Portuguese accents, collapses everything else
/// to hyphens, and appends the given suffix to keep slugs unique.
pub fn slugify(name: &str, suffix: &str) -> String {
    let mut slug = String::with_capacity(name.len() + suffix.len() + 1);
    let mut last_hyphen = true; // avoid a leading hyphen

    for c in name.to_lowercase().chars() {
        let c = match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            other => other,
        };

        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        slug.push_str("org");
    }

    slug.push('-');
    slug.push_str(suffix);
    slug
}
