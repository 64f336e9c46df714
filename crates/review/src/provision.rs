//! Session profile provisioning.
//!
//! The identity provider is external; requests arrive with a verified
//! user id and display name. This module turns that identity into a
//! usable profile, creating whatever is missing: sign-ups that never got
//! a profile row, and profiles that lost their organization. Login never
//! blocks on these repairs: when they fail, the caller gets `None` and
//! the UI renders a locked state.

use database::models::{Organization, Profile};
use sqlx::SqlitePool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::Result;

/// Name given to organizations created by the self-healing path.
pub const DEFAULT_ORGANIZATION_NAME: &str = "Minha Empresa";

/// A verified identity from the external auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user id (UUID issued by the identity provider).
    pub user_id: String,
    /// Display name, when the provider has one.
    pub display_name: Option<String>,
}

/// Parameters for a company sign-up.
#[derive(Debug, Clone)]
pub struct CompanySignup {
    pub company_name: String,
    pub cnpj: Option<String>,
    pub size_range: Option<String>,
    pub owner_user_id: String,
    pub owner_full_name: String,
    pub owner_email: Option<String>,
}

/// Fetch the profile for an identity, healing missing pieces.
///
/// Returns `None` instead of an error on any failure: a broken profile
/// must degrade the view, not the login.
pub async fn ensure_profile(pool: &SqlitePool, identity: &Identity) -> Option<Profile> {
    match try_ensure_profile(pool, identity).await {
        Ok(profile) => Some(profile),
        Err(err) => {
            error!(user_id = %identity.user_id, error = %err, "Profile provisioning failed");
            None
        }
    }
}

async fn try_ensure_profile(pool: &SqlitePool, identity: &Identity) -> Result<Profile> {
    let existing = database::profile::find_profile(pool, &identity.user_id).await?;

    match existing {
        None => {
            warn!(user_id = %identity.user_id, "Profile missing, creating recovery profile");
            create_recovery_profile(pool, identity).await
        }
        Some(profile) if profile.organization_id.is_none() => {
            warn!(user_id = %identity.user_id, "Profile has no organization, fixing");
            attach_default_organization(pool, profile).await
        }
        Some(profile) => Ok(profile),
    }
}

/// Create a default organization plus an admin profile for a user that
/// has none. Single transaction: either both rows land or neither.
async fn create_recovery_profile(pool: &SqlitePool, identity: &Identity) -> Result<Profile> {
    let mut tx = pool.begin().await.map_err(database::DatabaseError::Sqlx)?;

    let org_id = Uuid::new_v4().to_string();
    let suffix = short_suffix();
    sqlx::query("INSERT INTO organizations (id, name, slug) VALUES (?, ?, ?)")
        .bind(&org_id)
        .bind(DEFAULT_ORGANIZATION_NAME)
        .bind(database::organization::slugify(
            DEFAULT_ORGANIZATION_NAME,
            &suffix,
        ))
        .execute(&mut *tx)
        .await
        .map_err(database::DatabaseError::Sqlx)?;

    let full_name = identity
        .display_name
        .clone()
        .unwrap_or_else(|| "Admin".to_string());
    sqlx::query(
        "INSERT INTO profiles (id, organization_id, full_name, role, is_active)
         VALUES (?, ?, ?, 'admin', 1)",
    )
    .bind(&identity.user_id)
    .bind(&org_id)
    .bind(&full_name)
    .execute(&mut *tx)
    .await
    .map_err(database::DatabaseError::Sqlx)?;

    tx.commit().await.map_err(database::DatabaseError::Sqlx)?;

    info!(user_id = %identity.user_id, organization_id = %org_id, "Recovery profile created");
    Ok(database::profile::get_profile(pool, &identity.user_id).await?)
}

/// Give an orphaned profile a fresh default organization.
async fn attach_default_organization(pool: &SqlitePool, profile: Profile) -> Result<Profile> {
    let mut tx = pool.begin().await.map_err(database::DatabaseError::Sqlx)?;

    let org_id = Uuid::new_v4().to_string();
    let suffix = short_suffix();
    sqlx::query("INSERT INTO organizations (id, name, slug) VALUES (?, ?, ?)")
        .bind(&org_id)
        .bind(DEFAULT_ORGANIZATION_NAME)
        .bind(database::organization::slugify(
            DEFAULT_ORGANIZATION_NAME,
            &suffix,
        ))
        .execute(&mut *tx)
        .await
        .map_err(database::DatabaseError::Sqlx)?;

    sqlx::query("UPDATE profiles SET organization_id = ? WHERE id = ?")
        .bind(&org_id)
        .bind(&profile.id)
        .execute(&mut *tx)
        .await
        .map_err(database::DatabaseError::Sqlx)?;

    tx.commit().await.map_err(database::DatabaseError::Sqlx)?;

    info!(user_id = %profile.id, organization_id = %org_id, "Organization attached to profile");
    Ok(database::profile::get_profile(pool, &profile.id).await?)
}

/// Register a company: organization plus owner profile, one transaction.
pub async fn register_company(
    pool: &SqlitePool,
    signup: &CompanySignup,
) -> Result<(Organization, Profile)> {
    database::validation::validate_name("company name", &signup.company_name)?;
    database::validation::validate_name("full name", &signup.owner_full_name)?;
    if let Some(email) = &signup.owner_email {
        database::validation::validate_email(email)?;
    }

    let mut tx = pool.begin().await.map_err(database::DatabaseError::Sqlx)?;

    let org_id = Uuid::new_v4().to_string();
    let slug = database::organization::slugify(&signup.company_name, &short_suffix());
    sqlx::query(
        "INSERT INTO organizations (id, name, slug, cnpj, size_range, owner_id)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&org_id)
    .bind(&signup.company_name)
    .bind(&slug)
    .bind(&signup.cnpj)
    .bind(&signup.size_range)
    .bind(&signup.owner_user_id)
    .execute(&mut *tx)
    .await
    .map_err(database::DatabaseError::Sqlx)?;

    sqlx::query(
        "INSERT INTO profiles (id, organization_id, full_name, email, role, is_active)
         VALUES (?, ?, ?, ?, 'owner', 1)",
    )
    .bind(&signup.owner_user_id)
    .bind(&org_id)
    .bind(&signup.owner_full_name)
    .bind(&signup.owner_email)
    .execute(&mut *tx)
    .await
    .map_err(database::DatabaseError::Sqlx)?;

    tx.commit().await.map_err(database::DatabaseError::Sqlx)?;

    info!(organization_id = %org_id, owner = %signup.owner_user_id, "Company registered");

    let org = database::organization::get_organization(pool, &org_id).await?;
    let profile = database::profile::get_profile(pool, &signup.owner_user_id).await?;
    Ok((org, profile))
}

/// Short random suffix for slugs, from a fresh UUID.
fn short_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..4].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::models::Profile;
    use database::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn identity(id: &str, name: Option<&str>) -> Identity {
        Identity {
            user_id: id.to_string(),
            display_name: name.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_missing_profile_gets_org_and_admin_role() {
        let db = test_db().await;

        let profile = ensure_profile(db.pool(), &identity("u1", Some("Maria")))
            .await
            .unwrap();
        assert_eq!(profile.full_name, "Maria");
        assert_eq!(profile.role, "admin");
        assert!(profile.organization_id.is_some());

        let org = database::organization::get_organization(
            db.pool(),
            profile.organization_id.as_deref().unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(org.name, DEFAULT_ORGANIZATION_NAME);
    }

    #[tokio::test]
    async fn test_missing_name_falls_back_to_admin() {
        let db = test_db().await;
        let profile = ensure_profile(db.pool(), &identity("u1", None)).await.unwrap();
        assert_eq!(profile.full_name, "Admin");
    }

    #[tokio::test]
    async fn test_orphan_profile_healed_with_exactly_one_org() {
        let db = test_db().await;
        database::profile::create_profile(
            db.pool(),
            &Profile {
                id: "u1".to_string(),
                organization_id: None,
                full_name: "Sem Organização".to_string(),
                email: None,
                role: "admin".to_string(),
                whatsapp_number: None,
                phone: None,
                is_active: true,
                created_at: String::new(),
            },
        )
        .await
        .unwrap();

        let healed = ensure_profile(db.pool(), &identity("u1", None)).await.unwrap();
        assert!(healed.organization_id.is_some());
        assert_eq!(
            database::organization::count_organizations(db.pool())
                .await
                .unwrap(),
            1
        );

        // Second load finds a healthy profile and creates nothing new.
        let again = ensure_profile(db.pool(), &identity("u1", None)).await.unwrap();
        assert_eq!(again.organization_id, healed.organization_id);
        assert_eq!(
            database::organization::count_organizations(db.pool())
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_healthy_profile_untouched() {
        let db = test_db().await;
        let first = ensure_profile(db.pool(), &identity("u1", Some("Maria")))
            .await
            .unwrap();
        let second = ensure_profile(db.pool(), &identity("u1", Some("Outra Grafia")))
            .await
            .unwrap();
        // Display-name drift does not rewrite an existing profile.
        assert_eq!(second.full_name, first.full_name);
    }

    #[tokio::test]
    async fn test_register_company() {
        let db = test_db().await;
        let (org, profile) = register_company(
            db.pool(),
            &CompanySignup {
                company_name: "Construções & Cia".to_string(),
                cnpj: Some("12.345.678/0001-00".to_string()),
                size_range: Some("11-50".to_string()),
                owner_user_id: "u1".to_string(),
                owner_full_name: "Maria Souza".to_string(),
                owner_email: Some("maria@example.com".to_string()),
            },
        )
        .await
        .unwrap();

        assert!(org.slug.starts_with("construcoes-cia-"));
        assert_eq!(org.owner_id.as_deref(), Some("u1"));
        assert_eq!(profile.role, "owner");
        assert_eq!(profile.organization_id.as_deref(), Some(org.id.as_str()));
    }

    #[tokio::test]
    async fn test_register_company_validates_input() {
        let db = test_db().await;
        let result = register_company(
            db.pool(),
            &CompanySignup {
                company_name: "  ".to_string(),
                cnpj: None,
                size_range: None,
                owner_user_id: "u1".to_string(),
                owner_full_name: "Maria".to_string(),
                owner_email: None,
            },
        )
        .await;
        assert!(matches!(result, Err(crate::ReviewError::Validation(_))));

        // Nothing was written.
        assert_eq!(
            database::organization::count_organizations(db.pool())
                .await
                .unwrap(),
            0
        );
    }
}
