//! SQLite persistence layer for CasaEmOrdem.
//!
//! This crate provides async database operations for organizations,
//! profiles, jobsites ("services"), classification entities, and expense
//! documents using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{models::Organization, organization, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:casaemordem.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let org = Organization {
//!         id: "7b0c01a2-92a7-4be8-8f3e-2f0a9a3a7e11".to_string(),
//!         name: "Construtora Alfa".to_string(),
//!         slug: "construtora-alfa-9x2k".to_string(),
//!         cnpj: None,
//!         size_range: None,
//!         owner_id: None,
//!         created_at: String::new(),
//!     };
//!     organization::create_organization(db.pool(), &org).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod allocation;
pub mod cost_center;
pub mod document;
pub mod document_match;
pub mod error;
pub mod expense_type;
pub mod invite;
pub mod models;
pub mod organization;
pub mod profile;
pub mod report;
pub mod service;
pub mod task;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    Allocation, AllocationStatus, CostCenter, Document, DocumentMatch,
    DocumentStatus, ExpenseType, ExpensesSummaryRow, InviteRecord,
    Organization, Profile, QueueRow, Role, Service, Task,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough to handle concurrent review sessions.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist;
    /// `sqlite::memory:` gives an in-memory database for testing.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Organization, Profile};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn org(id: &str) -> Organization {
        Organization {
            id: id.to_string(),
            name: "Construtora Alfa".to_string(),
            slug: format!("construtora-alfa-{id}"),
            cnpj: None,
            size_range: None,
            owner_id: None,
            created_at: String::new(),
        }
    }

    #[tokio::test]
    async fn test_profile_crud() {
        let db = test_db().await;
        organization::create_organization(db.pool(), &org("org-1"))
            .await
            .unwrap();

        let p = Profile {
            id: "prof-1".to_string(),
            organization_id: Some("org-1".to_string()),
            full_name: "Maria Souza".to_string(),
            email: Some("maria@example.com".to_string()),
            role: "admin".to_string(),
            whatsapp_number: Some("5511999998888".to_string()),
            phone: None,
            is_active: true,
            created_at: String::new(),
        };
        profile::create_profile(db.pool(), &p).await.unwrap();

        let fetched = profile::get_profile(db.pool(), "prof-1").await.unwrap();
        assert_eq!(fetched.full_name, "Maria Souza");
        assert_eq!(fetched.role_kind(), Role::Admin);

        profile::update_profile_organization(db.pool(), "prof-1", "org-1")
            .await
            .unwrap();

        let missing = profile::get_profile(db.pool(), "nope").await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }
}
