//! Sender auto-matching.
//!
//! A best-effort proposal over externally correlated data; always
//! advisory, never applied without the reviewer.

use database::models::Document;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;

/// A proposed responsible collaborator for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchProposal {
    pub profile_id: String,
    pub full_name: String,
    /// True when the document was already linked, false when the match
    /// view proposed the profile.
    pub already_linked: bool,
}

/// Propose a profile for a document.
///
/// Documents already carrying a `profile_id` return it directly; others
/// consult the precomputed match view, accepting at most one candidate.
pub async fn propose_profile(
    pool: &SqlitePool,
    document: &Document,
) -> Result<Option<MatchProposal>> {
    if let Some(profile_id) = &document.profile_id {
        let profile = database::profile::get_profile(pool, profile_id).await?;
        return Ok(Some(MatchProposal {
            profile_id: profile.id,
            full_name: profile.full_name,
            already_linked: true,
        }));
    }

    let proposal = database::document_match::find_match(pool, &document.id)
        .await?
        .map(|m| {
            info!(document = %m.document_id, profile = %m.profile_id, "Sender auto-matched");
            MatchProposal {
                profile_id: m.profile_id,
                full_name: m.full_name,
                already_linked: false,
            }
        });

    Ok(proposal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::models::{Document, Organization, Profile};
    use database::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        database::organization::create_organization(
            db.pool(),
            &Organization {
                id: "org-1".to_string(),
                name: "Construtora Alfa".to_string(),
                slug: "construtora-alfa-m1".to_string(),
                cnpj: None,
                size_range: None,
                owner_id: None,
                created_at: String::new(),
            },
        )
        .await
        .unwrap();
        database::profile::create_profile(
            db.pool(),
            &Profile {
                id: "d1".to_string(),
                organization_id: Some("org-1".to_string()),
                full_name: "João da Silva".to_string(),
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

    fn doc(id: &str, profile_id: Option<&str>, sender_phone: Option<&str>) -> Document {
        Document {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            status: "review_needed".to_string(),
            file_url: format!("https://cdn.example/{id}.jpg"),
            file_type: "image/jpeg".to_string(),
            extracted_data: None,
            sender_name: Some("João".to_string()),
            sender_phone: sender_phone.map(str::to_string),
            profile_id: profile_id.map(str::to_string),
            service_id: None,
            cost_center_id: None,
            expense_type_id: None,
            total_centavos: None,
            rejection_reason: None,
            approved_at: None,
            created_at: String::new(),
        }
    }

    #[tokio::test]
    async fn test_linked_document_returns_its_profile() {
        let db = test_db().await;
        let d = doc("doc-1", Some("d1"), None);
        database::document::create_document(db.pool(), &d).await.unwrap();

        let proposal = propose_profile(db.pool(), &d).await.unwrap().unwrap();
        assert_eq!(proposal.profile_id, "d1");
        assert!(proposal.already_linked);
    }

    #[tokio::test]
    async fn test_unlinked_document_consults_view() {
        let db = test_db().await;
        let d = doc("doc-1", None, Some("5511999990001"));
        database::document::create_document(db.pool(), &d).await.unwrap();

        let proposal = propose_profile(db.pool(), &d).await.unwrap().unwrap();
        assert_eq!(proposal.profile_id, "d1");
        assert_eq!(proposal.full_name, "João da Silva");
        assert!(!proposal.already_linked);
    }

    #[tokio::test]
    async fn test_no_candidate_is_none() {
        let db = test_db().await;
        let d = doc("doc-1", None, Some("5500000000000"));
        database::document::create_document(db.pool(), &d).await.unwrap();

        assert!(propose_profile(db.pool(), &d).await.unwrap().is_none());
    }
}
