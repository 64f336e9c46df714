//! Mutation dispatch.
//!
//! Every state-changing action funnels through here: capability check,
//! client-side validation, then the database write. Success patches the
//! optimistic queue state and returns a user-visible confirmation;
//! failure changes nothing locally and carries the remote message
//! verbatim. Nothing is retried.

use database::document::ApprovalUpdate;
use database::models::Profile;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::authz::{can, can_review_service, Action};
use crate::classifier::{ApprovalSpec, Classification};
use crate::error::{Result, ReviewError};
use crate::queue::QueueState;

/// Reviewer corrections applied to the extracted data at approval.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewedFields {
    pub vendor_name: Option<String>,
    pub tax_id: Option<String>,
    /// Confirmed amount, in the display format (`"150,00"`).
    pub total: Option<String>,
    pub issued_at: Option<String>,
}

impl ReviewedFields {
    fn is_empty(&self) -> bool {
        self.vendor_name.is_none()
            && self.tax_id.is_none()
            && self.total.is_none()
            && self.issued_at.is_none()
    }
}

/// User-visible result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub message: String,
}

/// Approve a document under a full classification.
pub async fn approve_document(
    pool: &SqlitePool,
    queue: &mut QueueState,
    reviewer: &Profile,
    document_id: &str,
    spec: &ApprovalSpec,
    responsible_profile_id: Option<&str>,
    reviewed: &ReviewedFields,
) -> Result<Confirmation> {
    require(reviewer, Action::ReviewDocuments)?;

    let service = database::service::get_service(pool, &spec.service_id).await?;
    if !can_review_service(reviewer, &service) {
        return Err(ReviewError::Forbidden(
            "Você não gerencia esta obra/serviço.".to_string(),
        ));
    }

    let document = database::document::get_document(pool, document_id).await?;

    let merged = merge_reviewed_fields(document.extracted_json(), reviewed);
    let extracted_data = merged.as_ref().map(Value::to_string);

    let total_centavos = reviewed
        .total
        .as_deref()
        .and_then(extraction::parse_brl)
        .or_else(|| {
            merged
                .as_ref()
                .map(extraction::Extraction::from_json)
                .and_then(|e| {
                    e.find(extraction::FieldKind::Total)
                        .and_then(extraction::parse_brl_value)
                })
        });

    let (cost_center_id, expense_type_id) = match &spec.classification {
        Classification::CostCenter(id) => (Some(id.as_str()), None),
        Classification::ExpenseType(id) => (None, Some(id.as_str())),
    };

    database::document::approve(
        pool,
        document_id,
        &ApprovalUpdate {
            profile_id: responsible_profile_id,
            service_id: &spec.service_id,
            cost_center_id,
            expense_type_id,
            total_centavos,
            extracted_data: extracted_data.as_deref(),
        },
    )
    .await?;

    queue.remove(document_id);
    info!(document = %document_id, service = %spec.service_id, "Document approved");

    Ok(Confirmation {
        message: "Aprovado!".to_string(),
    })
}

/// Reject a document with a mandatory reason.
///
/// An empty or whitespace-only reason is refused before any request is
/// issued.
pub async fn reject_document(
    pool: &SqlitePool,
    queue: &mut QueueState,
    reviewer: &Profile,
    document_id: &str,
    reason: &str,
) -> Result<Confirmation> {
    require(reviewer, Action::ReviewDocuments)?;
    database::validation::validate_rejection_reason(reason)?;

    database::document::reject(pool, document_id, reason.trim()).await?;

    queue.remove(document_id);
    info!(document = %document_id, "Document rejected");

    Ok(Confirmation {
        message: "Rejeitado".to_string(),
    })
}

/// Allocate a collaborator to a service (invite starts `pending`).
pub async fn allocate_staff(
    pool: &SqlitePool,
    actor: &Profile,
    profile_id: &str,
    service_id: &str,
    scheduled_at: Option<&str>,
) -> Result<Confirmation> {
    require(actor, Action::AllocateStaff)?;

    let service = database::service::get_service(pool, service_id).await?;
    if !can_review_service(actor, &service) {
        return Err(ReviewError::Forbidden(
            "Você não gerencia esta obra/serviço.".to_string(),
        ));
    }

    database::allocation::allocate(pool, profile_id, service_id, scheduled_at).await?;
    info!(profile = %profile_id, service = %service_id, "Collaborator allocated");

    Ok(Confirmation {
        message: "Colaborador alocado com sucesso!".to_string(),
    })
}

/// Remove a collaborator's allocation.
pub async fn deallocate_staff(
    pool: &SqlitePool,
    actor: &Profile,
    profile_id: &str,
    service_id: &str,
) -> Result<Confirmation> {
    require(actor, Action::AllocateStaff)?;

    database::allocation::deallocate(pool, profile_id, service_id).await?;
    info!(profile = %profile_id, service = %service_id, "Collaborator deallocated");

    Ok(Confirmation {
        message: "Desalocado.".to_string(),
    })
}

/// Create a no-login collaborator (used only to link expenses).
pub async fn create_collaborator(
    pool: &SqlitePool,
    actor: &Profile,
    full_name: &str,
    whatsapp_number: &str,
) -> Result<Profile> {
    require(actor, Action::ManageCollaborators)?;
    database::validation::validate_name("full name", full_name)?;
    database::validation::validate_whatsapp(whatsapp_number)?;

    let Some(organization_id) = actor.organization_id.clone() else {
        return Err(ReviewError::Forbidden(
            "Organização não identificada no seu perfil.".to_string(),
        ));
    };

    let profile = Profile {
        id: Uuid::new_v4().to_string(),
        organization_id: Some(organization_id),
        full_name: full_name.trim().to_string(),
        email: None,
        role: "driver".to_string(),
        whatsapp_number: Some(whatsapp_number.trim().to_string()),
        phone: None,
        is_active: true,
        created_at: String::new(),
    };
    database::profile::create_profile(pool, &profile).await?;
    info!(profile = %profile.id, "Collaborator created");

    Ok(profile)
}

fn require(actor: &Profile, action: Action) -> Result<()> {
    if can(actor, action) {
        Ok(())
    } else {
        Err(ReviewError::Forbidden(format!(
            "Seu cargo é '{}'. Esta ação não está disponível para você.",
            actor.role
        )))
    }
}

/// Merge reviewer overrides into the extracted payload, preserving
/// everything else. Returns `None` when there is neither a payload nor an
/// override to write.
fn merge_reviewed_fields(
    extracted: Option<Value>,
    reviewed: &ReviewedFields,
) -> Option<Value> {
    if extracted.is_none() && reviewed.is_empty() {
        return None;
    }

    let mut root = match extracted {
        Some(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };

    if reviewed.vendor_name.is_some() || reviewed.tax_id.is_some() {
        let emitente = root.entry("emitente").or_insert_with(|| json!({}));
        if !emitente.is_object() {
            *emitente = json!({});
        }
        if let Some(name) = &reviewed.vendor_name {
            emitente["razao_social"] = json!(name);
        }
        if let Some(tax_id) = &reviewed.tax_id {
            emitente["cnpj_cpf"] = json!(tax_id);
        }
    }

    if reviewed.total.is_some() || reviewed.issued_at.is_some() {
        let fiscais = root.entry("detalhes_fiscais").or_insert_with(|| json!({}));
        if !fiscais.is_object() {
            *fiscais = json!({});
        }
        if let Some(total) = &reviewed.total {
            fiscais["valor_total"] = json!(total);
        }
        if let Some(issued_at) = &reviewed.issued_at {
            fiscais["data_emissao"] = json!(issued_at);
        }
    }

    Some(Value::Object(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classification;
    use database::models::{CostCenter, Document, Organization, Service};
    use database::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        database::organization::create_organization(
            db.pool(),
            &Organization {
                id: "org-1".to_string(),
                name: "Construtora Alfa".to_string(),
                slug: "construtora-alfa-dp1".to_string(),
                cnpj: None,
                size_range: None,
                owner_id: None,
                created_at: String::new(),
            },
        )
        .await
        .unwrap();
        database::service::create_service(
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
        database::cost_center::create_cost_center(
            db.pool(),
            &CostCenter {
                id: "cc-1".to_string(),
                organization_id: "org-1".to_string(),
                service_id: "s1".to_string(),
                name: "Combustível".to_string(),
                code: Some("CB-01".to_string()),
                created_at: String::new(),
            },
        )
        .await
        .unwrap();
        db
    }

    fn admin() -> Profile {
        Profile {
            id: "adm-1".to_string(),
            organization_id: Some("org-1".to_string()),
            full_name: "Admin".to_string(),
            email: None,
            role: "admin".to_string(),
            whatsapp_number: None,
            phone: None,
            is_active: true,
            created_at: String::new(),
        }
    }

    fn driver_profile() -> Profile {
        Profile {
            role: "driver".to_string(),
            ..admin()
        }
    }

    fn pending_doc(id: &str) -> Document {
        Document {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            status: "review_needed".to_string(),
            file_url: format!("https://cdn.example/{id}.jpg"),
            file_type: "image/jpeg".to_string(),
            extracted_data: Some(r#"{"detalhes_fiscais":{"valor_total":"150,00"}}"#.to_string()),
            sender_name: Some("João".to_string()),
            sender_phone: None,
            profile_id: None,
            service_id: None,
            cost_center_id: None,
            expense_type_id: None,
            total_centavos: None,
            rejection_reason: None,
            approved_at: None,
            created_at: String::new(),
        }
    }

    fn spec() -> ApprovalSpec {
        ApprovalSpec {
            service_id: "s1".to_string(),
            classification: Classification::CostCenter("cc-1".to_string()),
        }
    }

    async fn loaded_queue(db: &Database, profile: &Profile) -> QueueState {
        let mut queue = QueueState::new();
        let token = queue.begin_load();
        let entries = crate::queue::load_queue(db.pool(), profile, "review_needed")
            .await
            .unwrap();
        queue.complete_load(token, entries);
        queue
    }

    #[tokio::test]
    async fn test_approve_patches_queue_and_stamps_total() {
        let db = test_db().await;
        database::document::create_document(db.pool(), &pending_doc("doc-1"))
            .await
            .unwrap();
        let reviewer = admin();
        let mut queue = loaded_queue(&db, &reviewer).await;
        assert_eq!(queue.entries().len(), 1);

        let confirmation = approve_document(
            db.pool(),
            &mut queue,
            &reviewer,
            "doc-1",
            &spec(),
            None,
            &ReviewedFields::default(),
        )
        .await
        .unwrap();
        assert_eq!(confirmation.message, "Aprovado!");
        assert!(queue.entries().is_empty());
        assert!(queue.needs_refresh());

        let doc = database::document::get_document(db.pool(), "doc-1")
            .await
            .unwrap();
        assert_eq!(doc.status, "approved");
        // Amount came from the extracted payload.
        assert_eq!(doc.total_centavos, Some(15_000));
    }

    #[tokio::test]
    async fn test_approve_merges_overrides() {
        let db = test_db().await;
        database::document::create_document(db.pool(), &pending_doc("doc-1"))
            .await
            .unwrap();
        let reviewer = admin();
        let mut queue = loaded_queue(&db, &reviewer).await;

        let reviewed = ReviewedFields {
            vendor_name: Some("Posto Shell".to_string()),
            total: Some("200,00".to_string()),
            ..Default::default()
        };
        approve_document(
            db.pool(),
            &mut queue,
            &reviewer,
            "doc-1",
            &spec(),
            None,
            &reviewed,
        )
        .await
        .unwrap();

        let doc = database::document::get_document(db.pool(), "doc-1")
            .await
            .unwrap();
        // Override wins over the original extraction.
        assert_eq!(doc.total_centavos, Some(20_000));
        let json = doc.extracted_json().unwrap();
        assert_eq!(json["emitente"]["razao_social"], "Posto Shell");
        assert_eq!(json["detalhes_fiscais"]["valor_total"], "200,00");
    }

    #[tokio::test]
    async fn test_failed_approve_leaves_queue_untouched() {
        let db = test_db().await;
        database::document::create_document(db.pool(), &pending_doc("doc-1"))
            .await
            .unwrap();
        let reviewer = admin();
        let mut queue = loaded_queue(&db, &reviewer).await;

        let result = approve_document(
            db.pool(),
            &mut queue,
            &reviewer,
            "doc-missing",
            &spec(),
            None,
            &ReviewedFields::default(),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(queue.entries().len(), 1);
        assert!(!queue.needs_refresh());
    }

    #[tokio::test]
    async fn test_reject_requires_reason_before_any_request() {
        let db = test_db().await;
        let reviewer = admin();
        let mut queue = QueueState::new();

        // The document does not even exist; an empty reason must fail as
        // validation, proving no request was issued.
        let result =
            reject_document(db.pool(), &mut queue, &reviewer, "doc-missing", "   ").await;
        assert!(matches!(result, Err(ReviewError::Validation(_))));
    }

    #[tokio::test]
    async fn test_driver_cannot_review() {
        let db = test_db().await;
        database::document::create_document(db.pool(), &pending_doc("doc-1"))
            .await
            .unwrap();
        let mut queue = QueueState::new();

        let result = reject_document(
            db.pool(),
            &mut queue,
            &driver_profile(),
            "doc-1",
            "motivo qualquer",
        )
        .await;
        assert!(matches!(result, Err(ReviewError::Forbidden(_))));

        let doc = database::document::get_document(db.pool(), "doc-1")
            .await
            .unwrap();
        assert_eq!(doc.status, "review_needed");
    }

    #[tokio::test]
    async fn test_create_collaborator_validates() {
        let db = test_db().await;
        let actor = admin();

        let created = create_collaborator(db.pool(), &actor, "João da Silva", "5511999990001")
            .await
            .unwrap();
        assert_eq!(created.role, "driver");

        let bad_phone =
            create_collaborator(db.pool(), &actor, "Pedro", "11 9999-0001").await;
        assert!(matches!(bad_phone, Err(ReviewError::Validation(_))));
    }

    #[test]
    fn test_merge_reviewed_fields_none_when_nothing_to_write() {
        assert_eq!(merge_reviewed_fields(None, &ReviewedFields::default()), None);
    }
}
