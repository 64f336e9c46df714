//! Audit queue routes: queue listing, document detail, auto-match,
//! approve, reject.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use review::{classifier, matcher, Classification, Classifier, QueueEntry, ReviewedFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use database::models::DocumentStatus;
use extraction::{Extraction, FieldKind};

use crate::error::{AppError, Result};
use crate::identity;
use crate::state::AppState;

/// Audit queue page template.
#[derive(Template)]
#[template(path = "audit.html")]
pub struct AuditTemplate {
    pub locked: bool,
    pub entries: Vec<QueueEntry>,
}

/// Queue listing filter.
#[derive(Debug, Deserialize)]
pub struct QueueFilter {
    /// Document status; defaults to `review_needed`.
    pub status: Option<String>,
}

/// Document detail for the review pane.
#[derive(Serialize)]
pub struct DocumentDetail {
    pub id: String,
    pub status: String,
    pub file_url: String,
    pub file_type: String,
    pub sender_name: Option<String>,
    pub sender_phone: Option<String>,
    pub profile_id: Option<String>,
    pub service_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub low_confidence: bool,
    /// Display-ready extracted fields.
    pub fields: ExtractedFields,
    /// The full raw payload, for the "ver JSON completo" toggle.
    pub extracted_data: Option<Value>,
}

/// Extracted fields formatted for display.
#[derive(Serialize)]
pub struct ExtractedFields {
    /// `R$ 150,00`, never a raw string when parseable.
    pub total: Option<String>,
    pub issued_at: Option<String>,
    pub phone: Option<String>,
    pub vendor: Option<String>,
    pub tax_id: Option<String>,
}

/// Approval request body.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub service_id: String,
    pub cost_center_id: Option<String>,
    pub expense_type_id: Option<String>,
    /// Responsible collaborator confirmed by the reviewer.
    pub profile_id: Option<String>,
    /// Reviewer corrections merged into the extracted data.
    #[serde(default)]
    pub reviewed: ReviewedFields,
}

/// Rejection request body.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// Mutation confirmation.
#[derive(Serialize)]
pub struct ActionResponse {
    pub message: String,
}

/// Render the audit queue page.
pub async fn audit_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<AuditTemplate> {
    let Some(profile) = identity::optional_profile(&state, &headers).await else {
        return Ok(AuditTemplate {
            locked: true,
            entries: Vec::new(),
        });
    };

    let session = state.session(&profile).await;
    let mut session = session.lock().await;
    let entries = session
        .refresh_queue(state.db.pool(), DocumentStatus::ReviewNeeded.as_str())
        .await?;

    Ok(AuditTemplate {
        locked: false,
        entries,
    })
}

/// Role-scoped queue listing as JSON.
pub async fn queue_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<QueueFilter>,
) -> Result<Json<Vec<QueueEntry>>> {
    let profile = identity::require_profile(&state, &headers).await?;
    let status = parse_status(filter.status.as_deref())?;

    let session = state.session(&profile).await;
    let mut session = session.lock().await;
    let entries = session.refresh_queue(state.db.pool(), status.as_str()).await?;

    Ok(Json(entries))
}

/// Document detail with display-ready extraction.
pub async fn document_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DocumentDetail>> {
    let profile = identity::require_profile(&state, &headers).await?;
    let organization_id = identity::organization_of(&profile)?;

    let document = database::document::get_document(state.db.pool(), &id).await?;
    if document.organization_id != organization_id {
        return Err(AppError::Database(database::DatabaseError::NotFound {
            entity: "Document",
            id,
        }));
    }

    let extracted = document.extracted_json();
    let extraction = extracted.as_ref().map(Extraction::from_json).unwrap_or_default();

    Ok(Json(DocumentDetail {
        id: document.id,
        status: document.status,
        file_url: document.file_url,
        file_type: document.file_type,
        sender_name: document.sender_name,
        sender_phone: document.sender_phone,
        profile_id: document.profile_id,
        service_id: document.service_id,
        rejection_reason: document.rejection_reason,
        low_confidence: extraction.is_low_confidence(),
        fields: ExtractedFields {
            total: extraction.display(FieldKind::Total),
            issued_at: extraction.display(FieldKind::IssuedAt),
            phone: extraction.display(FieldKind::Phone),
            vendor: extraction.display(FieldKind::Vendor),
            tax_id: extraction.display(FieldKind::TaxId),
        },
        extracted_data: extracted,
    }))
}

/// Auto-match proposal for a document's sender.
pub async fn match_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Option<matcher::MatchProposal>>> {
    let profile = identity::require_profile(&state, &headers).await?;
    let organization_id = identity::organization_of(&profile)?;

    let document = database::document::get_document(state.db.pool(), &id).await?;
    if document.organization_id != organization_id {
        return Err(AppError::Database(database::DatabaseError::NotFound {
            entity: "Document",
            id,
        }));
    }

    let proposal = matcher::propose_profile(state.db.pool(), &document).await?;
    Ok(Json(proposal))
}

/// Approve a document under a full classification.
///
/// The classifier is rebuilt from the submitted selection, so the
/// service→child consistency rules hold regardless of what the client
/// sent.
pub async fn approve_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<ApproveRequest>,
) -> Result<Json<ActionResponse>> {
    let profile = identity::require_profile(&state, &headers).await?;
    let organization_id = identity::organization_of(&profile)?;

    let service =
        database::service::get_service(state.db.pool(), &request.service_id).await?;
    if service.organization_id != organization_id {
        return Err(AppError::Database(database::DatabaseError::NotFound {
            entity: "Service",
            id: request.service_id,
        }));
    }

    let options = classifier::load_options(state.db.pool(), &service.id).await?;
    let mut classifier = Classifier::new();
    classifier.select_service(service, options);

    if let Some(cost_center_id) = request.cost_center_id {
        classifier.classify(Classification::CostCenter(cost_center_id))?;
    } else if let Some(expense_type_id) = request.expense_type_id {
        classifier.classify(Classification::ExpenseType(expense_type_id))?;
    }

    // Unclassified submissions fail here with an invalid transition.
    let spec = classifier.approval()?;

    let session = state.session(&profile).await;
    let mut session = session.lock().await;
    let confirmation = session
        .approve(
            state.db.pool(),
            &id,
            &spec,
            request.profile_id.as_deref(),
            &request.reviewed,
        )
        .await?;

    Ok(Json(ActionResponse {
        message: confirmation.message,
    }))
}

/// Reject a document with a mandatory reason.
pub async fn reject_api(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<ActionResponse>> {
    let profile = identity::require_profile(&state, &headers).await?;

    let session = state.session(&profile).await;
    let mut session = session.lock().await;
    let confirmation = session
        .reject(state.db.pool(), &id, &request.reason)
        .await?;

    Ok(Json(ActionResponse {
        message: confirmation.message,
    }))
}

fn parse_status(raw: Option<&str>) -> Result<DocumentStatus> {
    match raw {
        None => Ok(DocumentStatus::ReviewNeeded),
        Some(s) => DocumentStatus::parse(s)
            .ok_or_else(|| AppError::BadRequest(format!("unknown document status '{s}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(None).unwrap(), DocumentStatus::ReviewNeeded);
        assert_eq!(
            parse_status(Some("approved")).unwrap(),
            DocumentStatus::Approved
        );
        assert!(parse_status(Some("archived")).is_err());
    }
}
