//! Document CRUD and lifecycle transitions.
//!
//! Documents are created externally (upload + OCR) in `review_needed`.
//! The only transitions are `review_needed → approved` and
//! `review_needed → rejected`; both are guarded in SQL so terminal states
//! stay immutable even under duplicate submits.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Document, QueueRow};

const DOCUMENT_COLUMNS: &str = "id, organization_id, status, file_url, file_type, \
     extracted_data, sender_name, sender_phone, profile_id, service_id, \
     cost_center_id, expense_type_id, total_centavos, rejection_reason, \
     approved_at, created_at";

/// Queue page size.
pub const QUEUE_LIMIT: i64 = 50;

/// Fields written when a reviewer approves a document.
#[derive(Debug, Clone, Default)]
pub struct ApprovalUpdate<'a> {
    /// Resolved responsible collaborator, when identified.
    pub profile_id: Option<&'a str>,
    /// Classified service; required.
    pub service_id: &'a str,
    pub cost_center_id: Option<&'a str>,
    pub expense_type_id: Option<&'a str>,
    /// Reviewer-confirmed amount in centavos.
    pub total_centavos: Option<i64>,
    /// Extracted data with reviewer overrides merged in, as JSON text.
    pub extracted_data: Option<&'a str>,
}

/// Insert a document (normally done by the external capture pipeline).
pub async fn create_document(pool: &SqlitePool, doc: &Document) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO documents (id, organization_id, status, file_url, file_type,
                               extracted_data, sender_name, sender_phone,
                               profile_id, service_id, cost_center_id,
                               expense_type_id, total_centavos)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&doc.id)
    .bind(&doc.organization_id)
    .bind(&doc.status)
    .bind(&doc.file_url)
    .bind(&doc.file_type)
    .bind(&doc.extracted_data)
    .bind(&doc.sender_name)
    .bind(&doc.sender_phone)
    .bind(&doc.profile_id)
    .bind(&doc.service_id)
    .bind(&doc.cost_center_id)
    .bind(&doc.expense_type_id)
    .bind(doc.total_centavos)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Document",
                    id: doc.id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a document by ID.
pub async fn get_document(pool: &SqlitePool, id: &str) -> Result<Document> {
    sqlx::query_as::<_, Document>(&format!(
        r#"
        SELECT {DOCUMENT_COLUMNS}
        FROM documents
        WHERE id = ?
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Document",
        id: id.to_string(),
    })
}

/// Documents in a status, oldest first, joined with sender and service
/// display fields.
///
/// `service_ids` restricts the result to those services (role scoping for
/// managers). An empty restriction yields no rows and issues no query;
/// SQLite has no empty `IN ()`.
pub async fn list_queue(
    pool: &SqlitePool,
    organization_id: &str,
    status: &str,
    service_ids: Option<&[String]>,
) -> Result<Vec<QueueRow>> {
    let base = r#"
        SELECT d.id, d.status, d.file_url, d.file_type, d.extracted_data,
               d.sender_name, d.sender_phone, d.profile_id, d.service_id,
               d.created_at,
               p.full_name AS profile_full_name,
               p.whatsapp_number AS profile_whatsapp,
               s.name AS service_name
        FROM documents d
        LEFT JOIN profiles p ON p.id = d.profile_id
        LEFT JOIN services s ON s.id = d.service_id
        WHERE d.organization_id = ? AND d.status = ?
        "#;

    let rows = match service_ids {
        None => {
            sqlx::query_as::<_, QueueRow>(&format!(
                "{base} ORDER BY d.created_at LIMIT {QUEUE_LIMIT}"
            ))
            .bind(organization_id)
            .bind(status)
            .fetch_all(pool)
            .await?
        }
        Some([]) => return Ok(Vec::new()),
        Some(ids) => {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!(
                "{base} AND d.service_id IN ({placeholders}) \
                 ORDER BY d.created_at LIMIT {QUEUE_LIMIT}"
            );
            let mut query = sqlx::query_as::<_, QueueRow>(&sql)
                .bind(organization_id)
                .bind(status);
            for id in ids {
                query = query.bind(id);
            }
            query.fetch_all(pool).await?
        }
    };

    Ok(rows)
}

/// Approve a document, classifying it.
///
/// Requires a service and at least one child classification (cost center
/// or expense type); the guard lives here so the rule holds even for
/// callers that bypass the review layer.
pub async fn approve(pool: &SqlitePool, id: &str, update: &ApprovalUpdate<'_>) -> Result<()> {
    if update.service_id.is_empty() {
        return Err(DatabaseError::Constraint(
            "approval requires a service",
        ));
    }
    if update.cost_center_id.is_none() && update.expense_type_id.is_none() {
        return Err(DatabaseError::Constraint(
            "approval requires a cost center or an expense type",
        ));
    }

    let result = sqlx::query(
        r#"
        UPDATE documents
        SET status = 'approved',
            profile_id = COALESCE(?, profile_id),
            service_id = ?,
            cost_center_id = ?,
            expense_type_id = ?,
            total_centavos = COALESCE(?, total_centavos),
            extracted_data = COALESCE(?, extracted_data),
            approved_at = datetime('now')
        WHERE id = ? AND status = 'review_needed'
        "#,
    )
    .bind(update.profile_id)
    .bind(update.service_id)
    .bind(update.cost_center_id)
    .bind(update.expense_type_id)
    .bind(update.total_centavos)
    .bind(update.extracted_data)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(transition_failure(pool, id).await);
    }

    Ok(())
}

/// Reject a document with a reason.
pub async fn reject(pool: &SqlitePool, id: &str, reason: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE documents
        SET status = 'rejected',
            rejection_reason = ?
        WHERE id = ? AND status = 'review_needed'
        "#,
    )
    .bind(reason)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(transition_failure(pool, id).await);
    }

    Ok(())
}

/// Distinguish "document missing" from "document already left review".
async fn transition_failure(pool: &SqlitePool, id: &str) -> DatabaseError {
    match get_document(pool, id).await {
        Ok(_) => DatabaseError::InvalidState {
            entity: "Document",
            id: id.to_string(),
            expected: "review_needed",
        },
        Err(err) => err,
    }
}

/// Document counts per status for an organization.
pub async fn count_by_status(
    pool: &SqlitePool,
    organization_id: &str,
) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT status, COUNT(*) as count
        FROM documents
        WHERE organization_id = ?
        GROUP BY status
        ORDER BY count DESC
        "#,
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Pending (review_needed) document counts per service name.
pub async fn pending_counts_by_service(
    pool: &SqlitePool,
    organization_id: &str,
) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT COALESCE(s.name, 'Sem obra') as service_name, COUNT(*) as count
        FROM documents d
        LEFT JOIN services s ON s.id = d.service_id
        WHERE d.organization_id = ? AND d.status = 'review_needed'
        GROUP BY s.name
        ORDER BY count DESC
        "#,
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
