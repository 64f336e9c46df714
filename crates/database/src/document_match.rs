//! Lookup against the precomputed document→profile match view.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::DocumentMatch;

/// Proposed profile for a document, if the view has one.
///
/// At most one candidate is ever accepted; extra rows are ignored.
pub async fn find_match(pool: &SqlitePool, document_id: &str) -> Result<Option<DocumentMatch>> {
    let m = sqlx::query_as::<_, DocumentMatch>(
        r#"
        SELECT document_id, profile_id, full_name
        FROM view_document_matches
        WHERE document_id = ?
        LIMIT 1
        "#,
    )
    .bind(document_id)
    .fetch_optional(pool)
    .await?;

    Ok(m)
}
