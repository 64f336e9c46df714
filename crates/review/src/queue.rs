//! Role-scoped document queue.
//!
//! Loading is asynchronous and can be superseded (rapid filter toggling);
//! `QueueState` hands out a generation token per load and drops results
//! that come back under a stale token, so the list always reflects the
//! last *request*, not the last response.

use database::models::{Profile, Role, QueueRow};
use extraction::{Extraction, FieldKind};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::Result;

/// One row of the review queue, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    pub id: String,
    pub status: String,
    pub file_url: String,
    pub file_type: String,
    /// Resolved profile name, falling back to the raw sender name.
    pub sender_display: String,
    pub sender_phone: Option<String>,
    pub profile_id: Option<String>,
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    /// Extracted total formatted as `R$ …`, when parseable.
    pub total_display: Option<String>,
    pub vendor_display: Option<String>,
    /// Whether the pipeline flagged the extraction as low confidence.
    pub low_confidence: bool,
    pub created_at: String,
}

impl QueueEntry {
    fn from_row(row: QueueRow) -> Self {
        let extraction = row
            .extracted_data
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .map(|json: serde_json::Value| Extraction::from_json(&json))
            .unwrap_or_default();

        let sender_display = row
            .profile_full_name
            .clone()
            .or_else(|| row.sender_name.clone())
            .unwrap_or_else(|| "Desconhecido".to_string());
        let sender_phone = row.profile_whatsapp.clone().or_else(|| row.sender_phone.clone());

        Self {
            id: row.id,
            status: row.status,
            file_url: row.file_url,
            file_type: row.file_type,
            sender_display,
            sender_phone,
            profile_id: row.profile_id,
            service_id: row.service_id,
            service_name: row.service_name,
            total_display: extraction.display(FieldKind::Total),
            vendor_display: extraction.display(FieldKind::Vendor),
            low_confidence: extraction.is_low_confidence(),
            created_at: row.created_at,
        }
    }
}

/// Load the queue for a viewer, applying role scoping.
///
/// Managers only see documents of services they manage; with zero managed
/// services the result is empty and no document query is issued. Drivers
/// have no review surface at all.
pub async fn load_queue(
    pool: &SqlitePool,
    viewer: &Profile,
    status: &str,
) -> Result<Vec<QueueEntry>> {
    let Some(organization_id) = viewer.organization_id.as_deref() else {
        return Ok(Vec::new());
    };

    let scope = match viewer.role_kind() {
        Role::Admin | Role::Owner => None,
        Role::Manager => {
            let managed =
                database::service::list_managed_service_ids(pool, &viewer.id).await?;
            if managed.is_empty() {
                debug!(viewer = %viewer.id, "Manager with no services, skipping queue query");
                return Ok(Vec::new());
            }
            Some(managed)
        }
        Role::Driver => return Ok(Vec::new()),
    };

    let rows =
        database::document::list_queue(pool, organization_id, status, scope.as_deref()).await?;

    Ok(rows.into_iter().map(QueueEntry::from_row).collect())
}

/// In-memory queue state with staleness guarding.
#[derive(Debug, Default)]
pub struct QueueState {
    generation: u64,
    entries: Vec<QueueEntry>,
    needs_refresh: bool,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load; the returned token must accompany the results.
    /// Starting a new load supersedes every outstanding one.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Install loaded entries if the token is still current.
    ///
    /// Returns `false` (and changes nothing) for superseded responses.
    pub fn complete_load(&mut self, token: u64, entries: Vec<QueueEntry>) -> bool {
        if token != self.generation {
            debug!(token, current = self.generation, "Dropping stale queue response");
            return false;
        }
        self.entries = entries;
        self.needs_refresh = false;
        true
    }

    /// Current entries.
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Optimistically remove an entry after a successful mutation and mark
    /// the state for a reconciling re-fetch.
    pub fn remove(&mut self, document_id: &str) {
        self.entries.retain(|e| e.id != document_id);
        self.needs_refresh = true;
    }

    /// Whether a background re-fetch should reconcile the optimistic
    /// patches.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }
}
