//! Per-reviewer session state.
//!
//! A `ReviewSession` bundles the authenticated profile with its queue
//! state, so web handlers receive one explicit object instead of reading
//! ambient globals. Lifecycle: created after provisioning, used for the
//! session's lifetime, dropped on logout.

use database::models::Profile;
use sqlx::SqlitePool;

use crate::dispatch::{self, Confirmation, ReviewedFields};
use crate::classifier::ApprovalSpec;
use crate::error::Result;
use crate::queue::{self, QueueEntry, QueueState};

/// One reviewer's working state.
#[derive(Debug)]
pub struct ReviewSession {
    profile: Profile,
    queue: QueueState,
}

impl ReviewSession {
    /// Open a session for a provisioned profile.
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            queue: QueueState::new(),
        }
    }

    /// The acting profile.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Current queue entries.
    pub fn entries(&self) -> &[QueueEntry] {
        self.queue.entries()
    }

    /// Whether the optimistic state is waiting for reconciliation.
    pub fn needs_refresh(&self) -> bool {
        self.queue.needs_refresh()
    }

    /// Reload the queue for a status filter.
    ///
    /// Token discipline makes this safe against overlapping reloads: only
    /// the most recently started load lands.
    pub async fn refresh_queue(
        &mut self,
        pool: &SqlitePool,
        status: &str,
    ) -> Result<Vec<QueueEntry>> {
        let token = self.queue.begin_load();
        let entries = queue::load_queue(pool, &self.profile, status).await?;
        self.queue.complete_load(token, entries.clone());
        Ok(entries)
    }

    /// Approve a document; see [`dispatch::approve_document`].
    pub async fn approve(
        &mut self,
        pool: &SqlitePool,
        document_id: &str,
        spec: &ApprovalSpec,
        responsible_profile_id: Option<&str>,
        reviewed: &ReviewedFields,
    ) -> Result<Confirmation> {
        dispatch::approve_document(
            pool,
            &mut self.queue,
            &self.profile,
            document_id,
            spec,
            responsible_profile_id,
            reviewed,
        )
        .await
    }

    /// Reject a document; see [`dispatch::reject_document`].
    pub async fn reject(
        &mut self,
        pool: &SqlitePool,
        document_id: &str,
        reason: &str,
    ) -> Result<Confirmation> {
        dispatch::reject_document(pool, &mut self.queue, &self.profile, document_id, reason).await
    }
}
