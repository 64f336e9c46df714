//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::Arc;

use database::models::Profile;
use database::Database;
use notifier::Notifier;
use review::ReviewSession;
use tokio::sync::Mutex;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Webhook client for allocation notices.
    pub notifier: Notifier,
    /// One review session per authenticated user.
    sessions: Arc<Mutex<HashMap<String, Arc<Mutex<ReviewSession>>>>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, notifier: Notifier) -> Self {
        Self {
            db,
            notifier,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The review session for a profile, created on first use.
    ///
    /// Two-level locking keeps one slow reviewer from serializing
    /// everyone else's requests.
    pub async fn session(&self, profile: &Profile) -> Arc<Mutex<ReviewSession>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(profile.id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(ReviewSession::new(profile.clone()))))
            .clone()
    }

    /// Drop a user's session (logout).
    pub async fn dispose_session(&self, profile_id: &str) {
        self.sessions.lock().await.remove(profile_id);
    }
}
