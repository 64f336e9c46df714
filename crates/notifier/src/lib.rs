//! Outbound webhook notifications.
//!
//! Downstream automation (e-mail/WhatsApp delivery) listens on a single
//! webhook URL. This crate posts typed notices there and reports what
//! happened; delivery failure is never fatal to the action that
//! triggered the notice. Callers log the status and move on.
//!
//! # Example
//!
//! ```no_run
//! use notifier::{Notice, Notifier};
//!
//! # async fn example() {
//! let notifier = Notifier::new(Some("https://hooks.example/invite".to_string()));
//! let status = notifier
//!     .send(&Notice::AllocationInvite {
//!         profile_id: "p1".to_string(),
//!         service_id: "s1".to_string(),
//!         email: String::new(),
//!         full_name: "João".to_string(),
//!         whatsapp: "5511999990001".to_string(),
//!         service_name: "Obra Centro".to_string(),
//!         date_time: "2026-08-10T07:00:00Z".to_string(),
//!         organization_id: Some("org-1".to_string()),
//!         invited_by: "adm-1".to_string(),
//!         invited_by_name: "Ana".to_string(),
//!     })
//!     .await;
//! tracing::info!(status = %status.as_str(), "Allocation notice");
//! # }
//! ```

use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

/// A notice for the downstream automation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    /// A system access invite was generated.
    #[serde(rename_all = "camelCase")]
    SystemInvite {
        email: String,
        full_name: String,
        role: String,
        invite_link: String,
        #[serde(rename = "organization_id")]
        organization_id: Option<String>,
        invited_by: String,
        invited_by_name: String,
    },
    /// A collaborator was allocated to a service.
    #[serde(rename_all = "camelCase")]
    AllocationInvite {
        #[serde(rename = "profile_id")]
        profile_id: String,
        #[serde(rename = "service_id")]
        service_id: String,
        email: String,
        full_name: String,
        whatsapp: String,
        service_name: String,
        date_time: String,
        #[serde(rename = "organization_id")]
        organization_id: Option<String>,
        invited_by: String,
        invited_by_name: String,
    },
}

/// Outcome of a delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The webhook accepted the notice.
    Delivered,
    /// The webhook answered with a non-success status.
    Failed(u16),
    /// The request never completed.
    NetworkError(String),
    /// No webhook URL is configured.
    NotConfigured,
}

impl DeliveryStatus {
    /// Compact form reported back to API callers.
    pub fn as_str(&self) -> String {
        match self {
            DeliveryStatus::Delivered => "success".to_string(),
            DeliveryStatus::Failed(code) => format!("failed_{code}"),
            DeliveryStatus::NetworkError(_) => "network_error".to_string(),
            DeliveryStatus::NotConfigured => "not_configured".to_string(),
        }
    }

    /// Whether the notice reached the webhook.
    pub fn is_delivered(&self) -> bool {
        *self == DeliveryStatus::Delivered
    }
}

/// Webhook client.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    /// Create a notifier. `None` disables delivery (every send reports
    /// `NotConfigured`).
    pub fn new(webhook_url: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        if webhook_url.is_none() {
            warn!("No notification webhook configured; notices will be dropped");
        }

        Self { http, webhook_url }
    }

    /// Post a notice to the webhook.
    pub async fn send(&self, notice: &Notice) -> DeliveryStatus {
        let Some(url) = self.webhook_url.as_deref() else {
            return DeliveryStatus::NotConfigured;
        };

        match self.http.post(url).json(notice).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(url = %url, "Notice delivered");
                DeliveryStatus::Delivered
            }
            Ok(resp) => {
                let code = resp.status().as_u16();
                error!(url = %url, code, "Webhook refused notice");
                DeliveryStatus::Failed(code)
            }
            Err(err) => {
                error!(url = %url, error = %err, "Webhook unreachable");
                DeliveryStatus::NetworkError(err.to_string())
            }
        }
    }
}
