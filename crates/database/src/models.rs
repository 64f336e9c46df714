//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Access roles, ordered roughly by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Company owner; same capabilities as admin.
    Owner,
    /// Sees and reviews only the services they manage.
    Manager,
    /// Field collaborator; no back-office access.
    Driver,
}

impl Role {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Owner => "owner",
            Role::Manager => "manager",
            Role::Driver => "driver",
        }
    }

    /// Parse a stored role value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "owner" => Some(Role::Owner),
            "manager" => Some(Role::Manager),
            "driver" => Some(Role::Driver),
            _ => None,
        }
    }
}

/// Document lifecycle states. `approved` and `rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Waiting for an auditor.
    ReviewNeeded,
    /// Still being processed by the capture pipeline.
    Processing,
    /// Classified and accepted.
    Approved,
    /// Refused with a reason.
    Rejected,
}

impl DocumentStatus {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::ReviewNeeded => "review_needed",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
        }
    }

    /// Parse a stored status value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "review_needed" => Some(DocumentStatus::ReviewNeeded),
            "processing" => Some(DocumentStatus::Processing),
            "approved" => Some(DocumentStatus::Approved),
            "rejected" => Some(DocumentStatus::Rejected),
            _ => None,
        }
    }
}

/// Allocation invite lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationStatus {
    Pending,
    Accepted,
    Rejected,
    Uncertain,
}

impl AllocationStatus {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Pending => "pending",
            AllocationStatus::Accepted => "accepted",
            AllocationStatus::Rejected => "rejected",
            AllocationStatus::Uncertain => "uncertain",
        }
    }

    /// Parse a stored status value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AllocationStatus::Pending),
            "accepted" => Some(AllocationStatus::Accepted),
            "rejected" => Some(AllocationStatus::Rejected),
            "uncertain" => Some(AllocationStatus::Uncertain),
            _ => None,
        }
    }
}

/// A tenant. Every other entity chains back to exactly one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// URL-safe identifier derived from the name.
    pub slug: String,
    pub cnpj: Option<String>,
    pub size_range: Option<String>,
    pub owner_id: Option<String>,
    pub created_at: String,
}

/// A person record, with or without system login access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    /// Missing only on broken rows; the provisioner heals these.
    pub organization_id: Option<String>,
    pub full_name: String,
    pub email: Option<String>,
    /// One of `admin|owner|manager|driver`.
    pub role: String,
    pub whatsapp_number: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl Profile {
    /// Typed role; unknown values degrade to the least-privileged role.
    pub fn role_kind(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::Driver)
    }
}

/// A jobsite/contract; top-level classification unit for expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub is_active: bool,
    /// When set, restricts this service to the given manager.
    pub manager_id: Option<String>,
    pub created_at: String,
}

/// A budget sub-category within a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CostCenter {
    pub id: String,
    pub organization_id: String,
    pub service_id: String,
    pub name: String,
    pub code: Option<String>,
    pub created_at: String,
}

/// A work item within a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub organization_id: String,
    pub service_id: String,
    pub title: String,
    pub status: String,
    pub created_at: String,
}

/// A global expense category, enabled per service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ExpenseType {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub created_at: String,
}

/// A staff-to-service assignment with an invite lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Allocation {
    pub profile_id: String,
    pub service_id: String,
    /// One of `pending|accepted|rejected|uncertain`.
    pub status: String,
    pub scheduled_at: Option<String>,
    pub created_at: String,
}

/// An expense document captured externally (upload + OCR).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: String,
    pub organization_id: String,
    /// One of `review_needed|processing|approved|rejected`.
    pub status: String,
    pub file_url: String,
    pub file_type: String,
    /// Raw OCR payload as JSON text.
    pub extracted_data: Option<String>,
    /// Fallback identity when no profile is linked.
    pub sender_name: Option<String>,
    pub sender_phone: Option<String>,
    pub profile_id: Option<String>,
    pub service_id: Option<String>,
    pub cost_center_id: Option<String>,
    pub expense_type_id: Option<String>,
    /// Reviewer-confirmed amount, stamped at approval.
    pub total_centavos: Option<i64>,
    pub rejection_reason: Option<String>,
    pub approved_at: Option<String>,
    pub created_at: String,
}

impl Document {
    /// Parse the stored OCR payload, if any.
    pub fn extracted_json(&self) -> Option<serde_json::Value> {
        self.extracted_data
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// A document joined with sender and service display fields, as shown in
/// the review queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct QueueRow {
    pub id: String,
    pub status: String,
    pub file_url: String,
    pub file_type: String,
    pub extracted_data: Option<String>,
    pub sender_name: Option<String>,
    pub sender_phone: Option<String>,
    pub profile_id: Option<String>,
    pub service_id: Option<String>,
    pub created_at: String,
    /// Linked profile's name, when resolved.
    pub profile_full_name: Option<String>,
    pub profile_whatsapp: Option<String>,
    /// Linked service's name, when classified.
    pub service_name: Option<String>,
}

/// A row of the precomputed document→profile match view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DocumentMatch {
    pub document_id: String,
    pub profile_id: String,
    pub full_name: String,
}

/// A recorded system invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct InviteRecord {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub organization_id: Option<String>,
    pub invite_link: String,
    /// One of `pending|sent`.
    pub status: String,
    pub created_at: String,
}

/// One aggregated row of `view_expenses_summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ExpensesSummaryRow {
    pub service_name: String,
    pub cost_center_name: Option<String>,
    /// Total approved spend, in centavos.
    pub total_spent: i64,
    pub month_year: Option<String>,
}
