//! Capability-set authorization.
//!
//! One function answers every "may this profile do that" question; role
//! checks do not live in handlers.

use database::models::{Profile, Role, Service};

/// Actions a profile can attempt through the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Load the queue and approve/reject documents.
    ReviewDocuments,
    /// Create/delete services and their classification children.
    ManageServices,
    /// Create collaborators and change their records.
    ManageCollaborators,
    /// Allocate or deallocate staff to services.
    AllocateStaff,
    /// Send system invites.
    InviteUsers,
    /// Read the expense reports.
    ViewReports,
}

/// Whether a profile holds the capability for an action.
pub fn can(profile: &Profile, action: Action) -> bool {
    match profile.role_kind() {
        Role::Admin | Role::Owner => true,
        Role::Manager => matches!(
            action,
            Action::ReviewDocuments | Action::AllocateStaff | Action::ViewReports
        ),
        Role::Driver => false,
    }
}

/// Whether a profile may review documents of a specific service.
///
/// Managers are restricted to services they manage; admin and owner see
/// the whole organization.
pub fn can_review_service(profile: &Profile, service: &Service) -> bool {
    match profile.role_kind() {
        Role::Admin | Role::Owner => true,
        Role::Manager => service.manager_id.as_deref() == Some(profile.id.as_str()),
        Role::Driver => false,
    }
}
