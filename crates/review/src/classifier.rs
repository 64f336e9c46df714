//! Cascading classification state machine.
//!
//! Service → cost center / expense type → approve. Selecting a service
//! invalidates any previously chosen child; a child must come from the
//! options installed for the current service. Approval is only reachable
//! with a service plus one child classification.

use database::models::{CostCenter, ExpenseType, Service};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{Result, ReviewError};

/// Child classification choices valid for a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationOptions {
    pub cost_centers: Vec<CostCenter>,
    pub expense_types: Vec<ExpenseType>,
}

impl ClassificationOptions {
    /// A service with nothing configured is a setup gap, not a license to
    /// approve unclassified documents.
    pub fn is_empty(&self) -> bool {
        self.cost_centers.is_empty() && self.expense_types.is_empty()
    }
}

/// Load the valid child options for a service: its cost centers plus the
/// expense types enabled for it.
pub async fn load_options(pool: &SqlitePool, service_id: &str) -> Result<ClassificationOptions> {
    let cost_centers =
        database::cost_center::list_cost_centers_for_service(pool, service_id).await?;
    let expense_types =
        database::expense_type::list_enabled_for_service(pool, service_id).await?;

    Ok(ClassificationOptions {
        cost_centers,
        expense_types,
    })
}

/// A chosen child classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    CostCenter(String),
    ExpenseType(String),
}

/// Observable classifier states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierState {
    NoServiceSelected,
    ServiceSelected,
    FullySpecified,
}

/// Everything approval needs from a fully specified classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalSpec {
    pub service_id: String,
    pub classification: Classification,
}

/// The cascading classifier for one document under review.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    service: Option<Service>,
    options: ClassificationOptions,
    selection: Option<Classification>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a service, installing its child options.
    ///
    /// Any previously selected child is cleared: it belonged to the old
    /// parent and is invalid under the new one.
    pub fn select_service(&mut self, service: Service, options: ClassificationOptions) {
        self.service = Some(service);
        self.options = options;
        self.selection = None;
    }

    /// Drop the service selection (and with it the child selection).
    pub fn clear_service(&mut self) {
        self.service = None;
        self.options = ClassificationOptions::default();
        self.selection = None;
    }

    /// Choose a child classification from the installed options.
    pub fn classify(&mut self, classification: Classification) -> Result<()> {
        if self.service.is_none() {
            return Err(ReviewError::InvalidTransition(
                "select a service before classifying",
            ));
        }
        if self.options.is_empty() {
            return Err(ReviewError::ClassificationGap);
        }

        let known = match &classification {
            Classification::CostCenter(id) => {
                self.options.cost_centers.iter().any(|cc| cc.id == *id)
            }
            Classification::ExpenseType(id) => {
                self.options.expense_types.iter().any(|et| et.id == *id)
            }
        };
        if !known {
            return Err(ReviewError::InvalidTransition(
                "classification is not among the service's options",
            ));
        }

        self.selection = Some(classification);
        Ok(())
    }

    /// Current state.
    pub fn state(&self) -> ClassifierState {
        match (&self.service, &self.selection) {
            (None, _) => ClassifierState::NoServiceSelected,
            (Some(_), None) => ClassifierState::ServiceSelected,
            (Some(_), Some(_)) => ClassifierState::FullySpecified,
        }
    }

    /// Whether the selected service has no child options configured.
    pub fn has_gap(&self) -> bool {
        self.service.is_some() && self.options.is_empty()
    }

    /// Approve is only enabled when fully specified.
    pub fn can_approve(&self) -> bool {
        self.state() == ClassifierState::FullySpecified
    }

    /// The approval payload; an error in any other state.
    pub fn approval(&self) -> Result<ApprovalSpec> {
        match (&self.service, &self.selection) {
            (Some(service), Some(selection)) => Ok(ApprovalSpec {
                service_id: service.id.clone(),
                classification: selection.clone(),
            }),
            _ => Err(ReviewError::InvalidTransition(
                "approval requires a service and a classification",
            )),
        }
    }

    pub fn service(&self) -> Option<&Service> {
        self.service.as_ref()
    }

    pub fn options(&self) -> &ClassificationOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(id: &str) -> Service {
        Service {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            name: format!("Obra {id}"),
            is_active: true,
            manager_id: None,
            created_at: String::new(),
        }
    }

    fn options(cc_ids: &[&str], et_ids: &[&str]) -> ClassificationOptions {
        ClassificationOptions {
            cost_centers: cc_ids
                .iter()
                .map(|id| CostCenter {
                    id: id.to_string(),
                    organization_id: "org-1".to_string(),
                    service_id: "s1".to_string(),
                    name: format!("CC {id}"),
                    code: None,
                    created_at: String::new(),
                })
                .collect(),
            expense_types: et_ids
                .iter()
                .map(|id| ExpenseType {
                    id: id.to_string(),
                    organization_id: "org-1".to_string(),
                    name: format!("ET {id}"),
                    created_at: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_approve_gated_on_full_specification() {
        let mut classifier = Classifier::new();
        assert_eq!(classifier.state(), ClassifierState::NoServiceSelected);
        assert!(!classifier.can_approve());
        assert!(classifier.approval().is_err());

        classifier.select_service(service("s1"), options(&["cc-1"], &[]));
        assert_eq!(classifier.state(), ClassifierState::ServiceSelected);
        assert!(!classifier.can_approve());

        classifier
            .classify(Classification::CostCenter("cc-1".to_string()))
            .unwrap();
        assert_eq!(classifier.state(), ClassifierState::FullySpecified);
        assert!(classifier.can_approve());

        let spec = classifier.approval().unwrap();
        assert_eq!(spec.service_id, "s1");
    }

    #[test]
    fn test_changing_service_clears_child() {
        let mut classifier = Classifier::new();
        classifier.select_service(service("s1"), options(&["cc-1"], &[]));
        classifier
            .classify(Classification::CostCenter("cc-1".to_string()))
            .unwrap();
        assert!(classifier.can_approve());

        // New parent: the old child no longer applies.
        classifier.select_service(service("s2"), options(&["cc-2"], &[]));
        assert_eq!(classifier.state(), ClassifierState::ServiceSelected);
        assert!(!classifier.can_approve());

        // And the old child id is not accepted under the new parent.
        let stale = classifier.classify(Classification::CostCenter("cc-1".to_string()));
        assert!(matches!(stale, Err(ReviewError::InvalidTransition(_))));
    }

    #[test]
    fn test_unknown_child_rejected() {
        let mut classifier = Classifier::new();
        classifier.select_service(service("s1"), options(&[], &["et-1"]));

        let bogus = classifier.classify(Classification::ExpenseType("et-9".to_string()));
        assert!(matches!(bogus, Err(ReviewError::InvalidTransition(_))));

        classifier
            .classify(Classification::ExpenseType("et-1".to_string()))
            .unwrap();
        assert!(classifier.can_approve());
    }

    #[test]
    fn test_zero_options_is_a_gap() {
        let mut classifier = Classifier::new();
        classifier.select_service(service("s1"), options(&[], &[]));
        assert!(classifier.has_gap());

        let result = classifier.classify(Classification::CostCenter("cc-1".to_string()));
        assert!(matches!(result, Err(ReviewError::ClassificationGap)));
        assert!(!classifier.can_approve());
    }

    #[test]
    fn test_classify_without_service() {
        let mut classifier = Classifier::new();
        let result = classifier.classify(Classification::CostCenter("cc-1".to_string()));
        assert!(matches!(result, Err(ReviewError::InvalidTransition(_))));
    }

    #[test]
    fn test_clear_service_resets() {
        let mut classifier = Classifier::new();
        classifier.select_service(service("s1"), options(&["cc-1"], &[]));
        classifier
            .classify(Classification::CostCenter("cc-1".to_string()))
            .unwrap();

        classifier.clear_service();
        assert_eq!(classifier.state(), ClassifierState::NoServiceSelected);
        assert!(classifier.options().is_empty());
    }
}
