//! Document review and classification workflow for CasaEmOrdem.
//!
//! This crate holds the back-office's core logic, independent of any web
//! surface: establishing who the reviewer is (and healing broken
//! profiles), loading the role-scoped document queue, proposing a sender
//! match, walking the cascading classification state machine, and
//! dispatching the resulting mutations with optimistic local-state
//! updates.
//!
//! Everything takes the acting profile explicitly; there is no ambient
//! session state.

pub mod authz;
pub mod classifier;
pub mod dispatch;
pub mod error;
pub mod matcher;
pub mod provision;
pub mod queue;
pub mod session;

pub use authz::{can, can_review_service, Action};
pub use classifier::{Classification, Classifier, ClassifierState, ClassificationOptions};
pub use dispatch::{Confirmation, ReviewedFields};
pub use error::{ReviewError, Result};
pub use provision::Identity;
pub use queue::{QueueEntry, QueueState};
pub use session::ReviewSession;
