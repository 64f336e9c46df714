//! Typed access to OCR-extracted document data.
//!
//! The capture pipeline attaches a loosely structured JSON payload to each
//! document. This crate turns that payload into an ordered list of tagged
//! extraction candidates with a pure lookup, replacing ad hoc key guessing
//! at the call sites, and handles Brazilian-real amounts for display.
//!
//! # Example
//!
//! ```
//! use extraction::{Extraction, FieldKind};
//!
//! let payload = serde_json::json!({ "total": "150,00" });
//! let extraction = Extraction::from_json(&payload);
//! assert_eq!(extraction.display(FieldKind::Total).as_deref(), Some("R$ 150,00"));
//! ```

pub mod candidate;
pub mod money;

pub use candidate::{Candidate, Confidence, Extraction, FieldKind};
pub use money::{format_brl, parse_brl, parse_brl_value};
