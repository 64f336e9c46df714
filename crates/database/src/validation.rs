//! Input validation for records created through the back office.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Invalid WhatsApp number format.
    InvalidWhatsapp(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::InvalidWhatsapp(msg) => write!(f, "Invalid WhatsApp number: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for names and titles.
pub const MAX_NAME_LENGTH: usize = 120;

/// Maximum allowed length for free-text rejection reasons.
pub const MAX_REASON_LENGTH: usize = 500;

/// Validate an email address (basic RFC 5322 format check).
///
/// This is a basic validation that checks:
/// - Contains exactly one @
/// - Has at least one character before @
/// - Has at least one character after @
/// - Has at least one dot after @
/// - Is not too long
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if domain.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing domain (after @)".to_string(),
        ));
    }

    if !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(
            "domain cannot start or end with a dot".to_string(),
        ));
    }

    if domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain cannot contain consecutive dots".to_string(),
        ));
    }

    Ok(())
}

/// Validate a WhatsApp number.
///
/// Numbers are stored as dialable digits with country code
/// (e.g. `5511999998888`), optionally prefixed with `+`:
/// - 10 to 15 digits
/// - no separators or letters
pub fn validate_whatsapp(number: &str) -> Result<(), ValidationError> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::Empty("WhatsApp number".to_string()));
    }

    let digits = number.strip_prefix('+').unwrap_or(number);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidWhatsapp(
            "must contain only digits (optionally prefixed with +)".to_string(),
        ));
    }

    if digits.len() < 10 || digits.len() > 15 {
        return Err(ValidationError::InvalidWhatsapp(format!(
            "must have 10 to 15 digits, got {}",
            digits.len()
        )));
    }

    Ok(())
}

/// Validate a required name/title field.
pub fn validate_name(field: &str, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    if value.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
            actual: value.len(),
        });
    }

    Ok(())
}

/// Validate a rejection reason. Whitespace-only reasons are empty.
pub fn validate_rejection_reason(reason: &str) -> Result<(), ValidationError> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Empty("rejection reason".to_string()));
    }

    if reason.len() > MAX_REASON_LENGTH {
        return Err(ValidationError::TooLong {
            field: "rejection reason".to_string(),
            max: MAX_REASON_LENGTH,
            actual: reason.len(),
        });
    }

    Ok(())
}
