//! Request identity.
//!
//! Authentication itself is external: a proxy validates the session and
//! forwards the verified user in `x-auth-user-id` / `x-auth-user-name`.
//! This module reads those headers and provisions the profile, so every
//! handler receives an explicit, healed `Profile`.

use axum::http::HeaderMap;
use database::models::Profile;
use review::provision;
use review::Identity;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Header carrying the verified user id.
pub const USER_ID_HEADER: &str = "x-auth-user-id";
/// Header carrying the user's display name (optional).
pub const USER_NAME_HEADER: &str = "x-auth-user-name";

/// Parse the verified identity from the trusted headers, if present.
pub fn identity_from_headers(headers: &HeaderMap) -> Option<Identity> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())?;

    let display_name = headers
        .get(USER_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    Some(Identity {
        user_id: user_id.to_string(),
        display_name,
    })
}

/// The acting profile for a request, or an auth error.
pub async fn require_profile(state: &AppState, headers: &HeaderMap) -> Result<Profile> {
    let identity = identity_from_headers(headers).ok_or(AppError::Unauthorized)?;

    provision::ensure_profile(state.db.pool(), &identity)
        .await
        .ok_or(AppError::ProvisioningFailed)
}

/// The acting profile for HTML pages: `None` renders the locked state
/// instead of failing the request.
pub async fn optional_profile(state: &AppState, headers: &HeaderMap) -> Option<Profile> {
    let identity = identity_from_headers(headers)?;
    provision::ensure_profile(state.db.pool(), &identity).await
}

/// The organization the profile acts within.
pub fn organization_of(profile: &Profile) -> Result<String> {
    profile
        .organization_id
        .clone()
        .ok_or(AppError::ProvisioningFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_identity_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("u1"));
        headers.insert(USER_NAME_HEADER, HeaderValue::from_static("Maria"));

        let identity = identity_from_headers(&headers).unwrap();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.display_name.as_deref(), Some("Maria"));
    }

    #[test]
    fn test_missing_or_blank_id_is_anonymous() {
        assert!(identity_from_headers(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert!(identity_from_headers(&headers).is_none());
    }
}
