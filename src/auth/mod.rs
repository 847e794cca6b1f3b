//! Authentication and actor resolution.
//!
//! The PSK layer gates the whole API. Inside it, each request resolves to an
//! [`Actor`] that handlers check against the capability an operation needs.
//! Key comparisons are constant-time to mitigate timing attacks.

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{codes, AppError, AppErrorWithRevision, ErrorDetails, ErrorResponse};
use crate::AppState;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Header carrying the admin key.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";
/// Header naming the staff member making the request.
pub const STAFF_ID_HEADER: &str = "x-staff-id";

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    // Get the API key from the request header
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match provided {
        Some(provided_key) => {
            if constant_time_compare(&provided_key, &expected) {
                next.run(request).await
            } else {
                unauthorized_response("Invalid API key")
            }
        }
        None => {
            // Also check Authorization header as bearer token
            let bearer = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|s| s.to_string());

            match bearer {
                Some(bearer_key) if constant_time_compare(&bearer_key, &expected) => {
                    next.run(request).await
                }
                _ => unauthorized_response("Missing or invalid API key"),
            }
        }
    }
}

/// Who is making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Admin,
    Staff(String),
}

/// What an operation requires of its actor.
#[derive(Debug, Clone, Copy)]
pub enum Capability<'a> {
    /// Only an admin
    Admin,
    /// An admin, or the staff member the operation targets
    AdminOrSelf(&'a str),
}

impl Actor {
    pub fn staff_id(&self) -> Option<&str> {
        match self {
            Actor::Admin => None,
            Actor::Staff(id) => Some(id),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin)
    }

    /// Check the actor holds a capability.
    pub fn require(&self, capability: Capability<'_>) -> Result<(), AppError> {
        match (self, capability) {
            (Actor::Admin, _) => Ok(()),
            (Actor::Staff(id), Capability::AdminOrSelf(target)) if id == target => Ok(()),
            (Actor::Staff(_), Capability::AdminOrSelf(_)) => Err(AppError::Forbidden(
                "Staff may only change their own record".to_string(),
            )),
            (Actor::Staff(_), Capability::Admin) => {
                Err(AppError::Forbidden("Admin access required".to_string()))
            }
        }
    }
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = AppErrorWithRevision;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let admin_header = header_value(ADMIN_KEY_HEADER);
        let staff_header = header_value(STAFF_ID_HEADER);

        if let (Some(provided), Some(expected)) = (&admin_header, &state.config.admin_key) {
            if constant_time_compare(provided, expected) {
                return Ok(Actor::Admin);
            }
            return Err(AppError::Unauthorized("Invalid admin key".to_string()).into());
        }

        if let Some(staff_id) = staff_header {
            return match state.repo.get_staff(&staff_id).await {
                Ok(Some(_)) => Ok(Actor::Staff(staff_id)),
                Ok(None) => Err(AppError::Unauthorized(format!(
                    "Unknown staff id {}",
                    staff_id
                ))
                .into()),
                Err(e) => Err(e.into()),
            };
        }

        // No admin key configured: everyone without a staff id acts as admin (dev mode)
        if state.config.admin_key.is_none() {
            return Ok(Actor::Admin);
        }

        Err(AppError::Unauthorized(format!(
            "Missing {} or {} header",
            ADMIN_KEY_HEADER, STAFF_ID_HEADER
        ))
        .into())
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    a_bytes.ct_eq(b_bytes).into()
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: codes::UNAUTHORIZED.to_string(),
            message: message.to_string(),
            details: None,
        },
        revision_id: 0,
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
    }

    #[test]
    fn test_constant_time_compare_empty() {
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("", "not-empty"));
    }

    #[test]
    fn test_admin_holds_every_capability() {
        assert!(Actor::Admin.require(Capability::Admin).is_ok());
        assert!(Actor::Admin.require(Capability::AdminOrSelf("s1")).is_ok());
    }

    #[test]
    fn test_staff_limited_to_self() {
        let actor = Actor::Staff("s1".to_string());
        assert!(actor.require(Capability::AdminOrSelf("s1")).is_ok());
        assert!(matches!(
            actor.require(Capability::AdminOrSelf("s2")),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            actor.require(Capability::Admin),
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(actor.staff_id(), Some("s1"));
        assert!(!actor.is_admin());
    }
}
