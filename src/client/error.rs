//! Catalog request errors

use thiserror::Error;

/// Outcome of a failed catalog request, classified by status
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 401: the bearer token is invalid or expired; the caller should log out
    #[error("access token is invalid or expired")]
    AuthExpired,
    /// 403
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },
    /// Any other non-2xx status
    #[error("catalog service error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("network failure: {0}")]
    Network(String),
    /// 2xx with a body that does not match the expected shape
    #[error("invalid response body: {0}")]
    InvalidResponse(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The initiating scope went away before the response arrived
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ApiError::PermissionDenied { .. })
    }

    /// HTTP status behind the error, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthExpired => Some(401),
            ApiError::PermissionDenied { .. } => Some(403),
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
