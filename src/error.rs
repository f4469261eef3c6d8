// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent, displayable messages.

/// Application error type.
///
/// Every variant renders as a human-readable message suitable for showing
/// inline in the presentation layer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("Failed to verify permissions")]
    PermissionCheck,

    #[error("Only admins can update attendance")]
    PermissionDenied,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message used for backend 401 responses (expired or invalid JWT).
    pub const BACKEND_AUTH_ERROR: &'static str = "Authentication token rejected";

    /// Whether this error indicates the session's token was rejected.
    pub fn is_auth_error(&self) -> bool {
        match self {
            AppError::NotAuthenticated => true,
            AppError::Backend(msg) => {
                msg == Self::BACKEND_AUTH_ERROR
                    || msg.contains("JWT")
                    || msg.contains("invalid_grant")
            }
            _ => false,
        }
    }
}

/// Result type alias for store and backend operations
pub type Result<T> = std::result::Result<T, AppError>;
