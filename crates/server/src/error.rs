//! Unified error handling for the proxy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::shopify::SessionTokenError;

/// Auth-stage failures, the only ones that produce a non-200 status.
///
/// Exchange and query failures are reported inside the response envelope
/// instead, so the four pipeline outcomes stay independently visible to
/// the caller.
#[derive(Debug, Error)]
pub enum AppError {
    /// No bearer token in the Authorization header.
    #[error("Unauthorized")]
    MissingToken,

    /// Session token failed verification.
    #[error("Invalid token")]
    InvalidToken(#[source] SessionTokenError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken(_) => StatusCode::FORBIDDEN,
        };

        if let Self::InvalidToken(source) = &self {
            tracing::warn!(error = %source, "session token rejected");
        }

        // Terse plain-text bodies; nothing about the failure leaks out
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_token_error() -> AppError {
        // Force a real verification failure to wrap
        let err = crate::shopify::verify_session_token(
            "not-a-jwt",
            &secrecy::SecretString::from("secret"),
        )
        .expect_err("garbage token must fail");
        AppError::InvalidToken(err)
    }

    #[test]
    fn test_missing_token_is_401() {
        let response = AppError::MissingToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_invalid_token_is_403() {
        let response = invalid_token_error().into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_display_is_terse() {
        assert_eq!(AppError::MissingToken.to_string(), "Unauthorized");
        assert_eq!(invalid_token_error().to_string(), "Invalid token");
    }
}
