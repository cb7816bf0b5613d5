//! HTTP error mapping for the lobby server.
//!
//! Every failure is rendered as the game client's error body:
//!
//! ```json
//! {"errorCode": "...", "errorMessage": "...", "numericErrorCode": 1004, "status": 404}
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lobby_party::PartyError;
use lobby_profile::ProfileError;
use lobby_types::ErrorKind;

/// Errors surfaced by the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A profile command or read failed.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// A party operation failed.
    #[error(transparent)]
    Party(#[from] PartyError),

    /// The caller could not be identified or acted for another account.
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// The caller is not allowed to change this party.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request body could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Profile(e) => Some(e.kind()),
            Self::Party(e) => Some(e.kind()),
            Self::BadRequest(_) => Some(ErrorKind::Validation),
            Self::Unauthorized(_) | Self::Forbidden(_) => None,
        }
    }
}

/// Status, client error code, and numeric code of a kind.
const fn describe(kind: ErrorKind) -> (StatusCode, &'static str, u32) {
    match kind {
        ErrorKind::NotFound => (
            StatusCode::NOT_FOUND,
            "errors.com.epicgames.common.not_found",
            1004,
        ),
        ErrorKind::AlreadyOwned => (
            StatusCode::CONFLICT,
            "errors.com.epicgames.modules.gamesubcatalog.already_owned",
            28004,
        ),
        ErrorKind::PriceMismatch => (
            StatusCode::BAD_REQUEST,
            "errors.com.epicgames.modules.gamesubcatalog.invalid_price",
            28001,
        ),
        ErrorKind::InsufficientFunds => (
            StatusCode::BAD_REQUEST,
            "errors.com.epicgames.currency.mtx.insufficient",
            1040,
        ),
        ErrorKind::Validation => (
            StatusCode::BAD_REQUEST,
            "errors.com.epicgames.validation.validation_failed",
            1040,
        ),
        ErrorKind::Internal => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "errors.com.epicgames.common.server_error",
            1000,
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, numeric) = match (&self, self.kind()) {
            (_, Some(kind)) => describe(kind),
            (Self::Forbidden(_), None) => (
                StatusCode::FORBIDDEN,
                "errors.com.epicgames.party.not_a_member",
                51002,
            ),
            (_, None) => (
                StatusCode::UNAUTHORIZED,
                "errors.com.epicgames.common.authentication.authentication_failed",
                1032,
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = serde_json::json!({
            "errorCode": code,
            "errorMessage": self.to_string(),
            "numericErrorCode": numeric,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
