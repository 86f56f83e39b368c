use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The terminal per-request outcomes of the authorization state machine.
/// Every handler translates repository lookups and session state into one
/// of these variants; a repository "not found" never escapes as an
/// unhandled fault. The variant ordering handlers must respect is:
/// authentication (401) precedes existence (404) precedes ownership (403).
///
/// 405 Method Not Allowed is not represented here: axum's method router
/// produces it (with the `Allow` header) before any extractor or handler
/// logic runs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No identity is bound to the caller's session.
    #[error("authentication required")]
    AuthenticationRequired,

    /// The submitted CSRF header is missing or does not match the
    /// session-bound token. Only raised on the session-bootstrap path.
    #[error("csrf token missing or invalid")]
    CsrfRejected,

    /// The target entity exists but is owned by a different user.
    #[error("not the owner of this resource")]
    OwnershipViolation,

    /// The target entity does not exist.
    #[error("resource not found")]
    NotFound,

    /// Client error outside the reference state machine (duplicate
    /// username, malformed input).
    #[error("{0}")]
    BadRequest(String),

    /// Infrastructure failure (e.g. the password hasher). Logged at the
    /// call site; the client only sees a generic message.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ApiError::CsrfRejected | ApiError::OwnershipViolation => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
