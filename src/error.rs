use axum::{ http::StatusCode, response::{ IntoResponse, Response }, Json };
use log::warn;
use thiserror::Error;

use crate::models::chat::RelayResponse;

pub const MISSING_API_KEY: &str = "Missing OPEN_SOURCE_API_KEY environment variable.";
pub const UPSTREAM_FAILED: &str = "Upstream model request failed.";
pub const UNEXPECTED: &str = "Unexpected server error.";

/// Terminal outcome of a single relay invocation. Nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Method not allowed.")]
    MethodNotAllowed,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    ServerMisconfigured(String),

    /// The transport detail is logged, never returned to the caller.
    #[error("Unexpected server error.")]
    UpstreamUnavailable(String),

    #[error("{0}")]
    UpstreamError(String),

    #[error("Model returned an empty response.")]
    EmptyUpstreamReply,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::ServerMisconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::UpstreamUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            RelayError::EmptyUpstreamReply => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Relay failed with {}: {:?}", status, self);
        }
        (status, Json(RelayResponse::Error { error: self.to_string() })).into_response()
    }
}

/// Failure of a widget's call to the relay, as shown in an error bubble.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Rejected(String),

    #[error("Unable to connect to assistant.")]
    Connect(#[source] reqwest::Error),
}
