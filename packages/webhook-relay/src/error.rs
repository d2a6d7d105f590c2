//! Error types for the relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Relay error type. Each variant is one rejection stage of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad provider kind or invalid construction arguments.
    #[error("config error: {0}")]
    Config(String),

    /// Inbound path is not covered by any allowed path.
    #[error("not allowed to proxy path: '{0}'")]
    PathRejected(String),

    /// Required header missing or body unreadable.
    #[error("malformed delivery: {0}")]
    MalformedDelivery(String),

    /// Signature or token mismatch.
    #[error("delivery failed signature validation")]
    Authentication,

    /// No upstream produced a sub-400 response.
    #[error("all upstream requests failed")]
    AllUpstreamsFailed,

    /// A single upstream send failed. Logged, never returned to the client.
    #[error("upstream transport error: {0}")]
    UpstreamTransport(String),

    /// The elected response's body could not be read.
    #[error("upstream body error: {0}")]
    UpstreamBody(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::PathRejected(_) => StatusCode::FORBIDDEN,
            Error::MalformedDelivery(_) | Error::Authentication => StatusCode::BAD_REQUEST,
            Error::UpstreamTransport(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) | Error::AllUpstreamsFailed | Error::UpstreamBody(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Plain-text body sent to the webhook caller.
    fn client_message(&self) -> String {
        match self {
            Error::Config(_) => "Error creating Provider".into(),
            Error::PathRejected(path) => format!("Not allowed to proxy path: '{path}'"),
            Error::MalformedDelivery(reason) => format!("Error parsing Hook: {reason}"),
            Error::Authentication => "Error validating Hook".into(),
            Error::AllUpstreamsFailed => "All upstream requests failed".into(),
            Error::UpstreamTransport(_) => "Upstream request failed".into(),
            Error::UpstreamBody(_) => "Error reading response body".into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), self.client_message()).into_response()
    }
}
