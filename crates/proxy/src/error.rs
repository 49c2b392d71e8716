//! Proxy error types and their JSON envelopes

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::VenueKey;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Per-request failure. Every variant renders as a JSON envelope; no request
/// ever ends with a dropped connection or a panic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    #[error("Unknown venue '{0}'")]
    UnknownVenue(String),

    #[error("Venue '{0}' is disabled")]
    VenueDisabled(String),

    #[error("Path '{0}' climbs above the venue root")]
    InvalidPath(String),

    #[error("Endpoint '{path}' on {venue} is retired")]
    Deprecated {
        venue: String,
        path: String,
        pattern: String,
    },

    #[error("Upstream returned {status}")]
    Upstream { status: StatusCode, details: String },

    #[error("Upstream did not answer in time: {0}")]
    Timeout(String),

    #[error("Proxy failure: {0}")]
    Transport(String),
}

/// Failure while building the proxy from configuration.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Invalid base URL for {venue}: {source}")]
    InvalidBaseUrl {
        venue: VenueKey,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid deprecated path pattern '{pattern}' for {venue}: {source}")]
    InvalidPattern {
        venue: VenueKey,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// `{ "error": <kind>, "status"?: <n>, "details": <text> }`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub details: String,
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownVenue(_) | Self::VenueDisabled(_) => StatusCode::NOT_FOUND,
            Self::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Self::Deprecated { .. } => StatusCode::GONE,
            Self::Upstream { status, .. } => *status,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownVenue(_) => "unknown_venue",
            Self::VenueDisabled(_) => "venue_disabled",
            Self::InvalidPath(_) => "invalid_path",
            Self::Deprecated { .. } => "deprecated_endpoint",
            Self::Upstream { .. } => "upstream_error",
            Self::Timeout(_) => "upstream_timeout",
            Self::Transport(_) => "proxy_failure",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let (status, details) = match self {
            Self::Upstream { status, details } => (Some(status.as_u16()), details.clone()),
            Self::Deprecated { pattern, .. } => (
                None,
                format!("{} (matched legacy pattern '{}')", self, pattern),
            ),
            Self::Timeout(message) | Self::Transport(message) => (None, message.clone()),
            other => (None, other.to_string()),
        };
        ErrorEnvelope {
            error: self.kind(),
            status,
            details,
        }
    }

    /// Classify a reqwest failure. Timeouts get their own status.
    pub(crate) fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}
