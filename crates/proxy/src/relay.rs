//! Relaying upstream bodies to the caller
//!
//! The body goes through a short ordered chain. Each link either produces
//! the relayed body or passes to the next one; the last link always
//! succeeds, so the caller receives structured JSON whatever the upstream
//! sent.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// Field holding non-JSON upstream text
pub const RAW_FIELD: &str = "raw";

#[derive(Debug, Clone, PartialEq)]
pub enum RelayBody {
    /// Upstream declared JSON; bytes and content type pass through untouched.
    Verbatim { content_type: String, body: Bytes },
    /// Undeclared, but the body parsed as JSON.
    Parsed(Value),
    /// Not JSON; wrapped as `{ "raw": <text> }`.
    Raw(String),
}

type Link = fn(Option<&str>, &Bytes) -> Option<RelayBody>;

const CHAIN: &[Link] = &[declared_json, sniffed_json, raw_text];

/// Run `body` through the relay chain.
pub fn relay_body(content_type: Option<&str>, body: Bytes) -> RelayBody {
    CHAIN
        .iter()
        .find_map(|link| link(content_type, &body))
        .unwrap_or_else(|| RelayBody::Raw(String::new()))
}

impl RelayBody {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Verbatim { .. } => "verbatim",
            Self::Parsed(_) => "parsed",
            Self::Raw(_) => "raw",
        }
    }

    /// Build the response, keeping the upstream status.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        match self {
            Self::Verbatim { content_type, body } => {
                let content_type = HeaderValue::from_str(&content_type)
                    .unwrap_or_else(|_| HeaderValue::from_static("application/json"));
                (status, [(header::CONTENT_TYPE, content_type)], Body::from(body)).into_response()
            }
            Self::Parsed(value) => (status, Json(value)).into_response(),
            Self::Raw(text) => (status, Json(json!({ RAW_FIELD: text }))).into_response(),
        }
    }
}

/// `application/json`, or any `+json` suffix type.
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence == "text/json" || essence.ends_with("+json")
}

fn declared_json(content_type: Option<&str>, body: &Bytes) -> Option<RelayBody> {
    let content_type = content_type.filter(|ct| is_json_content_type(ct))?;
    Some(RelayBody::Verbatim {
        content_type: content_type.to_string(),
        body: body.clone(),
    })
}

fn sniffed_json(_: Option<&str>, body: &Bytes) -> Option<RelayBody> {
    serde_json::from_slice(body).ok().map(RelayBody::Parsed)
}

fn raw_text(_: Option<&str>, body: &Bytes) -> Option<RelayBody> {
    Some(RelayBody::Raw(String::from_utf8_lossy(body).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_json_passes_through() {
        let body = Bytes::from_static(b"{\"retCode\":0}");
        let relayed = relay_body(Some("application/json; charset=utf-8"), body.clone());
        assert_eq!(
            relayed,
            RelayBody::Verbatim {
                content_type: "application/json; charset=utf-8".to_string(),
                body
            }
        );
    }

    #[test]
    fn test_declared_json_is_not_reparsed() {
        // Broken JSON under a JSON content type is still relayed byte for byte.
        let relayed = relay_body(Some("application/json"), Bytes::from_static(b"{oops"));
        assert_eq!(relayed.kind(), "verbatim");
    }

    #[test]
    fn test_sniffed_json() {
        let relayed = relay_body(Some("text/plain"), Bytes::from_static(b"[1,2]"));
        assert_eq!(relayed, RelayBody::Parsed(json!([1, 2])));

        let relayed = relay_body(None, Bytes::from_static(b"{}"));
        assert_eq!(relayed, RelayBody::Parsed(json!({})));
    }

    #[test]
    fn test_raw_wrapper() {
        let relayed = relay_body(Some("text/html"), Bytes::from_static(b"<html>ok</html>"));
        assert_eq!(relayed, RelayBody::Raw("<html>ok</html>".to_string()));

        let relayed = relay_body(None, Bytes::new());
        assert_eq!(relayed, RelayBody::Raw(String::new()));
    }

    #[test]
    fn test_content_type_detection() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("Application/JSON;charset=UTF-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/html"));
        assert!(!is_json_content_type(""));
    }
}
