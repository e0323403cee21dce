// crates/bucketeer-mcp-client/src/errors.rs
// ============================================================================
// Module: Error Taxonomy Mapper
// Description: Classification of transport and service failures.
// Purpose: Reduce every failed call to a stable OperationError.
// Dependencies: bucketeer-mcp-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`map_failure`] is a pure function from a [`TransportFailure`] to an
//! [`OperationError`]. Non-2xx responses are classified by the numeric
//! `code` in the service's error body, falling back to the HTTP status when
//! the body has none. Requests that never got a response are `unavailable`;
//! requests that could not be constructed are `unknown`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bucketeer_mcp_core::ErrorKind;
use bucketeer_mcp_core::OperationError;
use reqwest::StatusCode;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message reported when the service never answered.
pub const NO_RESPONSE_MESSAGE: &str = "No response from server. Please check your connection.";

// ============================================================================
// SECTION: Failures
// ============================================================================

/// Raw failure observed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The service answered with a non-2xx status.
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: Vec<u8>,
    },
    /// The request was sent but no response arrived (timeout, reset, refused).
    NoResponse {
        /// Transport error description.
        cause: String,
    },
    /// The request could not be constructed or sent.
    RequestNotSent {
        /// Construction failure description.
        cause: String,
    },
    /// A 2xx response whose body could not be used.
    InvalidBody {
        /// Decode failure description.
        cause: String,
    },
}

// ============================================================================
// SECTION: Mapping
// ============================================================================

/// Maps a transport failure onto the operation error taxonomy.
#[must_use]
pub fn map_failure(failure: TransportFailure) -> OperationError {
    match failure {
        TransportFailure::Status {
            status,
            body,
        } => map_status(status, &body),
        TransportFailure::NoResponse {
            cause,
        } => OperationError::new(ErrorKind::Unavailable, NO_RESPONSE_MESSAGE)
            .with_details(serde_json::json!({ "cause": cause })),
        TransportFailure::RequestNotSent {
            cause,
        } => OperationError::new(ErrorKind::Unknown, format!("Request error: {cause}")),
        TransportFailure::InvalidBody {
            cause,
        } => OperationError::new(ErrorKind::Unknown, format!("Invalid response from server: {cause}")),
    }
}

/// Classifies a non-2xx response.
///
/// Each body field is read on its own, so a malformed `code` does not hide
/// the service's `message` or `details`.
fn map_status(status: u16, body: &[u8]) -> OperationError {
    let parsed: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let code = parsed
        .get("code")
        .and_then(lenient_code)
        .filter(|code| *code != 0)
        .unwrap_or_else(|| i64::from(status));
    let message = parsed
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map_or_else(|| status_text(status), str::to_string);
    let error = match ErrorKind::from_remote_code(code) {
        Some(kind) => {
            let prefix = kind.remote_prefix().unwrap_or_default();
            OperationError::new(kind, format!("{prefix}: {message}"))
        }
        None => OperationError::new(ErrorKind::Unknown, message),
    };
    match parsed.get("details") {
        Some(details) if !details.is_null() => error.with_details(details.clone()),
        _ => error,
    }
}

/// Reads a service code written as an integer, an integral float, or a
/// numeric string.
fn lenient_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < 1e15)
                .and_then(|float| format!("{float:.0}").parse().ok())
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Renders an HTTP status as `HTTP <code> <reason>`.
fn status_text(status: u16) -> String {
    match StatusCode::from_u16(status).ok().and_then(|code| code.canonical_reason()) {
        Some(reason) => format!("HTTP {status} {reason}"),
        None => format!("HTTP {status}"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use bucketeer_mcp_core::ErrorKind;
    use serde_json::json;

    use super::NO_RESPONSE_MESSAGE;
    use super::TransportFailure;
    use super::map_failure;

    /// Builds a status failure with a JSON body.
    fn status(status: u16, body: &serde_json::Value) -> TransportFailure {
        TransportFailure::Status {
            status,
            body: serde_json::to_vec(body).unwrap(),
        }
    }

    #[test]
    fn recognized_codes_map_to_prefixed_kinds() {
        let cases = [
            (3, ErrorKind::InvalidArgument, "Invalid arguments: bad"),
            (5, ErrorKind::NotFound, "Not found: bad"),
            (7, ErrorKind::NotAuthorized, "Not authorized: bad"),
            (16, ErrorKind::NotAuthenticated, "Not authenticated: bad"),
        ];
        for (code, kind, message) in cases {
            let error = map_failure(status(400, &json!({"code": code, "message": "bad"})));
            assert_eq!(error.kind, kind);
            assert_eq!(error.message, message);
        }
    }

    #[test]
    fn not_found_body_keeps_service_message() {
        let error = map_failure(status(404, &json!({"code": 5, "message": "flag x not found"})));
        assert_eq!(error.kind, ErrorKind::NotFound);
        assert!(error.message.contains("flag x not found"));
    }

    #[test]
    fn unknown_code_keeps_message_and_details() {
        let error = map_failure(status(
            500,
            &json!({"code": 13, "message": "internal", "details": [{"reason": "x"}]}),
        ));
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert_eq!(error.message, "internal");
        assert_eq!(error.details, Some(json!([{"reason": "x"}])));
    }

    #[test]
    fn unparseable_body_falls_back_to_status_text() {
        let error = map_failure(TransportFailure::Status {
            status: 502,
            body: b"<html>gateway</html>".to_vec(),
        });
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert_eq!(error.message, "HTTP 502 Bad Gateway");
    }

    #[test]
    fn status_text_covers_uncommon_statuses() {
        let error = map_failure(TransportFailure::Status {
            status: 422,
            body: b"oops".to_vec(),
        });
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert_eq!(error.message, "HTTP 422 Unprocessable Entity");

        let error = map_failure(TransportFailure::Status {
            status: 408,
            body: Vec::new(),
        });
        assert_eq!(error.message, "HTTP 408 Request Timeout");
    }

    #[test]
    fn symbolic_code_keeps_service_message() {
        let error =
            map_failure(status(404, &json!({"code": "NOT_FOUND", "message": "flag x not found"})));
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert_eq!(error.message, "flag x not found");
    }

    #[test]
    fn float_and_string_codes_are_recognized() {
        let error = map_failure(status(404, &json!({"code": 5.0, "message": "flag x not found"})));
        assert_eq!(error.kind, ErrorKind::NotFound);
        assert_eq!(error.message, "Not found: flag x not found");

        let error = map_failure(status(400, &json!({"code": "3", "message": "bad id"})));
        assert_eq!(error.kind, ErrorKind::InvalidArgument);
        assert_eq!(error.message, "Invalid arguments: bad id");
    }

    #[test]
    fn missing_code_uses_http_status() {
        let error = map_failure(status(404, &json!({"message": "no such route"})));
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert_eq!(error.message, "no such route");
    }

    #[test]
    fn transport_failures_map_to_unavailable_or_unknown() {
        let error = map_failure(TransportFailure::NoResponse {
            cause: "operation timed out".to_string(),
        });
        assert_eq!(error.kind, ErrorKind::Unavailable);
        assert_eq!(error.message, NO_RESPONSE_MESSAGE);

        let error = map_failure(TransportFailure::RequestNotSent {
            cause: "invalid header value".to_string(),
        });
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert_eq!(error.message, "Request error: invalid header value");
    }
}
