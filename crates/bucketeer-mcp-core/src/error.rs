// crates/bucketeer-mcp-core/src/error.rs
// ============================================================================
// Module: Operation Errors
// Description: Stable error taxonomy for feature-flag operations.
// Purpose: Give every failure a machine-readable kind and a human message.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every operation failure, whether raised by local validation or by the
//! remote service, is reduced to an [`OperationError`]. The [`ErrorKind`]
//! label is stable and safe to branch on; the message is for humans.
//! Validation failures carry the full list of [`FieldViolation`] entries in
//! `details` so callers can fix every problem in one round trip.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message used for schema-phase argument validation failures.
pub const INVALID_INPUT_MESSAGE: &str = "Invalid input parameters";

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

/// Stable failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Arguments were rejected locally or by the service (remote code 3).
    InvalidArgument,
    /// The target resource does not exist (remote code 5).
    NotFound,
    /// The credential lacks permission (remote code 7).
    NotAuthorized,
    /// The credential is missing or rejected (remote code 16).
    NotAuthenticated,
    /// The service could not be reached or did not answer in time.
    Unavailable,
    /// Any other failure.
    Unknown,
}

impl ErrorKind {
    /// Returns the stable label for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::NotAuthorized => "not_authorized",
            Self::NotAuthenticated => "not_authenticated",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        }
    }

    /// Maps a remote status code to a kind, when the code is recognized.
    #[must_use]
    pub const fn from_remote_code(code: i64) -> Option<Self> {
        match code {
            3 => Some(Self::InvalidArgument),
            5 => Some(Self::NotFound),
            7 => Some(Self::NotAuthorized),
            16 => Some(Self::NotAuthenticated),
            _ => None,
        }
    }

    /// Returns the message prefix applied to remote messages of this kind.
    #[must_use]
    pub const fn remote_prefix(self) -> Option<&'static str> {
        match self {
            Self::InvalidArgument => Some("Invalid arguments"),
            Self::NotFound => Some("Not found"),
            Self::NotAuthorized => Some("Not authorized"),
            Self::NotAuthenticated => Some("Not authenticated"),
            Self::Unavailable | Self::Unknown => None,
        }
    }
}

// ============================================================================
// SECTION: Field Violations
// ============================================================================

/// A single argument validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Dotted path of the offending field (`variations.0.name`).
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation for the given field path.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Operation Errors
// ============================================================================

/// Failure outcome of a feature-flag operation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct OperationError {
    /// Stable failure category.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Optional structured details (validation violations, remote details).
    pub details: Option<Value>,
}

impl OperationError {
    /// Creates an error without details.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an `invalid_argument` error with a plain message.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Creates the schema-phase validation error carrying every violation.
    #[must_use]
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        let details = serde_json::to_value(&violations).ok();
        Self {
            kind: ErrorKind::InvalidArgument,
            message: INVALID_INPUT_MESSAGE.to_string(),
            details,
        }
    }

    /// Attaches structured details to the error.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}
