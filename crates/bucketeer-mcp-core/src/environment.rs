// crates/bucketeer-mcp-core/src/environment.rs
// ============================================================================
// Module: Environment Resolution
// Description: Chooses the environment an operation targets.
// Purpose: Apply the explicit-over-default rule in one place.
// Dependencies: crate::error
// ============================================================================

//! ## Overview
//! Operations name an environment explicitly or fall back to the configured
//! default. An explicit empty string counts as absent. When neither source
//! yields a value the operation fails before any network traffic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::error::OperationError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message returned when no environment can be resolved.
pub const MISSING_ENVIRONMENT_MESSAGE: &str =
    "environmentId must be provided or set in BUCKETEER_ENVIRONMENT_ID";

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolves the effective environment identifier for an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentResolver {
    /// Configured default environment, if any.
    default: Option<String>,
}

impl EnvironmentResolver {
    /// Creates a resolver with an optional default environment.
    #[must_use]
    pub fn new(default: Option<String>) -> Self {
        Self {
            default: default.filter(|value| !value.is_empty()),
        }
    }

    /// Returns the explicit environment when non-empty, else the default.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_argument` [`OperationError`] when neither source
    /// yields an environment.
    pub fn resolve(&self, explicit: Option<&str>) -> Result<String, OperationError> {
        explicit
            .filter(|value| !value.is_empty())
            .or(self.default.as_deref())
            .map(ToString::to_string)
            .ok_or_else(|| OperationError::invalid_argument(MISSING_ENVIRONMENT_MESSAGE))
    }
}
