// crates/bucketeer-mcp-core/src/lib.rs
// ============================================================================
// Module: Bucketeer MCP Core Library
// Description: Public API surface for the feature-flag translation core.
// Purpose: Expose the domain model, error taxonomy, and request builders.
// Dependencies: crate::{environment, error, feature, patch, requests, tooling}
// ============================================================================

//! ## Overview
//! Bucketeer MCP core turns untrusted tool arguments into validated,
//! wire-ready requests for the remote feature-flag service. It owns the
//! request builders, the environment resolver, the sparse-update wrapper, and
//! the stable error taxonomy surfaced to callers. Nothing here performs I/O;
//! transport lives in `bucketeer-mcp-client`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod environment;
pub mod error;
pub mod feature;
pub mod patch;
pub mod requests;
pub mod tooling;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use environment::EnvironmentResolver;
pub use error::ErrorKind;
pub use error::FieldViolation;
pub use error::OperationError;
pub use feature::Feature;
pub use feature::Strategy;
pub use feature::Variation;
pub use feature::VariationType;
pub use patch::Patch;
pub use requests::ArchiveFlagRequest;
pub use requests::CreateFeaturePayload;
pub use requests::CreateFlagRequest;
pub use requests::GetFeatureQuery;
pub use requests::GetFlagRequest;
pub use requests::ListFeaturesQuery;
pub use requests::ListFilter;
pub use requests::ListFlagsRequest;
pub use requests::UpdateFeaturePayload;
pub use requests::UpdateFlagRequest;
pub use tooling::ToolName;
