// crates/bucketeer-mcp-client/src/lib.rs
// ============================================================================
// Module: Bucketeer MCP Client Library
// Description: Transport adapter for the Bucketeer REST API.
// Purpose: Issue authenticated requests and classify their failures.
// Dependencies: bucketeer-mcp-core, reqwest, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! The client crate owns everything that touches the network. The
//! [`FeatureFlagService`] trait is the seam the dispatcher calls through;
//! [`BucketeerClient`] implements it over a blocking HTTP client. Every
//! transport or service failure is reduced to an `OperationError` by
//! [`map_failure`] before it leaves this crate.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod errors;
pub mod http;
pub mod service;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use errors::TransportFailure;
pub use errors::map_failure;
pub use http::BucketeerClient;
pub use http::BucketeerClientConfig;
pub use http::ClientError;
pub use service::FeatureFlagService;
pub use service::FeatureResponse;
pub use service::ListFeaturesResponse;
