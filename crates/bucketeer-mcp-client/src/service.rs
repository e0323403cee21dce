// crates/bucketeer-mcp-client/src/service.rs
// ============================================================================
// Module: Feature Flag Service
// Description: Operation seam between the dispatcher and the transport.
// Purpose: Let dispatch run against the real client or a test double.
// Dependencies: bucketeer-mcp-core, serde, serde_json
// ============================================================================

//! ## Overview
//! One method per remote call. Archive has no method of its own: it is an
//! update whose payload forces `archived = true`. Implementations must
//! return already-mapped [`OperationError`] values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bucketeer_mcp_core::CreateFeaturePayload;
use bucketeer_mcp_core::GetFeatureQuery;
use bucketeer_mcp_core::ListFeaturesQuery;
use bucketeer_mcp_core::OperationError;
use bucketeer_mcp_core::UpdateFeaturePayload;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Page of features returned by `GET /v1/features`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFeaturesResponse {
    /// Raw feature documents, unmodified.
    #[serde(default)]
    pub features: Vec<Value>,
    /// Cursor for the next page.
    #[serde(default)]
    pub cursor: Option<String>,
    /// Total matching features; the service may encode it as a string.
    #[serde(default)]
    pub total_count: Option<Value>,
}

/// Single feature returned by create, get, and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureResponse {
    /// Raw feature document, unmodified.
    pub feature: Value,
}

// ============================================================================
// SECTION: Service Trait
// ============================================================================

/// Remote feature-flag operations.
pub trait FeatureFlagService: Send + Sync {
    /// Lists features matching the query.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] when the call fails.
    fn list_features(&self, query: &ListFeaturesQuery)
    -> Result<ListFeaturesResponse, OperationError>;

    /// Creates a feature.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] when the call fails.
    fn create_feature(
        &self,
        payload: &CreateFeaturePayload,
    ) -> Result<FeatureResponse, OperationError>;

    /// Fetches a single feature.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] when the call fails.
    fn get_feature(&self, query: &GetFeatureQuery) -> Result<FeatureResponse, OperationError>;

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] when the call fails.
    fn update_feature(
        &self,
        payload: &UpdateFeaturePayload,
    ) -> Result<FeatureResponse, OperationError>;
}
