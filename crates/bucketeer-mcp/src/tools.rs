// crates/bucketeer-mcp/src/tools.rs
// ============================================================================
// Module: MCP Tool Router
// Description: Dispatch of tool calls to feature-flag operations.
// Purpose: Run validation, resolution, and transport for each tool call.
// Dependencies: bucketeer-mcp-client, bucketeer-mcp-core, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`ToolRouter`] maps a tool name onto one of five operations. Each call
//! runs `validate -> resolve environment -> transport` and ends in exactly
//! one [`ToolCallResult`]: a success envelope or a failure envelope carrying
//! the mapped [`OperationError`]. Only an unknown tool name escapes as a
//! [`ToolError`], so the protocol layer can report it as a JSON-RPC error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use bucketeer_mcp_client::FeatureFlagService;
use bucketeer_mcp_client::FeatureResponse;
use bucketeer_mcp_core::ArchiveFlagRequest;
use bucketeer_mcp_core::CreateFlagRequest;
use bucketeer_mcp_core::EnvironmentResolver;
use bucketeer_mcp_core::ErrorKind;
use bucketeer_mcp_core::Feature;
use bucketeer_mcp_core::GetFlagRequest;
use bucketeer_mcp_core::ListFlagsRequest;
use bucketeer_mcp_core::OperationError;
use bucketeer_mcp_core::ToolName;
use bucketeer_mcp_core::UpdateFlagRequest;
use bucketeer_mcp_core::requests::FeatureChanges;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::contract::ToolDefinition;
use crate::contract::tool_definitions;

// ============================================================================
// SECTION: Router
// ============================================================================

/// Routes tool calls to feature-flag operations.
#[derive(Clone)]
pub struct ToolRouter {
    /// Remote service used for every operation.
    service: Arc<dyn FeatureFlagService>,
    /// Environment resolver holding the configured default.
    environments: EnvironmentResolver,
}

impl ToolRouter {
    /// Creates a router over the given service.
    #[must_use]
    pub fn new(service: Arc<dyn FeatureFlagService>, environments: EnvironmentResolver) -> Self {
        Self {
            service,
            environments,
        }
    }

    /// Returns the advertised tool definitions.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    /// Executes a tool call and wraps the outcome in a result envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] when `name` is not registered and
    /// [`ToolError::Serialization`] when the envelope cannot be rendered.
    pub fn handle_tool_call(&self, name: &str, arguments: &Value) -> Result<ToolCallResult, ToolError> {
        let tool = ToolName::parse(name).ok_or_else(|| {
            error!(tool = name, "unknown tool");
            ToolError::UnknownTool(name.to_string())
        })?;
        info!(tool = %tool, "tool invoked");
        let outcome = match tool {
            ToolName::ListFeatureFlags => self.list_flags(arguments),
            ToolName::CreateFeatureFlag => self.create_flag(arguments),
            ToolName::GetFeatureFlag => self.get_flag(arguments),
            ToolName::UpdateFeatureFlag => self.update_flag(arguments),
            ToolName::ArchiveFeatureFlag => self.archive_flag(arguments),
        };
        match outcome {
            Ok(payload) => ToolCallResult::success(&payload),
            Err(err) => {
                error!(tool = %tool, kind = err.kind.as_str(), message = %err.message, "tool failed");
                ToolCallResult::failure(&err)
            }
        }
    }

    /// Runs `listFeatureFlags`.
    fn list_flags(&self, arguments: &Value) -> Result<Value, OperationError> {
        let request = ListFlagsRequest::from_arguments(arguments)?;
        debug!(tool = "listFeatureFlags", request = ?request, "validated request");
        let environment = self.environments.resolve(request.environment_id.as_deref())?;
        let response = self.service.list_features(&request.into_query(environment))?;
        info!(tool = "listFeatureFlags", count = response.features.len(), "tool succeeded");
        for feature in &response.features {
            inspect_feature(feature);
        }
        render(&ListFlagsOutcome {
            success: true,
            features: response.features,
            cursor: response.cursor,
            total_count: response.total_count,
        })
    }

    /// Runs `createFeatureFlag`.
    fn create_flag(&self, arguments: &Value) -> Result<Value, OperationError> {
        let request = CreateFlagRequest::from_arguments(arguments)?;
        debug!(tool = "createFeatureFlag", request = ?request, "validated request");
        let environment = self.environments.resolve(request.environment_id.as_deref())?;
        let response = self.service.create_feature(&request.into_payload(environment))?;
        feature_succeeded("createFeatureFlag", &response);
        render(&FeatureOutcome {
            success: true,
            feature: response.feature,
        })
    }

    /// Runs `getFeatureFlag`.
    fn get_flag(&self, arguments: &Value) -> Result<Value, OperationError> {
        let request = GetFlagRequest::from_arguments(arguments)?;
        debug!(tool = "getFeatureFlag", request = ?request, "validated request");
        let environment = self.environments.resolve(request.environment_id.as_deref())?;
        let response = self.service.get_feature(&request.into_query(environment))?;
        feature_succeeded("getFeatureFlag", &response);
        render(&FeatureOutcome {
            success: true,
            feature: response.feature,
        })
    }

    /// Runs `updateFeatureFlag`.
    fn update_flag(&self, arguments: &Value) -> Result<Value, OperationError> {
        let request = UpdateFlagRequest::from_arguments(arguments)?;
        debug!(tool = "updateFeatureFlag", request = ?request, "validated request");
        let environment = self.environments.resolve(request.environment_id.as_deref())?;
        let updated = request.changes.clone();
        let response = self.service.update_feature(&request.into_payload(environment))?;
        feature_succeeded("updateFeatureFlag", &response);
        render(&UpdateOutcome {
            success: true,
            feature: response.feature,
            updated,
        })
    }

    /// Runs `archiveFeatureFlag`.
    fn archive_flag(&self, arguments: &Value) -> Result<Value, OperationError> {
        let request = ArchiveFlagRequest::from_arguments(arguments)?;
        debug!(tool = "archiveFeatureFlag", request = ?request, "validated request");
        let environment = self.environments.resolve(request.environment_id.as_deref())?;
        let id = request.id.clone();
        let response = self.service.update_feature(&request.into_payload(environment))?;
        feature_succeeded("archiveFeatureFlag", &response);
        render(&ArchiveOutcome {
            success: true,
            message: format!("Feature flag '{id}' has been archived"),
            archived_id: id,
            feature: response.feature,
        })
    }
}

// ============================================================================
// SECTION: Tool Results
// ============================================================================

/// Result envelope returned for `tools/call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCallResult {
    /// Tool output content.
    pub content: Vec<ToolContent>,
    /// Set when the content describes a failure.
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Wraps a success payload.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Serialization`] when the payload cannot be rendered.
    pub fn success(payload: &Value) -> Result<Self, ToolError> {
        Ok(Self {
            content: vec![ToolContent::text(payload)?],
            is_error: false,
        })
    }

    /// Wraps an operation failure.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Serialization`] when the payload cannot be rendered.
    pub fn failure(err: &OperationError) -> Result<Self, ToolError> {
        let payload = serde_json::to_value(FailureOutcome {
            success: false,
            error: &err.message,
            kind: err.kind,
            details: err.details.as_ref(),
        })
        .map_err(|_| ToolError::Serialization)?;
        Ok(Self {
            content: vec![ToolContent::text(&payload)?],
            is_error: true,
        })
    }

    /// Parses the JSON document carried by the first text block.
    #[must_use]
    pub fn payload(&self) -> Option<Value> {
        self.content.iter().find_map(|content| match content {
            ToolContent::Text {
                text,
            } => serde_json::from_str(text).ok(),
        })
    }
}

/// Tool output blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    /// Pretty-printed JSON text.
    Text {
        /// Rendered text.
        text: String,
    },
}

impl ToolContent {
    /// Renders a JSON payload as pretty-printed text.
    fn text(payload: &Value) -> Result<Self, ToolError> {
        let text = serde_json::to_string_pretty(payload).map_err(|_| ToolError::Serialization)?;
        Ok(Self::Text {
            text,
        })
    }
}

// ============================================================================
// SECTION: Tool Outcomes
// ============================================================================

/// Success payload for `listFeatureFlags`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListFlagsOutcome {
    /// Always true.
    success: bool,
    /// Raw feature documents.
    features: Vec<Value>,
    /// Cursor for the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<String>,
    /// Total matching features.
    #[serde(skip_serializing_if = "Option::is_none")]
    total_count: Option<Value>,
}

/// Success payload for create and get.
#[derive(Debug, Serialize)]
struct FeatureOutcome {
    /// Always true.
    success: bool,
    /// Raw feature document.
    feature: Value,
}

/// Success payload for `updateFeatureFlag`.
#[derive(Debug, Serialize)]
struct UpdateOutcome {
    /// Always true.
    success: bool,
    /// Raw feature document.
    feature: Value,
    /// Echo of the fields that were changed.
    updated: FeatureChanges,
}

/// Success payload for `archiveFeatureFlag`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveOutcome {
    /// Always true.
    success: bool,
    /// Confirmation message.
    message: String,
    /// Archived feature id.
    archived_id: String,
    /// Raw feature document.
    feature: Value,
}

/// Failure payload for every tool.
#[derive(Debug, Serialize)]
struct FailureOutcome<'a> {
    /// Always false.
    success: bool,
    /// Human-readable message.
    error: &'a str,
    /// Stable error kind label.
    kind: ErrorKind,
    /// Structured details, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool routing errors reported as JSON-RPC errors.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool name is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Result envelope could not be rendered.
    #[error("serialization failed")]
    Serialization,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders an outcome to JSON.
fn render<T: Serialize>(outcome: &T) -> Result<Value, OperationError> {
    serde_json::to_value(outcome)
        .map_err(|err| OperationError::new(ErrorKind::Unknown, format!("serialization failed: {err}")))
}

/// Logs a single-feature success and checks the returned feature.
fn feature_succeeded(tool: &'static str, response: &FeatureResponse) {
    let id = response.feature.get("id").and_then(Value::as_str).unwrap_or_default();
    info!(tool, feature_id = id, "tool succeeded");
    inspect_feature(&response.feature);
}

/// Warns when a returned feature violates structural invariants.
fn inspect_feature(feature: &Value) {
    match Feature::from_value(feature) {
        Ok(typed) => {
            let violations = typed.invariant_violations();
            if !violations.is_empty() {
                warn!(feature_id = %typed.id, violations = ?violations, "feature violates invariants");
            }
        }
        Err(err) => debug!(error = %err, "feature document not inspectable"),
    }
}
