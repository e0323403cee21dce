// crates/bucketeer-mcp/src/contract.rs
// ============================================================================
// Module: MCP Tool Contracts
// Description: Canonical tool definitions and input schemas.
// Purpose: Advertise the tool surface to the protocol host.
// Dependencies: bucketeer-mcp-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Each tool is advertised with a JSON Schema (draft 2020-12) describing its
//! arguments. The schemas mirror the request builders: every field the
//! builders read is declared here with its type, bounds, and enum labels.
//! Cross-field rules (index bounds, the non-empty update rule) cannot be
//! expressed in the schema and are enforced only by the builders.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bucketeer_mcp_core::ToolName;
use bucketeer_mcp_core::VariationType;
use bucketeer_mcp_core::requests::DEFAULT_PAGE_SIZE;
use bucketeer_mcp_core::requests::MAX_PAGE_SIZE;
use bucketeer_mcp_core::requests::MIN_PAGE_SIZE;
use bucketeer_mcp_core::requests::MIN_VARIATIONS;
use bucketeer_mcp_core::requests::OrderBy;
use bucketeer_mcp_core::requests::OrderDirection;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Tool definition as listed by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    /// Canonical tool name.
    pub name: ToolName,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

// ============================================================================
// SECTION: Tool Definitions
// ============================================================================

/// Returns the tool definitions in canonical order.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolName::all().iter().map(|name| tool_definition(*name)).collect()
}

/// Returns the definition for a single tool.
#[must_use]
pub fn tool_definition(name: ToolName) -> ToolDefinition {
    let (description, input_schema) = match name {
        ToolName::ListFeatureFlags => {
            ("List all feature flags in the specified environment", list_input_schema())
        }
        ToolName::CreateFeatureFlag => {
            ("Create a new feature flag in the specified environment", create_input_schema())
        }
        ToolName::GetFeatureFlag => ("Get a specific feature flag by ID", get_input_schema()),
        ToolName::UpdateFeatureFlag => ("Update an existing feature flag", update_input_schema()),
        ToolName::ArchiveFeatureFlag => {
            ("Archive a feature flag (make it inactive)", archive_input_schema())
        }
    };
    ToolDefinition {
        name,
        description: description.to_string(),
        input_schema,
    }
}

// ============================================================================
// SECTION: Input Schemas
// ============================================================================

/// Input schema for `listFeatureFlags`.
fn list_input_schema() -> Value {
    tool_input_schema(
        &json!({
            "environmentId": environment_schema(),
            "pageSize": {
                "type": "integer",
                "minimum": MIN_PAGE_SIZE,
                "maximum": MAX_PAGE_SIZE,
                "default": DEFAULT_PAGE_SIZE,
                "description": "Number of items per page (1-100)"
            },
            "cursor": schema_string("Pagination cursor for next page"),
            "tags": schema_string_list("Filter by tags"),
            "orderBy": schema_enum(&OrderBy::LABELS, "Field to order by"),
            "orderDirection": schema_enum(&OrderDirection::LABELS, "Order direction"),
            "searchKeyword": schema_string("Search keyword for feature name or ID"),
            "maintainer": schema_string("Filter by maintainer email"),
            "hasExperiment": schema_boolean("Filter by whether the flag is used in an experiment"),
            "archived": schema_boolean("Filter by archived status")
        }),
        &[],
    )
}

/// Input schema for `createFeatureFlag`.
fn create_input_schema() -> Value {
    let variation = object_schema(
        &json!({
            "value": schema_non_empty_string("The value returned when this variation is served"),
            "name": schema_non_empty_string("Name of the variation"),
            "description": schema_string("Description of the variation")
        }),
        &["value", "name"],
    );
    tool_input_schema(
        &json!({
            "id": {
                "type": "string",
                "minLength": 1,
                "pattern": "^[A-Za-z0-9_-]+$",
                "description": "Unique identifier for the feature flag (alphanumeric, hyphens, underscores)"
            },
            "name": schema_non_empty_string("Human-readable name for the feature flag"),
            "description": schema_string("Description of the feature flag"),
            "environmentId": environment_schema(),
            "variations": {
                "type": "array",
                "minItems": MIN_VARIATIONS,
                "items": variation,
                "description": "List of variations (at least 2 required)"
            },
            "tags": schema_string_list("Tags for the feature flag"),
            "defaultOnVariationIndex": schema_index("Index of the variation to serve when flag is on (0-based)"),
            "defaultOffVariationIndex": schema_index("Index of the variation to serve when flag is off (0-based)"),
            "variationType": schema_enum(VariationType::labels(), "Type of the variation values")
        }),
        &["id", "name", "variations", "defaultOnVariationIndex", "defaultOffVariationIndex"],
    )
}

/// Input schema for `getFeatureFlag`.
fn get_input_schema() -> Value {
    tool_input_schema(
        &json!({
            "id": schema_non_empty_string("The ID of the feature flag to retrieve"),
            "environmentId": environment_schema(),
            "featureVersion": schema_index("Specific version of the feature to retrieve")
        }),
        &["id"],
    )
}

/// Input schema for `updateFeatureFlag`.
fn update_input_schema() -> Value {
    let mut schema = tool_input_schema(
        &json!({
            "id": schema_non_empty_string("The ID of the feature flag to update"),
            "comment": schema_non_empty_string("Comment for the update (required for audit trail)"),
            "environmentId": environment_schema(),
            "name": schema_string("New name for the feature flag"),
            "description": schema_string("New description for the feature flag"),
            "tags": schema_string_list("New tags for the feature flag"),
            "enabled": schema_boolean("Enable or disable the feature flag"),
            "archived": schema_boolean("Archive or unarchive the feature flag")
        }),
        &["id", "comment"],
    );
    if let Value::Object(map) = &mut schema {
        let alternatives: Vec<Value> = ["name", "description", "tags", "enabled", "archived"]
            .iter()
            .map(|field| json!({ "required": [field] }))
            .collect();
        map.insert("anyOf".to_string(), Value::Array(alternatives));
    }
    schema
}

/// Input schema for `archiveFeatureFlag`.
fn archive_input_schema() -> Value {
    tool_input_schema(
        &json!({
            "id": schema_non_empty_string("The ID of the feature flag to archive"),
            "environmentId": environment_schema(),
            "comment": schema_non_empty_string("Comment for the archive action (required for audit trail)")
        }),
        &["id", "comment"],
    )
}

// ============================================================================
// SECTION: Schema Helpers
// ============================================================================

/// Builds a top-level tool input schema.
fn tool_input_schema(properties: &Value, required: &[&str]) -> Value {
    with_schema(object_schema(properties, required))
}

/// Builds a closed object schema.
fn object_schema(properties: &Value, required: &[&str]) -> Value {
    let required_values: Vec<Value> =
        required.iter().map(|value| Value::String((*value).to_string())).collect();
    json!({
        "type": "object",
        "required": required_values,
        "properties": properties,
        "additionalProperties": false
    })
}

/// Adds a `$schema` header to a top-level JSON schema.
fn with_schema(schema: Value) -> Value {
    let Value::Object(mut map) = schema else {
        return schema;
    };
    map.insert(
        String::from("$schema"),
        Value::String(String::from("https://json-schema.org/draft/2020-12/schema")),
    );
    Value::Object(map)
}

/// Optional environment override shared by every tool.
fn environment_schema() -> Value {
    schema_string("Environment ID (uses default if not provided)")
}

/// Plain string.
fn schema_string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

/// String that must not be empty.
fn schema_non_empty_string(description: &str) -> Value {
    json!({ "type": "string", "minLength": 1, "description": description })
}

/// Boolean.
fn schema_boolean(description: &str) -> Value {
    json!({ "type": "boolean", "description": description })
}

/// Non-negative integer.
fn schema_index(description: &str) -> Value {
    json!({ "type": "integer", "minimum": 0, "description": description })
}

/// Array of strings.
fn schema_string_list(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

/// String restricted to `labels`.
fn schema_enum(labels: &[&str], description: &str) -> Value {
    json!({ "type": "string", "enum": labels, "description": description })
}
