// crates/bucketeer-mcp-core/src/tooling.rs
// ============================================================================
// Module: Tooling Identifiers
// Description: Canonical MCP tool identifiers for Bucketeer MCP.
// Purpose: Shared tool naming across contracts, dispatch, and logging.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Canonical tool identifiers advertised to the protocol host.
//! These names are part of the external contract surface.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Canonical tool names for Bucketeer MCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolName {
    /// List feature flags in an environment.
    ListFeatureFlags,
    /// Create a new feature flag.
    CreateFeatureFlag,
    /// Fetch a single feature flag.
    GetFeatureFlag,
    /// Apply a partial update to a feature flag.
    UpdateFeatureFlag,
    /// Archive a feature flag.
    ArchiveFeatureFlag,
}

impl ToolName {
    /// Returns the canonical string name for the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListFeatureFlags => "listFeatureFlags",
            Self::CreateFeatureFlag => "createFeatureFlag",
            Self::GetFeatureFlag => "getFeatureFlag",
            Self::UpdateFeatureFlag => "updateFeatureFlag",
            Self::ArchiveFeatureFlag => "archiveFeatureFlag",
        }
    }

    /// Returns all tool names in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ListFeatureFlags,
            Self::CreateFeatureFlag,
            Self::GetFeatureFlag,
            Self::UpdateFeatureFlag,
            Self::ArchiveFeatureFlag,
        ]
    }

    /// Parses a tool name from its string representation.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "listFeatureFlags" => Some(Self::ListFeatureFlags),
            "createFeatureFlag" => Some(Self::CreateFeatureFlag),
            "getFeatureFlag" => Some(Self::GetFeatureFlag),
            "updateFeatureFlag" => Some(Self::UpdateFeatureFlag),
            "archiveFeatureFlag" => Some(Self::ArchiveFeatureFlag),
            _ => None,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
