// crates/bucketeer-mcp-config/src/lib.rs
// ============================================================================
// Module: Bucketeer MCP Config Library
// Description: Canonical config model, loading, and validation.
// Purpose: Single source of truth for process-wide settings.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! `bucketeer-mcp-config` loads the process-wide settings once at startup:
//! the remote host, the API key, the default environment, request timeout,
//! log verbosity, and server limits. Settings come from an optional TOML file
//! overlaid by environment variables and are validated field by field.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
