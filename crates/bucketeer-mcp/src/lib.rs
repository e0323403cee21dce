// crates/bucketeer-mcp/src/lib.rs
// ============================================================================
// Module: Bucketeer MCP Library
// Description: Tool contracts, dispatcher, and JSON-RPC server.
// Purpose: Expose feature-flag operations as MCP tools.
// Dependencies: bucketeer-mcp-client, bucketeer-mcp-config, bucketeer-mcp-core
// ============================================================================

//! ## Overview
//! This crate wires the request builders and the transport adapter into an
//! MCP tool surface. [`ToolRouter`] dispatches a `(name, arguments)` pair to
//! one of five operations and always produces exactly one outcome.
//! [`McpServer`] speaks JSON-RPC 2.0 over stdio and routes `tools/call`
//! through the router.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod contract;
pub mod server;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use contract::ToolDefinition;
pub use contract::tool_definitions;
pub use server::McpServer;
pub use server::McpServerError;
pub use tools::ToolCallResult;
pub use tools::ToolContent;
pub use tools::ToolError;
pub use tools::ToolRouter;
