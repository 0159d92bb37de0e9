//! Tools the agents call to reach the IntentVision platform.
//!
//! This module provides the tool trait and argument schema, the HTTP-backed
//! platform tools, the shared search/connector tools, and the registry that
//! resolves tool names at dispatch time.

pub mod base_tool;
pub mod common;
pub mod intentvision_api;
pub mod registry;

// Re-exports for convenience
pub use base_tool::{ArgType, Tool, ToolArg, ToolError, ToolResult};
pub use intentvision_api::PlatformClient;
pub use registry::ToolRegistry;
