//! MCP Tools module - defines tools exposed via JSON-RPC.
//!
//! Each tool provides:
//! - Tool descriptor (name, description, input schema)
//! - Argument parsing and validation into a remote operation
//! - Result rendering

pub mod drive;
pub mod forms;
pub mod registry;
pub mod sheets;
pub mod validation;

pub use registry::{ToolDescriptor, ToolRegistry};
