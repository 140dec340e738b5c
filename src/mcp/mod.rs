//! MCP (Model Context Protocol) Module
//!
//! JSON-RPC 2.0 over stdio exposing the Sheets, Forms and Drive tools, the
//! sheet resource and the prompt templates.

pub mod content;
pub mod prompts;
pub mod resources;
pub mod rpc;
pub mod service;
pub mod tools;
pub mod transport;

pub use service::McpService;
pub use transport::{serve, serve_stdio};
