//! # qasphere-mcp
//!
//! MCP server for the QA Sphere test management system.
//!
//! Exposes projects, test cases, folders, tags, requirements, shared steps,
//! shared preconditions and custom fields of a QA Sphere tenant as MCP tools,
//! backed by the public REST API.
//!
//! ## Modules
//!
//! - [`cli`] - Command line interface
//! - [`mcp`] - MCP server (JSON-RPC over stdio)
//! - [`tools`] - Tool schemas and handlers
//! - [`api`] - QA Sphere REST client
//! - [`rename`] - Key renaming for API responses
//! - [`types`] - Configuration and errors

pub mod api;
pub mod cli;
pub mod mcp;
pub mod rename;
pub mod tools;
pub mod types;

pub use types::config::Config;
pub use types::errors::{QaSphereError, QaSphereResult};
