//! Core services for pathways-mcp.
//!
//! This crate owns the snapshot store, the immutable catalog index built from
//! each snapshot, the swappable catalog handle that refreshes it, and the
//! read-only query engine the MCP tools compose against.

pub mod catalog;
pub mod control;
pub mod services;
pub mod store;
