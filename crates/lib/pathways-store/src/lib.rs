//! Segmentation data models and snapshot schema for pathways-mcp.
//!
//! This crate defines the canonical records delivered by the refresh pipeline
//! and shared by the catalog index, query engine, and tool facade.

pub mod models;
pub mod schema;

pub use models::*;
