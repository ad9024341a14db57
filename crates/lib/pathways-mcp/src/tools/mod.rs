//! MCP tool modules.
//!
//! Tools are grouped by domain: segmentations and segments, metrics, variable
//! search, reference axes, geography, case studies, and contextual help.

pub mod case_studies;
pub mod geography;
pub mod metrics;
pub mod reference;
pub mod segmentations;
pub mod segments;
pub mod variables;
mod context;
