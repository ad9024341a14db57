//! MCP server implementation for pathways-mcp.
//!
//! This crate wires the query engine into rmcp tool handlers and exposes the
//! read-only MCP surface over segmentation data.

mod helpers;
mod tools;
pub mod server;

use pathways_core::control::PathwaysControlPlane;
use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use serde::Serialize;

pub use tools::case_studies::{GetCaseStudiesParams, GetCaseStudyParams};
pub use tools::geography::{GetRegionBreakdownParams, ListRegionsParams, SegmentRefParams};
pub use tools::metrics::{GetSampleMetricsParams, GetSegmentMetricsParams};
pub use tools::segmentations::{GetSegmentationParams, ListSegmentationsParams};
pub use tools::segments::ListSegmentsParams;
pub use tools::variables::SearchVariablesParams;

/// Default upper bound on the characters of one tool response.
pub const DEFAULT_RESPONSE_CHAR_LIMIT: usize = 150_000;

const SERVER_INSTRUCTIONS: &str = r"pathways-mcp serves population segmentation studies: each country segmentation divides a survey population into segments by vulnerability level and urban/rural stratum, with health outcome and vulnerability factor metrics per segment.

Workflow:
1. Call `list_segmentations` to find the country study you need (codes such as `KE`).
2. Drill into one study with `get_segmentation` or `list_segments` (filter by `vulnerabilityLevel`
   and/or `stratum`).
3. For one segment use `get_segment_profile` (narrative plus grouped metrics),
   `get_segment_metrics` (selected variables), and `get_geographic_distribution`.
4. Compare against the whole sample with `get_sample_metrics`.
5. Find variables with `search_variables`; browse axes with `list_themes_and_domains`.
6. Regions: `list_regions` and `get_region_breakdown`.
7. Applied examples: `get_case_studies` then `get_case_study`.

Notes:
- Parameters are camelCase. Inactive (superseded) studies are hidden unless `activeOnly` is false on `list_segmentations` or `includeInactive` is true on by-id tools.
- Vulnerability levels: least, less, more, most vulnerable. Strata: urban, rural.
- Values are published figures; missing values are omitted, never zero-filled.
- `catalog_status` reports the loaded snapshot; `health` returns `ok`; `help` lists every tool.";

/// MCP server wrapper around the query engine and tool routers.
#[derive(Clone)]
pub struct PathwaysMcp {
    tool_router: ToolRouter<Self>,
    control: PathwaysControlPlane,
    response_limit: usize,
}

impl PathwaysMcp {
    #[must_use]
    pub fn new(control: PathwaysControlPlane) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_segmentations()
            + Self::tool_router_segments()
            + Self::tool_router_metrics()
            + Self::tool_router_variables()
            + Self::tool_router_reference()
            + Self::tool_router_geography()
            + Self::tool_router_case_studies()
            + Self::tool_router_context();
        Self {
            tool_router,
            control,
            response_limit: DEFAULT_RESPONSE_CHAR_LIMIT,
        }
    }

    #[must_use]
    pub fn with_response_limit(mut self, response_limit: usize) -> Self {
        self.response_limit = response_limit;
        self
    }

    pub(crate) fn respond<T: Serialize>(&self, value: &T) -> Result<CallToolResult, ErrorData> {
        helpers::render(value, self.response_limit)
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl PathwaysMcp {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }

    #[tool(description = "Report the loaded catalog snapshot: id, build time, publication time, and entity counts.")]
    async fn catalog_status(&self) -> Result<CallToolResult, ErrorData> {
        helpers::audit("catalog_status", &());
        let status = self.control.status().map_err(helpers::map_control_err)?;
        self.respond(&status)
    }
}

#[tool_handler]
impl ServerHandler for PathwaysMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
