use rmcp::{
    ErrorData,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::PathwaysMcp;

/// Payload listing every MCP command with a one-line summary.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HelpCommands {
    pub commands: Vec<String>,
}

impl Default for HelpCommands {
    fn default() -> Self {
        Self {
            commands: [
                "help - List the MCP commands of this server.",
                "health - Health check; returns ok.",
                "catalog_status - Snapshot id, build time, and entity counts of the loaded catalog.",
                "list_segmentations - Country segmentation studies (activeOnly=false for superseded ones).",
                "get_segmentation - One study with methodology and ordered segments.",
                "list_segments - Segments of a study, filterable by vulnerabilityLevel and stratum.",
                "get_segment_profile - Segment narrative plus metrics grouped by theme and domain.",
                "get_segment_metrics - Metric values of a segment by variable id or theme.",
                "get_sample_metrics - Whole-sample baseline values of a study.",
                "search_variables - Ranked variable search by name and keyword.",
                "list_themes_and_domains - Health themes and vulnerability domains with variable counts.",
                "list_regions - Regions of a study's country.",
                "get_geographic_distribution - Regional weights of a segment, heaviest first.",
                "get_region_breakdown - Segments concentrated in one region.",
                "get_case_studies - Case studies filtered by study, segment, or theme.",
                "get_case_study - One case study with its published content.",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

#[tool_router(router = tool_router_context, vis = "pub")]
impl PathwaysMcp {
    #[tool(description = "List the MCP commands of this server with a one-line summary each.")]
    async fn help(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::json(HelpCommands::default())?]))
    }
}
