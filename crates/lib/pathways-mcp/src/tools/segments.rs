use pathways_core::control::SegmentFilter;
use pathways_store::models::{Stratum, VulnerabilityLevel};
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use super::geography::SegmentRefParams;
use crate::{PathwaysMcp, helpers};

/// Parameters for listing the segments of a segmentation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListSegmentsParams {
    pub segmentation_code: String,
    /// least, less, more, or most vulnerable (case-insensitive; "most" works too).
    pub vulnerability_level: Option<String>,
    /// urban or rural.
    pub stratum: Option<String>,
    pub include_inactive: Option<bool>,
}

#[tool_router(router = tool_router_segments, vis = "pub")]
impl PathwaysMcp {
    #[tool(description = "List the segments of a segmentation ordered by segment code, optionally filtered by vulnerabilityLevel and/or stratum.")]
    async fn list_segments(
        &self,
        Parameters(params): Parameters<ListSegmentsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::audit("list_segments", &params);
        let segmentation_code = helpers::required("segmentationCode", &params.segmentation_code)?;
        let filter = SegmentFilter {
            vulnerability_level: helpers::parse_enum::<VulnerabilityLevel>(
                params.vulnerability_level.as_deref(),
            )?,
            stratum: helpers::parse_enum::<Stratum>(params.stratum.as_deref())?,
        };
        let segments = self
            .control
            .list_segments(
                segmentation_code,
                &filter,
                params.include_inactive.unwrap_or(false),
            )
            .map_err(helpers::map_control_err)?;
        self.respond(&segments)
    }

    #[tool(description = "Fetch a segment profile: segment, owning segmentation, published narrative, and metrics grouped into healthOutcomes (by theme) and vulnerabilityFactors (by domain).")]
    async fn get_segment_profile(
        &self,
        Parameters(params): Parameters<SegmentRefParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::audit("get_segment_profile", &params);
        let segment_id = helpers::required("segmentId", &params.segment_id)?;
        let profile = self
            .control
            .get_segment_profile(segment_id, params.include_inactive.unwrap_or(false))
            .map_err(helpers::map_control_err)?;
        self.respond(&profile)
    }
}
