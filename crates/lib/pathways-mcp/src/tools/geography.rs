use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{PathwaysMcp, helpers};

/// Parameters naming a single segment.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRefParams {
    pub segment_id: String,
    pub include_inactive: Option<bool>,
}

/// Parameters for listing the regions of a segmentation's country.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListRegionsParams {
    pub segmentation_code: String,
    pub include_inactive: Option<bool>,
}

/// Parameters for the segment breakdown of one region.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetRegionBreakdownParams {
    pub segmentation_code: String,
    pub region_code: String,
    pub include_inactive: Option<bool>,
}

#[tool_router(router = tool_router_geography, vis = "pub")]
impl PathwaysMcp {
    #[tool(description = "Where a segment's population lives: regions with published weights, heaviest first.")]
    async fn get_geographic_distribution(
        &self,
        Parameters(params): Parameters<SegmentRefParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::audit("get_geographic_distribution", &params);
        let segment_id = helpers::required("segmentId", &params.segment_id)?;
        let distribution = self
            .control
            .get_geographic_distribution(segment_id, params.include_inactive.unwrap_or(false))
            .map_err(helpers::map_control_err)?;
        self.respond(&distribution)
    }

    #[tool(description = "List the regions of a segmentation's country ordered by name.")]
    async fn list_regions(
        &self,
        Parameters(params): Parameters<ListRegionsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::audit("list_regions", &params);
        let segmentation_code = helpers::required("segmentationCode", &params.segmentation_code)?;
        let regions = self
            .control
            .list_regions(segmentation_code, params.include_inactive.unwrap_or(false))
            .map_err(helpers::map_control_err)?;
        self.respond(&regions)
    }

    #[tool(description = "List the segments of a segmentation concentrated in one region, heaviest first.")]
    async fn get_region_breakdown(
        &self,
        Parameters(params): Parameters<GetRegionBreakdownParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::audit("get_region_breakdown", &params);
        let segmentation_code = helpers::required("segmentationCode", &params.segmentation_code)?;
        let region_code = helpers::required("regionCode", &params.region_code)?;
        let breakdown = self
            .control
            .get_region_breakdown(
                segmentation_code,
                region_code,
                params.include_inactive.unwrap_or(false),
            )
            .map_err(helpers::map_control_err)?;
        self.respond(&breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::test_support::{fixture_server, payload};
    use rmcp::model::ErrorCode;

    #[tokio::test]
    async fn distribution_is_weight_descending() {
        let server = fixture_server().await;
        let result = server
            .get_geographic_distribution(Parameters(SegmentRefParams {
                segment_id: "S2".to_string(),
                include_inactive: None,
            }))
            .await
            .expect("distribution");
        let distribution = payload(&result);
        assert_eq!(distribution["regions"][0]["regionCode"], "KE-TUR");
        assert_eq!(distribution["regions"][2]["weight"], 2.5);
    }

    #[tokio::test]
    async fn breakdown_rejects_foreign_region() {
        let server = fixture_server().await;
        let err = server
            .get_region_breakdown(Parameters(GetRegionBreakdownParams {
                segmentation_code: "SN".to_string(),
                region_code: "KE-NAI".to_string(),
                include_inactive: None,
            }))
            .await
            .expect_err("foreign region");
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }
}
