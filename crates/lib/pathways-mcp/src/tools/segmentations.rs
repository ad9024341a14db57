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

/// Parameters for listing segmentation studies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListSegmentationsParams {
    /// Only active studies (default true).
    pub active_only: Option<bool>,
    /// Include superseded studies (default false); the inverse of `activeOnly`.
    pub include_inactive: Option<bool>,
}

impl ListSegmentationsParams {
    fn active_only(&self) -> Result<bool, ErrorData> {
        match (self.active_only, self.include_inactive) {
            (Some(active_only), Some(include_inactive)) if active_only == include_inactive => {
                Err(helpers::invalid_params(
                    "activeOnly and includeInactive disagree; pass only one of them",
                ))
            }
            (Some(active_only), _) => Ok(active_only),
            (None, include_inactive) => Ok(!include_inactive.unwrap_or(false)),
        }
    }
}

/// Parameters for fetching one segmentation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetSegmentationParams {
    /// Segmentation code, e.g. `KE`.
    pub code: String,
    pub include_inactive: Option<bool>,
}

#[tool_router(router = tool_router_segmentations, vis = "pub")]
impl PathwaysMcp {
    #[tool(description = "List country segmentation studies ordered by country name. Only active studies unless activeOnly is false (or includeInactive is true).")]
    async fn list_segmentations(
        &self,
        Parameters(params): Parameters<ListSegmentationsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::audit("list_segmentations", &params);
        let active_only = params.active_only()?;
        let segmentations = self
            .control
            .list_segmentations(active_only)
            .map_err(helpers::map_control_err)?;
        self.respond(&segmentations)
    }

    #[tool(description = "Fetch a segmentation study with methodology and its segments ordered by segment code.")]
    async fn get_segmentation(
        &self,
        Parameters(params): Parameters<GetSegmentationParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::audit("get_segmentation", &params);
        let code = helpers::required("code", &params.code)?;
        let detail = self
            .control
            .get_segmentation(code, params.include_inactive.unwrap_or(false))
            .map_err(helpers::map_control_err)?;
        self.respond(&detail)
    }
}
