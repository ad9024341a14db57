use pathways_core::control::CaseStudyFilter;
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

/// Parameters for listing case studies; filters combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetCaseStudiesParams {
    pub segmentation_code: Option<String>,
    pub segment_id: Option<String>,
    pub theme_id: Option<String>,
    /// Page size, 1 to 100 (default 25).
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Parameters for fetching one case study.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetCaseStudyParams {
    pub slug: String,
}

#[tool_router(router = tool_router_case_studies, vis = "pub")]
impl PathwaysMcp {
    #[tool(description = "List case studies, newest first, filtered by any combination of segmentationCode, segmentId, and themeId.")]
    async fn get_case_studies(
        &self,
        Parameters(params): Parameters<GetCaseStudiesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::audit("get_case_studies", &params);
        let filter = CaseStudyFilter {
            segmentation_code: helpers::optional(params.segmentation_code.as_deref())
                .map(str::to_string),
            segment_id: helpers::optional(params.segment_id.as_deref()).map(str::to_string),
            theme_id: helpers::optional(params.theme_id.as_deref()).map(str::to_string),
        };
        let case_studies = self
            .control
            .get_case_studies(&filter)
            .map_err(helpers::map_control_err)?;
        let page = helpers::paginate(case_studies, params.limit, params.offset)?;
        self.respond(&page)
    }

    #[tool(description = "Fetch one case study by slug, including its published content.")]
    async fn get_case_study(
        &self,
        Parameters(params): Parameters<GetCaseStudyParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::audit("get_case_study", &params);
        let slug = helpers::required("slug", &params.slug)?;
        let case_study = self
            .control
            .get_case_study(slug)
            .map_err(helpers::map_control_err)?;
        self.respond(&case_study)
    }
}
