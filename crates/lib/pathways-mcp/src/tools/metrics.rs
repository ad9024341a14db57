use pathways_core::control::MetricSelection;
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

/// Parameters for fetching metric values of one segment.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetSegmentMetricsParams {
    pub segment_id: String,
    /// Variable ids to return; ids without a value are omitted.
    pub variable_ids: Option<Vec<String>>,
    /// Restrict to variables of one theme or domain.
    pub theme_id: Option<String>,
    pub include_inactive: Option<bool>,
}

/// Parameters for fetching the sample-total baseline of a segmentation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetSampleMetricsParams {
    pub segmentation_code: String,
    pub variable_ids: Option<Vec<String>>,
    pub theme_id: Option<String>,
    pub include_inactive: Option<bool>,
}

fn selection(
    variable_ids: Option<Vec<String>>,
    theme_id: Option<&str>,
    include_inactive: Option<bool>,
) -> MetricSelection {
    MetricSelection {
        variable_ids: helpers::dedup_ids(variable_ids),
        theme_id: helpers::optional(theme_id).map(str::to_string),
        include_inactive: include_inactive.unwrap_or(false),
    }
}

#[tool_router(router = tool_router_metrics, vis = "pub")]
impl PathwaysMcp {
    #[tool(description = "Fetch metric values of a segment keyed by variable id. Optionally restrict by variableIds and/or themeId; missing values are omitted.")]
    async fn get_segment_metrics(
        &self,
        Parameters(params): Parameters<GetSegmentMetricsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::audit("get_segment_metrics", &params);
        let segment_id = helpers::required("segmentId", &params.segment_id)?;
        let selection = selection(
            params.variable_ids.clone(),
            params.theme_id.as_deref(),
            params.include_inactive,
        );
        let metrics = self
            .control
            .get_segment_metrics(segment_id, &selection)
            .map_err(helpers::map_control_err)?;
        self.respond(&metrics)
    }

    #[tool(description = "Fetch the weighted whole-sample values of a segmentation, the baseline for comparing segments.")]
    async fn get_sample_metrics(
        &self,
        Parameters(params): Parameters<GetSampleMetricsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::audit("get_sample_metrics", &params);
        let segmentation_code = helpers::required("segmentationCode", &params.segmentation_code)?;
        let selection = selection(
            params.variable_ids.clone(),
            params.theme_id.as_deref(),
            params.include_inactive,
        );
        let metrics = self
            .control
            .get_sample_metrics(segmentation_code, &selection)
            .map_err(helpers::map_control_err)?;
        self.respond(&metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::test_support::{fixture_server, payload};

    #[tokio::test]
    async fn missing_variables_yield_empty_mapping() {
        let server = fixture_server().await;
        let result = server
            .get_segment_metrics(Parameters(GetSegmentMetricsParams {
                segment_id: "S1".to_string(),
                variable_ids: Some(vec!["var-not-in-catalog".to_string()]),
                theme_id: None,
                include_inactive: None,
            }))
            .await
            .expect("metrics");
        let metrics = payload(&result);
        assert_eq!(metrics["metrics"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn duplicate_ids_collapse() {
        let server = fixture_server().await;
        let result = server
            .get_segment_metrics(Parameters(GetSegmentMetricsParams {
                segment_id: "S1".to_string(),
                variable_ids: Some(vec!["anc4".to_string(), "anc4 ".to_string()]),
                theme_id: Some(" ".to_string()),
                include_inactive: None,
            }))
            .await
            .expect("metrics");
        let metrics = payload(&result);
        assert_eq!(metrics["metrics"].as_object().map(serde_json::Map::len), Some(1));
        assert_eq!(metrics["metrics"]["anc4"]["standardError"], 1.4);
    }

    #[tokio::test]
    async fn blank_variable_ids_mean_no_filter() {
        let server = fixture_server().await;
        let result = server
            .get_segment_metrics(Parameters(GetSegmentMetricsParams {
                segment_id: "S1".to_string(),
                variable_ids: Some(vec!["  ".to_string()]),
                theme_id: None,
                include_inactive: None,
            }))
            .await
            .expect("metrics");
        let metrics = payload(&result);
        assert_eq!(metrics["metrics"].as_object().map(serde_json::Map::len), Some(5));
    }

    #[tokio::test]
    async fn sample_baseline_is_served() {
        let server = fixture_server().await;
        let result = server
            .get_sample_metrics(Parameters(GetSampleMetricsParams {
                segmentation_code: "KE".to_string(),
                variable_ids: None,
                theme_id: Some("financial_access".to_string()),
                include_inactive: None,
            }))
            .await
            .expect("sample");
        let sample = payload(&result);
        assert_eq!(sample["metrics"]["bank_account"]["value"], 28.0);
        assert!(sample["metrics"]["anc4"].is_null());
    }
}
