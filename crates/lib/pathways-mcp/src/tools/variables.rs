use pathways_core::control::VariableQuery;
use pathways_store::models::DataType;
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

/// Parameters for searching variables.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchVariablesParams {
    /// Text matched against variable names and keywords.
    pub query: String,
    pub theme_id: Option<String>,
    /// binary, categorical, integer, or continuous.
    pub data_type: Option<String>,
    /// Page size, 1 to 100 (default 25).
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[tool_router(router = tool_router_variables, vis = "pub")]
impl PathwaysMcp {
    #[tool(description = "Search variables by name and keyword. Exact name matches rank first, then name prefix, name substring, and keyword matches.")]
    async fn search_variables(
        &self,
        Parameters(params): Parameters<SearchVariablesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::audit("search_variables", &params);
        let query = VariableQuery {
            query: helpers::required("query", &params.query)?.to_string(),
            theme_id: helpers::optional(params.theme_id.as_deref()).map(str::to_string),
            data_type: helpers::parse_enum::<DataType>(params.data_type.as_deref())?,
        };
        let matches = self
            .control
            .search_variables(&query)
            .map_err(helpers::map_control_err)?;
        let page = helpers::paginate(matches, params.limit, params.offset)?;
        self.respond(&page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::test_support::{fixture_server, payload};
    use rmcp::model::ErrorCode;

    fn search(query: &str) -> SearchVariablesParams {
        SearchVariablesParams {
            query: query.to_string(),
            theme_id: None,
            data_type: None,
            limit: None,
            offset: None,
        }
    }

    #[tokio::test]
    async fn ranks_name_before_keyword() {
        let server = fixture_server().await;
        let result = server
            .search_variables(Parameters(search("maternal")))
            .await
            .expect("search");
        let page = payload(&result);
        assert_eq!(page["total"], 2);
        assert_eq!(page["items"][0]["name"], "Maternal Health");
        assert_eq!(page["items"][1]["matchRank"], "keyword");
    }

    #[tokio::test]
    async fn validates_paging_and_type() {
        let server = fixture_server().await;

        let mut params = search("maternal");
        params.limit = Some(500);
        let err = server
            .search_variables(Parameters(params))
            .await
            .expect_err("limit");
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        let mut params = search("maternal");
        params.data_type = Some("ordinal".to_string());
        let err = server
            .search_variables(Parameters(params))
            .await
            .expect_err("data type");
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        let mut params = search("maternal");
        params.theme_id = Some("nope".to_string());
        let err = server
            .search_variables(Parameters(params))
            .await
            .expect_err("theme");
        assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
    }
}
