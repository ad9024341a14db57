use rmcp::{ErrorData, model::CallToolResult, tool, tool_router};

use crate::{PathwaysMcp, helpers};

#[tool_router(router = tool_router_reference, vis = "pub")]
impl PathwaysMcp {
    #[tool(description = "List health themes and vulnerability domains with their variable counts. Themes come first.")]
    async fn list_themes_and_domains(&self) -> Result<CallToolResult, ErrorData> {
        helpers::audit("list_themes_and_domains", &());
        let themes = self
            .control
            .list_themes_and_domains()
            .map_err(helpers::map_control_err)?;
        self.respond(&themes)
    }
}
