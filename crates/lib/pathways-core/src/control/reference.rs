use pathways_store::models::ThemeKind;
use serde::Serialize;

use super::{ControlError, PathwaysControlPlane};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSummary {
    pub id: String,
    pub kind: ThemeKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order: u32,
    pub variable_count: usize,
}

impl PathwaysControlPlane {
    /// Lists health themes then vulnerability domains with their variable counts.
    ///
    /// # Errors
    /// Returns `ControlError::Unavailable` if no snapshot is loaded.
    pub fn list_themes_and_domains(&self) -> Result<Vec<ThemeSummary>, ControlError> {
        let index = self.index()?;
        Ok(index
            .themes()
            .map(|theme| ThemeSummary {
                id: theme.id.clone(),
                kind: theme.kind,
                name: theme.name.clone(),
                description: theme.description.clone(),
                order: theme.order,
                variable_count: index.variable_ids_for_theme(&theme.id).len(),
            })
            .collect())
    }
}
