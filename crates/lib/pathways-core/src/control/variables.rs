use pathways_store::models::{DataType, Variable, VariableType};
use serde::Serialize;

use super::{ControlError, PathwaysControlPlane};

/// How closely a variable matched a search query. Earlier variants rank higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRank {
    ExactName,
    NamePrefix,
    NameSubstring,
    Keyword,
}

/// Ranks a variable against a lowercased, trimmed query.
#[must_use]
pub fn rank_variable(variable: &Variable, needle: &str) -> Option<MatchRank> {
    let name = variable.name.to_lowercase();
    if name == needle {
        Some(MatchRank::ExactName)
    } else if name.starts_with(needle) {
        Some(MatchRank::NamePrefix)
    } else if name.contains(needle) {
        Some(MatchRank::NameSubstring)
    } else if variable
        .keywords
        .iter()
        .any(|keyword| keyword.to_lowercase().contains(needle))
    {
        Some(MatchRank::Keyword)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableQuery {
    pub query: String,
    pub theme_id: Option<String>,
    pub data_type: Option<DataType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableMatch {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data_type: DataType,
    pub variable_type: VariableType,
    pub theme_ids: Vec<String>,
    pub match_rank: MatchRank,
}

impl VariableMatch {
    fn new(variable: &Variable, match_rank: MatchRank) -> Self {
        Self {
            id: variable.id.clone(),
            name: variable.name.clone(),
            unit: variable.unit.clone(),
            description: variable.description.clone(),
            data_type: variable.data_type,
            variable_type: variable.variable_type,
            theme_ids: variable.theme_ids.clone(),
            match_rank,
        }
    }
}

impl PathwaysControlPlane {
    /// Searches variable names and keywords, best matches first.
    ///
    /// # Errors
    /// Returns `ControlError::InvalidArgument` for a blank query and
    /// `ControlError::NotFound` for an unknown theme.
    pub fn search_variables(&self, query: &VariableQuery) -> Result<Vec<VariableMatch>, ControlError> {
        let needle = query.query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(ControlError::invalid("query must not be empty"));
        }
        let index = self.index()?;
        let scope = match query.theme_id.as_deref() {
            Some(theme_id) => {
                index.theme(theme_id)?;
                Some(index.variable_ids_for_theme(theme_id))
            }
            None => None,
        };

        let mut matches: Vec<VariableMatch> = index
            .variables()
            .filter(|variable| scope.is_none_or(|ids| ids.contains(&variable.id)))
            .filter(|variable| query.data_type.is_none_or(|data_type| variable.data_type == data_type))
            .filter_map(|variable| {
                rank_variable(variable, &needle).map(|rank| VariableMatch::new(variable, rank))
            })
            .collect();
        matches.sort_by(|a, b| a.match_rank.cmp(&b.match_rank).then_with(|| a.id.cmp(&b.id)));
        Ok(matches)
    }
}
