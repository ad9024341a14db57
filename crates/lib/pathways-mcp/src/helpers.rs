use std::borrow::Cow;
use std::collections::HashSet;
use std::str::FromStr;

use chrono::Utc;
use pathways_core::control::ControlError;
use pathways_store::models::ParseEnumError;
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, ErrorCode};
use serde::Serialize;
use serde_json::json;
use tracing::info;

pub const DEFAULT_LIMIT: usize = 25;
pub const MAX_LIMIT: usize = 100;

pub fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

/// Error carrying a stable code and retry hint in `data`.
fn coded_err(
    code: ErrorCode,
    error: &'static str,
    retryable: bool,
    message: impl Into<Cow<'static, str>>,
) -> ErrorData {
    ErrorData {
        data: Some(json!({ "error": error, "retryable": retryable })),
        ..mcp_err(code, message)
    }
}

pub fn invalid_params(message: impl Into<Cow<'static, str>>) -> ErrorData {
    coded_err(ErrorCode::INVALID_PARAMS, "invalid_argument", false, message)
}

pub fn map_control_err(err: ControlError) -> ErrorData {
    let code = match &err {
        ControlError::NotFound { .. } => ErrorCode::RESOURCE_NOT_FOUND,
        ControlError::InvalidArgument(_) => ErrorCode::INVALID_PARAMS,
        ControlError::Unavailable => ErrorCode::INTERNAL_ERROR,
    };
    coded_err(code, err.code(), err.is_retryable(), err.to_string())
}

/// Trims a required string parameter, rejecting blanks.
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ErrorData> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid_params(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

/// Trims an optional string parameter; blank counts as absent.
pub fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn parse_enum<T>(value: Option<&str>) -> Result<Option<T>, ErrorData>
where
    T: FromStr<Err = ParseEnumError>,
{
    optional(value)
        .map(T::from_str)
        .transpose()
        .map_err(|err| invalid_params(err.to_string()))
}

/// Trims, drops blanks, and de-duplicates ids preserving first occurrence.
/// A list with nothing left counts as absent.
pub fn dedup_ids(ids: Option<Vec<String>>) -> Option<Vec<String>> {
    let mut seen = HashSet::new();
    let ids: Vec<String> = ids?
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect();
    (!ids.is_empty()).then_some(ids)
}

/// One page of a longer result list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub items: Vec<T>,
}

pub fn paginate<T>(
    items: Vec<T>,
    limit: Option<usize>,
    offset: Option<usize>,
) -> Result<Page<T>, ErrorData> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(invalid_params(format!("limit must be between 1 and {MAX_LIMIT}")));
    }
    let offset = offset.unwrap_or(0);
    let total = items.len();
    let items = items.into_iter().skip(offset).take(limit).collect();
    Ok(Page {
        total,
        offset,
        limit,
        items,
    })
}

/// Renders a payload as JSON text, refusing to truncate oversized responses.
pub fn render<T: Serialize>(value: &T, char_limit: usize) -> Result<CallToolResult, ErrorData> {
    let pretty = serde_json::to_string_pretty(value)
        .map_err(|err| mcp_err(ErrorCode::INTERNAL_ERROR, err.to_string()))?;
    let text = if pretty.chars().count() <= char_limit {
        pretty
    } else {
        let compact = serde_json::to_string(value)
            .map_err(|err| mcp_err(ErrorCode::INTERNAL_ERROR, err.to_string()))?;
        let length = compact.chars().count();
        if length > char_limit {
            return Err(coded_err(
                ErrorCode::INVALID_REQUEST,
                "response_too_large",
                false,
                format!(
                    "response of {length} characters exceeds the {char_limit} limit; narrow the request with filters, variableIds, or a smaller limit"
                ),
            ));
        }
        compact
    };
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Records a read in the audit log.
pub fn audit<P: Serialize>(operation: &str, params: &P) {
    let params = serde_json::to_string(params).unwrap_or_default();
    info!(
        target: "pathways::audit",
        operation,
        params = %params,
        at = %Utc::now().to_rfc3339(),
        "tool call"
    );
}

#[cfg(test)]
pub mod test_support {
    use pathways_core::control::PathwaysControlPlane;
    use pathways_core::services::CatalogHandle;
    use pathways_core::store::{SnapshotFormat, parse_snapshot};
    use rmcp::model::CallToolResult;
    use serde_json::Value;

    use crate::PathwaysMcp;

    const FIXTURE: &str = include_str!("../../pathways-core/tests/data/kenya.json");

    pub async fn fixture_server() -> PathwaysMcp {
        let snapshot = parse_snapshot(FIXTURE, SnapshotFormat::Json).expect("fixture parses");
        let handle = CatalogHandle::default();
        handle.install(snapshot).await.expect("fixture installs");
        PathwaysMcp::new(PathwaysControlPlane::new(handle))
    }

    pub fn empty_server() -> PathwaysMcp {
        PathwaysMcp::new(PathwaysControlPlane::new(CatalogHandle::default()))
    }

    /// Parses the JSON text of the first content item.
    pub fn payload(result: &CallToolResult) -> Value {
        let value = serde_json::to_value(result).expect("result serializes");
        let text = value["content"][0]["text"]
            .as_str()
            .expect("text content");
        serde_json::from_str(text).expect("payload is JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathways_core::catalog::EntityKind;
    use pathways_store::models::VulnerabilityLevel;

    #[test]
    fn control_errors_map_to_codes() {
        let err = map_control_err(ControlError::not_found(EntityKind::Segment, "S9"));
        assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
        assert_eq!(err.data, Some(json!({ "error": "not_found", "retryable": false })));

        let err = map_control_err(ControlError::Unavailable);
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
        assert_eq!(err.data, Some(json!({ "error": "unavailable", "retryable": true })));

        let err = map_control_err(ControlError::invalid("bad"));
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn parses_vulnerability_spellings() {
        for spelling in ["most", "Most Vulnerable", "most_vulnerable", " MOST-vulnerable "] {
            assert_eq!(
                parse_enum::<VulnerabilityLevel>(Some(spelling)).ok().flatten(),
                Some(VulnerabilityLevel::Most)
            );
        }
        assert_eq!(parse_enum::<VulnerabilityLevel>(Some("  ")).ok(), Some(None));
        let err = parse_enum::<VulnerabilityLevel>(Some("very")).expect_err("unknown level");
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn required_rejects_blank() {
        assert_eq!(required("segmentId", " S1 ").ok(), Some("S1"));
        assert!(required("segmentId", "   ").is_err());
    }

    #[test]
    fn dedups_ids_in_order() {
        let ids = dedup_ids(Some(vec![
            "anc4".to_string(),
            " stunting ".to_string(),
            "anc4".to_string(),
            String::new(),
        ]));
        assert_eq!(ids, Some(vec!["anc4".to_string(), "stunting".to_string()]));
        assert_eq!(dedup_ids(None), None);
        assert_eq!(dedup_ids(Some(vec![])), None);
        assert_eq!(dedup_ids(Some(vec!["  ".to_string()])), None);
    }

    #[test]
    fn paginates_within_bounds() {
        let page = paginate((0..10).collect::<Vec<_>>(), Some(3), Some(8)).expect("page");
        assert_eq!(page.total, 10);
        assert_eq!(page.items, vec![8, 9]);

        assert!(paginate(vec![1], Some(0), None).is_err());
        assert!(paginate(vec![1], Some(MAX_LIMIT + 1), None).is_err());
        assert_eq!(paginate(vec![1, 2], None, None).expect("page").limit, DEFAULT_LIMIT);
    }

    #[test]
    fn render_falls_back_to_compact_then_fails() {
        let value = json!({ "items": [1, 2, 3] });
        let compact_len = serde_json::to_string(&value).expect("json").len();

        assert!(render(&value, compact_len).is_ok());
        let err = render(&value, compact_len - 1).expect_err("too large");
        assert_eq!(err.data, Some(json!({ "error": "response_too_large", "retryable": false })));
    }
}
