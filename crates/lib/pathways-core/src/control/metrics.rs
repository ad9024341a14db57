use std::collections::{BTreeMap, HashSet};

use pathways_store::models::{CategoricalLevel, DataType, MetricValue, Variable};
use serde::Serialize;

use super::{ControlError, PathwaysControlPlane, visible_segment, visible_segmentation};
use crate::catalog::CatalogIndex;

/// Which variables a metrics call should return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricSelection {
    /// Restrict to these variable ids; ids without a value are omitted.
    pub variable_ids: Option<Vec<String>>,
    /// Restrict to variables of one theme or domain.
    pub theme_id: Option<String>,
    pub include_inactive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelEntry {
    pub level: String,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_error: Option<f64>,
}

impl From<&CategoricalLevel> for LevelEntry {
    fn from(level: &CategoricalLevel) -> Self {
        Self {
            level: level.level.clone(),
            percentage: level.percentage,
            standard_error: level.standard_error,
        }
    }
}

/// One variable value annotated with its definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricEntry {
    pub variable_id: String,
    pub variable_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub data_type: DataType,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_error: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<LevelEntry>,
}

impl MetricEntry {
    #[must_use]
    pub fn new(variable: &Variable, metric: &MetricValue) -> Self {
        Self {
            variable_id: variable.id.clone(),
            variable_name: variable.name.clone(),
            unit: variable.unit.clone(),
            data_type: variable.data_type,
            value: metric.value,
            standard_error: metric.standard_error,
            median: metric.median,
            min: metric.min,
            max: metric.max,
            sample_size: metric.sample_size,
            levels: metric.levels.iter().map(LevelEntry::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMetrics {
    pub segment_id: String,
    pub segmentation_code: String,
    pub metrics: BTreeMap<String, MetricEntry>,
}

/// Weighted whole-sample values used as the comparison baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleMetrics {
    pub segmentation_code: String,
    pub metrics: BTreeMap<String, MetricEntry>,
}

impl PathwaysControlPlane {
    /// Returns the metric values of one segment keyed by variable id.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if the segment or the theme is unknown.
    pub fn get_segment_metrics(
        &self,
        segment_id: &str,
        selection: &MetricSelection,
    ) -> Result<SegmentMetrics, ControlError> {
        let index = self.index()?;
        let (segment, _) = visible_segment(&index, segment_id, selection.include_inactive)?;
        let metrics = select_metrics(&index, index.segment_metrics(segment_id), selection)?;
        Ok(SegmentMetrics {
            segment_id: segment.id.clone(),
            segmentation_code: segment.segmentation_code.clone(),
            metrics,
        })
    }

    /// Returns the sample-total values of a segmentation keyed by variable id.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if the segmentation or the theme is
    /// unknown.
    pub fn get_sample_metrics(
        &self,
        segmentation_code: &str,
        selection: &MetricSelection,
    ) -> Result<SampleMetrics, ControlError> {
        let index = self.index()?;
        let segmentation =
            visible_segmentation(&index, segmentation_code, selection.include_inactive)?;
        let metrics = select_metrics(&index, index.sample_metrics(segmentation_code), selection)?;
        Ok(SampleMetrics {
            segmentation_code: segmentation.code.clone(),
            metrics,
        })
    }
}

fn select_metrics(
    index: &CatalogIndex,
    values: Option<&BTreeMap<String, MetricValue>>,
    selection: &MetricSelection,
) -> Result<BTreeMap<String, MetricEntry>, ControlError> {
    let theme_variables: Option<HashSet<&str>> = match selection.theme_id.as_deref() {
        Some(theme_id) => {
            index.theme(theme_id)?;
            Some(
                index
                    .variable_ids_for_theme(theme_id)
                    .iter()
                    .map(String::as_str)
                    .collect(),
            )
        }
        None => None,
    };
    // An empty list filters nothing.
    let requested: Option<HashSet<&str>> = selection
        .variable_ids
        .as_ref()
        .filter(|ids| !ids.is_empty())
        .map(|ids| ids.iter().map(String::as_str).collect());

    let Some(values) = values else {
        return Ok(BTreeMap::new());
    };

    let mut selected = BTreeMap::new();
    for (variable_id, metric) in values {
        if requested
            .as_ref()
            .is_some_and(|ids| !ids.contains(variable_id.as_str()))
        {
            continue;
        }
        if theme_variables
            .as_ref()
            .is_some_and(|ids| !ids.contains(variable_id.as_str()))
        {
            continue;
        }
        let variable = index.variable(variable_id)?;
        selected.insert(variable_id.clone(), MetricEntry::new(variable, metric));
    }
    Ok(selected)
}
