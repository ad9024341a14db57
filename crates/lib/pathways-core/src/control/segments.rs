use std::collections::BTreeMap;

use pathways_store::models::{Segment, SegmentNarrative, Stratum, ThemeKind, VariableType, VulnerabilityLevel};
use pathways_store::schema::UNCLASSIFIED_GROUP;
use serde::Serialize;

use super::metrics::MetricEntry;
use super::segmentations::SegmentationSummary;
use super::{ControlError, PathwaysControlPlane, visible_segment, visible_segmentation};
use crate::catalog::CatalogIndex;

/// Optional vulnerability and stratum restriction for segment listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentFilter {
    pub vulnerability_level: Option<VulnerabilityLevel>,
    pub stratum: Option<Stratum>,
}

impl SegmentFilter {
    #[must_use]
    pub const fn with_vulnerability_level(mut self, level: VulnerabilityLevel) -> Self {
        self.vulnerability_level = Some(level);
        self
    }

    #[must_use]
    pub const fn with_stratum(mut self, stratum: Stratum) -> Self {
        self.stratum = Some(stratum);
        self
    }

    #[must_use]
    pub fn matches(&self, segment: &Segment) -> bool {
        self.vulnerability_level
            .is_none_or(|level| segment.vulnerability_level == level)
            && self.stratum.is_none_or(|stratum| segment.stratum == stratum)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentSummary {
    pub id: String,
    pub segmentation_code: String,
    pub code: String,
    pub name: String,
    pub vulnerability_level: VulnerabilityLevel,
    pub stratum: Stratum,
    pub prevalence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
}

impl From<&Segment> for SegmentSummary {
    fn from(segment: &Segment) -> Self {
        Self {
            id: segment.id.clone(),
            segmentation_code: segment.segmentation_code.clone(),
            code: segment.code.clone(),
            name: segment.name.clone(),
            vulnerability_level: segment.vulnerability_level,
            stratum: segment.stratum,
            prevalence: segment.prevalence,
            sample_size: segment.sample_size,
        }
    }
}

/// Published narrative sections, as delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_outcomes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vulnerability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_characteristics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
}

impl From<&SegmentNarrative> for NarrativeView {
    fn from(narrative: &SegmentNarrative) -> Self {
        Self {
            summary: narrative.summary.clone(),
            health_outcomes: narrative.health_outcomes.clone(),
            vulnerability: narrative.vulnerability.clone(),
            key_characteristics: narrative.key_characteristics.clone(),
            recommendations: narrative.recommendations.clone(),
        }
    }
}

/// Segment with its owning segmentation, narrative, and grouped metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentProfile {
    pub segment: SegmentSummary,
    pub segmentation: SegmentationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<NarrativeView>,
    /// Outcome metrics keyed by theme id.
    pub health_outcomes: BTreeMap<String, Vec<MetricEntry>>,
    /// Vulnerability factor metrics keyed by domain id.
    pub vulnerability_factors: BTreeMap<String, Vec<MetricEntry>>,
}

impl PathwaysControlPlane {
    /// Lists the segments of a segmentation in code order.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if the segmentation is unknown or hidden.
    pub fn list_segments(
        &self,
        segmentation_code: &str,
        filter: &SegmentFilter,
        include_inactive: bool,
    ) -> Result<Vec<SegmentSummary>, ControlError> {
        let index = self.index()?;
        visible_segmentation(&index, segmentation_code, include_inactive)?;
        Ok(index
            .segments_for(segmentation_code)
            .filter(|segment| filter.matches(segment))
            .map(SegmentSummary::from)
            .collect())
    }

    /// Builds the full profile of one segment.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if the segment is unknown or belongs to
    /// a hidden segmentation.
    pub fn get_segment_profile(
        &self,
        segment_id: &str,
        include_inactive: bool,
    ) -> Result<SegmentProfile, ControlError> {
        let index = self.index()?;
        let (segment, segmentation) = visible_segment(&index, segment_id, include_inactive)?;
        let (health_outcomes, vulnerability_factors) = group_metrics(&index, segment_id);

        Ok(SegmentProfile {
            segment: SegmentSummary::from(segment),
            segmentation: SegmentationSummary::from_index(&index, segmentation),
            profile_ref: segment.profile_ref.clone(),
            narrative: (!segment.narrative.is_empty()).then(|| NarrativeView::from(&segment.narrative)),
            health_outcomes,
            vulnerability_factors,
        })
    }
}

type MetricGroups = BTreeMap<String, Vec<MetricEntry>>;

fn group_metrics(index: &CatalogIndex, segment_id: &str) -> (MetricGroups, MetricGroups) {
    let mut outcomes = MetricGroups::new();
    let mut factors = MetricGroups::new();
    let Some(metrics) = index.segment_metrics(segment_id) else {
        return (outcomes, factors);
    };

    for (variable_id, metric) in metrics {
        let Ok(variable) = index.variable(variable_id) else {
            continue;
        };
        let (groups, axis) = match variable.variable_type {
            VariableType::Outcome => (&mut outcomes, ThemeKind::Theme),
            VariableType::Vulnerability => (&mut factors, ThemeKind::Domain),
        };
        let mut keys: Vec<&str> = variable
            .theme_ids
            .iter()
            .filter(|theme_id| index.theme(theme_id).is_ok_and(|theme| theme.kind == axis))
            .map(String::as_str)
            .collect();
        if keys.is_empty() {
            keys.push(UNCLASSIFIED_GROUP);
        }
        let entry = MetricEntry::new(variable, metric);
        for key in keys {
            groups.entry(key.to_string()).or_default().push(entry.clone());
        }
    }
    (outcomes, factors)
}
