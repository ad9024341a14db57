use pathways_store::models::{PublicationStatus, Segmentation};
use serde::Serialize;

use super::segments::SegmentSummary;
use super::{ControlError, PathwaysControlPlane, visible_segmentation};
use crate::catalog::CatalogIndex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationSummary {
    pub code: String,
    pub country_code: String,
    pub country: String,
    pub status: PublicationStatus,
    pub segment_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SegmentationSummary {
    pub(crate) fn from_index(index: &CatalogIndex, segmentation: &Segmentation) -> Self {
        Self {
            code: segmentation.code.clone(),
            country_code: segmentation.country_code.clone(),
            country: segmentation.country.clone(),
            status: segmentation.status,
            segment_count: index.segment_ids_for(&segmentation.code).len(),
            description: segmentation.description.clone(),
        }
    }
}

/// Full segmentation record with its segments in code order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationDetail {
    pub code: String,
    pub country_code: String,
    pub country: String,
    pub status: PublicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methodology: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geographic_coverage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representativeness: Option<String>,
    pub segment_ids: Vec<String>,
    pub segments: Vec<SegmentSummary>,
}

impl PathwaysControlPlane {
    /// Lists segmentations ordered by country name, then code.
    ///
    /// # Errors
    /// Returns `ControlError::Unavailable` if no snapshot is loaded.
    pub fn list_segmentations(
        &self,
        active_only: bool,
    ) -> Result<Vec<SegmentationSummary>, ControlError> {
        let index = self.index()?;
        Ok(index
            .segmentations()
            .filter(|segmentation| !active_only || segmentation.status.is_active())
            .map(|segmentation| SegmentationSummary::from_index(&index, segmentation))
            .collect())
    }

    /// Fetches one segmentation with its ordered segments.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if the code is unknown, or names an
    /// inactive segmentation and `include_inactive` is false.
    pub fn get_segmentation(
        &self,
        code: &str,
        include_inactive: bool,
    ) -> Result<SegmentationDetail, ControlError> {
        let index = self.index()?;
        let segmentation = visible_segmentation(&index, code, include_inactive)?;
        let segments: Vec<SegmentSummary> = index
            .segments_for(code)
            .map(SegmentSummary::from)
            .collect();

        Ok(SegmentationDetail {
            code: segmentation.code.clone(),
            country_code: segmentation.country_code.clone(),
            country: segmentation.country.clone(),
            status: segmentation.status,
            description: segmentation.description.clone(),
            source: segmentation.source.clone(),
            methodology: segmentation.methodology.clone(),
            population_size: segmentation.population_size,
            sample_size: segmentation.sample_size,
            geographic_coverage: segmentation.geographic_coverage.clone(),
            representativeness: segmentation.representativeness.clone(),
            segment_ids: index.segment_ids_for(code).to_vec(),
            segments,
        })
    }
}
