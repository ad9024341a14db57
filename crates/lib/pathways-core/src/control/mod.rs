use std::sync::Arc;

use pathways_store::models::{Segment, Segmentation};
use thiserror::Error;

use crate::catalog::{CatalogIndex, CatalogStatus, EntityKind};
use crate::services::CatalogHandle;

pub mod case_studies;
pub mod geography;
pub mod metrics;
pub mod reference;
pub mod segmentations;
pub mod segments;
pub mod variables;

pub use case_studies::{CaseStudyDetail, CaseStudyFilter, CaseStudySummary};
pub use geography::{
    DistributionEntry,
    GeographicDistribution,
    RegionBreakdown,
    RegionList,
    RegionSegmentEntry,
    RegionSummary,
};
pub use metrics::{LevelEntry, MetricEntry, MetricSelection, SampleMetrics, SegmentMetrics};
pub use reference::ThemeSummary;
pub use segmentations::{SegmentationDetail, SegmentationSummary};
pub use segments::{NarrativeView, SegmentFilter, SegmentProfile, SegmentSummary};
pub use variables::{MatchRank, VariableMatch, VariableQuery};

/// Query failures surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("catalog unavailable: no snapshot has been loaded yet")]
    Unavailable,
}

impl ControlError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Unavailable => "unavailable",
        }
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// Read-only query engine over the current catalog snapshot.
///
/// Every operation loads the snapshot once and answers entirely from it, so a
/// refresh landing mid-call is never observed.
#[derive(Clone)]
pub struct PathwaysControlPlane {
    catalog: CatalogHandle,
}

impl PathwaysControlPlane {
    #[must_use]
    pub const fn new(catalog: CatalogHandle) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    /// Loads the snapshot a single call should answer from.
    ///
    /// # Errors
    /// Returns `ControlError::Unavailable` before the first successful refresh.
    pub fn index(&self) -> Result<Arc<CatalogIndex>, ControlError> {
        self.catalog.snapshot()
    }

    /// Identity and entity counts of the snapshot being served.
    ///
    /// # Errors
    /// Returns `ControlError::Unavailable` before the first successful refresh.
    pub fn status(&self) -> Result<CatalogStatus, ControlError> {
        Ok(self.index()?.status())
    }
}

/// Resolves a segmentation, hiding inactive ones unless asked for.
pub(crate) fn visible_segmentation<'a>(
    index: &'a CatalogIndex,
    code: &str,
    include_inactive: bool,
) -> Result<&'a Segmentation, ControlError> {
    let segmentation = index.segmentation(code)?;
    if !include_inactive && !segmentation.status.is_active() {
        return Err(ControlError::not_found(EntityKind::Segmentation, code));
    }
    Ok(segmentation)
}

/// Resolves a segment together with its owning segmentation.
pub(crate) fn visible_segment<'a>(
    index: &'a CatalogIndex,
    segment_id: &str,
    include_inactive: bool,
) -> Result<(&'a Segment, &'a Segmentation), ControlError> {
    let segment = index.segment(segment_id)?;
    let segmentation = index.segmentation(&segment.segmentation_code)?;
    if !include_inactive && !segmentation.status.is_active() {
        return Err(ControlError::not_found(EntityKind::Segment, segment_id));
    }
    Ok((segment, segmentation))
}
