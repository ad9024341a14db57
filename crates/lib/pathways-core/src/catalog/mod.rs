//! In-memory catalog index.
//!
//! A `CatalogIndex` is built once per snapshot and never mutated afterwards.
//! It owns the entities of that snapshot plus every derived reverse lookup, so
//! a reader holding one index always sees a consistent set of cross-references.

mod build;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use pathways_store::models::{
    CaseStudy,
    Concentration,
    MetricValue,
    Region,
    Segment,
    Segmentation,
    Theme,
    Variable,
};
use pathways_store::schema::{
    COLLECTION_CASE_STUDY,
    COLLECTION_REGION,
    COLLECTION_SEGMENT,
    COLLECTION_SEGMENTATION,
    COLLECTION_THEME,
    COLLECTION_VARIABLE,
};
use serde::Serialize;
use uuid::Uuid;

use crate::control::ControlError;

pub use build::{CatalogBuildOptions, CatalogError};

/// Kinds of entity addressable by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Segmentation,
    Segment,
    Theme,
    Variable,
    Region,
    CaseStudy,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Segmentation => COLLECTION_SEGMENTATION,
            Self::Segment => COLLECTION_SEGMENT,
            Self::Theme => COLLECTION_THEME,
            Self::Variable => COLLECTION_VARIABLE,
            Self::Region => COLLECTION_REGION,
            Self::CaseStudy => COLLECTION_CASE_STUDY,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed view of one catalog entity.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Segmentation(&'a Segmentation),
    Segment(&'a Segment),
    Theme(&'a Theme),
    Variable(&'a Variable),
    Region(&'a Region),
    CaseStudy(&'a CaseStudy),
}

/// Entity counts of one built index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub segmentations: usize,
    pub active_segmentations: usize,
    pub segments: usize,
    pub themes: usize,
    pub variables: usize,
    pub metrics: usize,
    pub regions: usize,
    pub concentrations: usize,
    pub case_studies: usize,
}

/// Identity and size of the snapshot currently served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatus {
    pub snapshot_id: Uuid,
    pub built_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub stats: CatalogStats,
}

/// Immutable lookup structures for one snapshot.
#[derive(Debug)]
pub struct CatalogIndex {
    snapshot_id: Uuid,
    built_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
    stats: CatalogStats,
    segmentations: HashMap<String, Segmentation>,
    segmentation_order: Vec<String>,
    segments: HashMap<String, Segment>,
    segments_by_segmentation: HashMap<String, Vec<String>>,
    themes: HashMap<String, Theme>,
    theme_order: Vec<String>,
    variables: HashMap<String, Variable>,
    variable_order: Vec<String>,
    variables_by_theme: HashMap<String, Vec<String>>,
    segments_by_variable: HashMap<String, Vec<String>>,
    segment_metrics: HashMap<String, BTreeMap<String, MetricValue>>,
    sample_metrics: HashMap<String, BTreeMap<String, MetricValue>>,
    regions: HashMap<String, Region>,
    regions_by_country: HashMap<String, Vec<String>>,
    distribution_by_segment: HashMap<String, Vec<Concentration>>,
    distribution_by_region: HashMap<String, Vec<Concentration>>,
    case_studies: HashMap<String, CaseStudy>,
    case_study_order: Vec<String>,
}

impl CatalogIndex {
    #[must_use]
    pub const fn snapshot_id(&self) -> Uuid {
        self.snapshot_id
    }

    #[must_use]
    pub const fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    #[must_use]
    pub const fn stats(&self) -> CatalogStats {
        self.stats
    }

    #[must_use]
    pub const fn status(&self) -> CatalogStatus {
        CatalogStatus {
            snapshot_id: self.snapshot_id,
            built_at: self.built_at,
            published_at: self.published_at,
            stats: self.stats,
        }
    }

    /// Looks up any entity by kind and id.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if no entity of that kind has the id.
    pub fn lookup(&self, kind: EntityKind, id: &str) -> Result<EntityRef<'_>, ControlError> {
        match kind {
            EntityKind::Segmentation => self.segmentation(id).map(EntityRef::Segmentation),
            EntityKind::Segment => self.segment(id).map(EntityRef::Segment),
            EntityKind::Theme => self.theme(id).map(EntityRef::Theme),
            EntityKind::Variable => self.variable(id).map(EntityRef::Variable),
            EntityKind::Region => self.region(id).map(EntityRef::Region),
            EntityKind::CaseStudy => self.case_study(id).map(EntityRef::CaseStudy),
        }
    }

    /// # Errors
    /// Returns `ControlError::NotFound` if the code is unknown.
    pub fn segmentation(&self, code: &str) -> Result<&Segmentation, ControlError> {
        self.segmentations
            .get(code)
            .ok_or_else(|| ControlError::not_found(EntityKind::Segmentation, code))
    }

    /// # Errors
    /// Returns `ControlError::NotFound` if the id is unknown.
    pub fn segment(&self, id: &str) -> Result<&Segment, ControlError> {
        self.segments
            .get(id)
            .ok_or_else(|| ControlError::not_found(EntityKind::Segment, id))
    }

    /// # Errors
    /// Returns `ControlError::NotFound` if the id is unknown.
    pub fn theme(&self, id: &str) -> Result<&Theme, ControlError> {
        self.themes
            .get(id)
            .ok_or_else(|| ControlError::not_found(EntityKind::Theme, id))
    }

    /// # Errors
    /// Returns `ControlError::NotFound` if the id is unknown.
    pub fn variable(&self, id: &str) -> Result<&Variable, ControlError> {
        self.variables
            .get(id)
            .ok_or_else(|| ControlError::not_found(EntityKind::Variable, id))
    }

    /// # Errors
    /// Returns `ControlError::NotFound` if the code is unknown.
    pub fn region(&self, code: &str) -> Result<&Region, ControlError> {
        self.regions
            .get(code)
            .ok_or_else(|| ControlError::not_found(EntityKind::Region, code))
    }

    /// # Errors
    /// Returns `ControlError::NotFound` if the slug is unknown.
    pub fn case_study(&self, slug: &str) -> Result<&CaseStudy, ControlError> {
        self.case_studies
            .get(slug)
            .ok_or_else(|| ControlError::not_found(EntityKind::CaseStudy, slug))
    }

    /// Segmentations ordered by country name, then code.
    pub fn segmentations(&self) -> impl Iterator<Item = &Segmentation> {
        self.segmentation_order
            .iter()
            .filter_map(|code| self.segmentations.get(code))
    }

    /// Segment ids of a segmentation, ordered by segment code.
    #[must_use]
    pub fn segment_ids_for(&self, segmentation_code: &str) -> &[String] {
        self.segments_by_segmentation
            .get(segmentation_code)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Segments of a segmentation, ordered by segment code.
    pub fn segments_for<'a>(
        &'a self,
        segmentation_code: &str,
    ) -> impl Iterator<Item = &'a Segment> + use<'a> {
        self.segment_ids_for(segmentation_code)
            .iter()
            .filter_map(|id| self.segments.get(id))
    }

    /// Themes and domains ordered by kind, display order, then id.
    pub fn themes(&self) -> impl Iterator<Item = &Theme> {
        self.theme_order.iter().filter_map(|id| self.themes.get(id))
    }

    /// Variables ordered by display order, then id.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variable_order
            .iter()
            .filter_map(|id| self.variables.get(id))
    }

    /// Variable ids associated with a theme or domain, ordered by id.
    #[must_use]
    pub fn variable_ids_for_theme(&self, theme_id: &str) -> &[String] {
        self.variables_by_theme
            .get(theme_id)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Segment ids holding a value for the variable.
    #[must_use]
    pub fn segments_with_variable(&self, variable_id: &str) -> &[String] {
        self.segments_by_variable
            .get(variable_id)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Metric values of a segment keyed by variable id.
    #[must_use]
    pub fn segment_metrics(&self, segment_id: &str) -> Option<&BTreeMap<String, MetricValue>> {
        self.segment_metrics.get(segment_id)
    }

    /// Sample-total metric values of a segmentation keyed by variable id.
    #[must_use]
    pub fn sample_metrics(&self, segmentation_code: &str) -> Option<&BTreeMap<String, MetricValue>> {
        self.sample_metrics.get(segmentation_code)
    }

    /// Region codes of a country, ordered by region name.
    #[must_use]
    pub fn region_codes_for_country(&self, country_code: &str) -> &[String] {
        self.regions_by_country
            .get(country_code)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Concentration entries of a segment, weight descending.
    #[must_use]
    pub fn distribution_for_segment(&self, segment_id: &str) -> &[Concentration] {
        self.distribution_by_segment
            .get(segment_id)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Concentration entries located in a region, weight descending.
    #[must_use]
    pub fn distribution_for_region(&self, region_code: &str) -> &[Concentration] {
        self.distribution_by_region
            .get(region_code)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Case studies ordered by publication date (newest first), then slug.
    pub fn case_studies(&self) -> impl Iterator<Item = &CaseStudy> {
        self.case_study_order
            .iter()
            .filter_map(|slug| self.case_studies.get(slug))
    }
}
