use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a caller-supplied enumeration value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} value '{value}' (expected one of: {expected})")]
pub struct ParseEnumError {
    pub field: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ParseEnumError {
    fn new(field: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

/// Lowercases, trims, and folds `_`/`-` separators into single spaces.
fn normalize_token(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ordered severity classification of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VulnerabilityLevel {
    #[serde(rename = "least vulnerable", alias = "least", alias = "least_vulnerable")]
    Least,
    #[serde(rename = "less vulnerable", alias = "less", alias = "less_vulnerable")]
    Less,
    #[serde(rename = "more vulnerable", alias = "more", alias = "more_vulnerable")]
    More,
    #[serde(rename = "most vulnerable", alias = "most", alias = "most_vulnerable")]
    Most,
}

impl VulnerabilityLevel {
    pub const ALL: [Self; 4] = [Self::Least, Self::Less, Self::More, Self::Most];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Least => "least vulnerable",
            Self::Less => "less vulnerable",
            Self::More => "more vulnerable",
            Self::Most => "most vulnerable",
        }
    }
}

impl fmt::Display for VulnerabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VulnerabilityLevel {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_token(value);
        let stem = normalized
            .strip_suffix(" vulnerable")
            .unwrap_or(normalized.as_str());
        match stem {
            "least" => Ok(Self::Least),
            "less" => Ok(Self::Less),
            "more" => Ok(Self::More),
            "most" => Ok(Self::Most),
            _ => Err(ParseEnumError::new(
                "vulnerabilityLevel",
                value,
                "least vulnerable, less vulnerable, more vulnerable, most vulnerable",
            )),
        }
    }
}

/// Urban or rural classification of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stratum {
    Urban,
    Rural,
}

impl Stratum {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Urban => "urban",
            Self::Rural => "rural",
        }
    }
}

impl fmt::Display for Stratum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stratum {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_token(value).as_str() {
            "urban" => Ok(Self::Urban),
            "rural" => Ok(Self::Rural),
            _ => Err(ParseEnumError::new("stratum", value, "urban, rural")),
        }
    }
}

/// Publication status of a segmentation study.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    #[default]
    Active,
    Inactive,
}

impl PublicationStatus {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Classification axis kind: health themes describe outcomes, domains describe
/// vulnerability factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    Theme,
    Domain,
}

/// Measurement type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Binary,
    Categorical,
    Integer,
    Continuous,
}

impl DataType {
    /// Binary and categorical variables are reported as percentages.
    #[must_use]
    pub const fn is_proportion(self) -> bool {
        matches!(self, Self::Binary | Self::Categorical)
    }
}

impl FromStr for DataType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_token(value).as_str() {
            "binary" => Ok(Self::Binary),
            "categorical" => Ok(Self::Categorical),
            "integer" => Ok(Self::Integer),
            "continuous" => Ok(Self::Continuous),
            _ => Err(ParseEnumError::new(
                "dataType",
                value,
                "binary, categorical, integer, continuous",
            )),
        }
    }
}

/// Whether a variable measures a health outcome or a vulnerability factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    Outcome,
    #[serde(alias = "vulnerability_factor")]
    Vulnerability,
}

/// Administrative level of a geographic unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    #[default]
    Region,
    District,
}

/// Country-level population segmentation study.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segmentation {
    pub code: String,
    pub country_code: String,
    pub country: String,
    #[serde(default)]
    pub status: PublicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographic_coverage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representativeness: Option<String>,
}

/// Published narrative sections of a segment profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentNarrative {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_outcomes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_characteristics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
}

impl SegmentNarrative {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.health_outcomes.is_none()
            && self.vulnerability.is_none()
            && self.key_characteristics.is_none()
            && self.recommendations.is_none()
    }
}

/// Sub-population sharing a vulnerability profile within one segmentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub id: String,
    pub segmentation_code: String,
    pub code: String,
    pub name: String,
    pub vulnerability_level: VulnerabilityLevel,
    pub stratum: Stratum,
    pub prevalence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_ref: Option<String>,
    #[serde(default, skip_serializing_if = "SegmentNarrative::is_empty")]
    pub narrative: SegmentNarrative,
}

/// Health theme or vulnerability domain grouping related variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Theme {
    pub id: String,
    pub kind: ThemeKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: u32,
}

/// Indicator definition shared across segmentations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variable {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data_type: DataType,
    pub variable_type: VariableType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub theme_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub order: u32,
}

/// Percentage of respondents in one category of a categorical variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoricalLevel {
    pub level: String,
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_error: Option<f64>,
}

/// Numeric value of a variable for one segment, or for the sample total when
/// `segment_id` is absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricValue {
    pub segmentation_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    pub variable_id: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_error: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<CategoricalLevel>,
}

/// Administrative area within a country.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub code: String,
    pub country_code: String,
    pub name: String,
    #[serde(default)]
    pub kind: RegionKind,
}

/// Share of a segment's population located in one geographic unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Concentration {
    pub segment_id: String,
    pub region_code: String,
    pub weight: f64,
}

/// Real-world application example of segmentation data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseStudy {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segmentation_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segment_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub theme_ids: Vec<String>,
}

/// Complete bundle of records delivered by one refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub segmentations: Vec<Segmentation>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub themes: Vec<Theme>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub metrics: Vec<MetricValue>,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub concentrations: Vec<Concentration>,
    #[serde(default)]
    pub case_studies: Vec<CaseStudy>,
}
