use pathways_store::models::{RegionKind, Stratum, VulnerabilityLevel};
use serde::Serialize;

use super::{ControlError, PathwaysControlPlane, visible_segment, visible_segmentation};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionEntry {
    pub region_code: String,
    pub region_name: String,
    pub kind: RegionKind,
    pub weight: f64,
}

/// Where a segment's population lives, heaviest region first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicDistribution {
    pub segment_id: String,
    pub segmentation_code: String,
    pub country_code: String,
    pub regions: Vec<DistributionEntry>,
    pub total_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    pub code: String,
    pub name: String,
    pub kind: RegionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionList {
    pub segmentation_code: String,
    pub country_code: String,
    pub country: String,
    pub regions: Vec<RegionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSegmentEntry {
    pub segment_id: String,
    pub segment_code: String,
    pub segment_name: String,
    pub vulnerability_level: VulnerabilityLevel,
    pub stratum: Stratum,
    pub weight: f64,
}

/// Segments concentrated in one region, heaviest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionBreakdown {
    pub segmentation_code: String,
    pub region_code: String,
    pub region_name: String,
    pub segments: Vec<RegionSegmentEntry>,
}

impl PathwaysControlPlane {
    /// Returns the published regional weights of a segment.
    ///
    /// Weights are served as delivered and never renormalised.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if the segment is unknown or hidden.
    pub fn get_geographic_distribution(
        &self,
        segment_id: &str,
        include_inactive: bool,
    ) -> Result<GeographicDistribution, ControlError> {
        let index = self.index()?;
        let (segment, segmentation) = visible_segment(&index, segment_id, include_inactive)?;

        let mut regions = Vec::new();
        for entry in index.distribution_for_segment(segment_id) {
            let region = index.region(&entry.region_code)?;
            regions.push(DistributionEntry {
                region_code: region.code.clone(),
                region_name: region.name.clone(),
                kind: region.kind,
                weight: entry.weight,
            });
        }
        let total_weight = regions.iter().map(|entry| entry.weight).sum();

        Ok(GeographicDistribution {
            segment_id: segment.id.clone(),
            segmentation_code: segmentation.code.clone(),
            country_code: segmentation.country_code.clone(),
            regions,
            total_weight,
        })
    }

    /// Lists the geographic units of a segmentation's country by name.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if the segmentation is unknown or hidden.
    pub fn list_regions(
        &self,
        segmentation_code: &str,
        include_inactive: bool,
    ) -> Result<RegionList, ControlError> {
        let index = self.index()?;
        let segmentation = visible_segmentation(&index, segmentation_code, include_inactive)?;
        let regions = index
            .region_codes_for_country(&segmentation.country_code)
            .iter()
            .filter_map(|code| index.region(code).ok())
            .map(|region| RegionSummary {
                code: region.code.clone(),
                name: region.name.clone(),
                kind: region.kind,
            })
            .collect();

        Ok(RegionList {
            segmentation_code: segmentation.code.clone(),
            country_code: segmentation.country_code.clone(),
            country: segmentation.country.clone(),
            regions,
        })
    }

    /// Returns the segments of one segmentation concentrated in a region.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` for an unknown segmentation or region and
    /// `ControlError::InvalidArgument` if the region lies in another country.
    pub fn get_region_breakdown(
        &self,
        segmentation_code: &str,
        region_code: &str,
        include_inactive: bool,
    ) -> Result<RegionBreakdown, ControlError> {
        let index = self.index()?;
        let segmentation = visible_segmentation(&index, segmentation_code, include_inactive)?;
        let region = index.region(region_code)?;
        if region.country_code != segmentation.country_code {
            return Err(ControlError::invalid(format!(
                "region '{region_code}' is not in {} ({})",
                segmentation.country, segmentation.country_code
            )));
        }

        let mut segments = Vec::new();
        for entry in index.distribution_for_region(region_code) {
            let segment = index.segment(&entry.segment_id)?;
            if segment.segmentation_code != segmentation.code {
                continue;
            }
            segments.push(RegionSegmentEntry {
                segment_id: segment.id.clone(),
                segment_code: segment.code.clone(),
                segment_name: segment.name.clone(),
                vulnerability_level: segment.vulnerability_level,
                stratum: segment.stratum,
                weight: entry.weight,
            });
        }

        Ok(RegionBreakdown {
            segmentation_code: segmentation.code.clone(),
            region_code: region.code.clone(),
            region_name: region.name.clone(),
            segments,
        })
    }
}
