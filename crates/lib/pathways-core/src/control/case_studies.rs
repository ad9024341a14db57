use chrono::NaiveDate;
use pathways_store::models::CaseStudy;
use serde::Serialize;

use super::{ControlError, PathwaysControlPlane};

/// Tag filters combined with AND; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseStudyFilter {
    pub segmentation_code: Option<String>,
    pub segment_id: Option<String>,
    pub theme_id: Option<String>,
}

impl CaseStudyFilter {
    #[must_use]
    pub fn matches(&self, case_study: &CaseStudy) -> bool {
        tagged(self.segmentation_code.as_deref(), &case_study.segmentation_codes)
            && tagged(self.segment_id.as_deref(), &case_study.segment_ids)
            && tagged(self.theme_id.as_deref(), &case_study.theme_ids)
    }
}

fn tagged(wanted: Option<&str>, tags: &[String]) -> bool {
    wanted.is_none_or(|wanted| tags.iter().any(|tag| tag == wanted))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudySummary {
    pub slug: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub segmentation_codes: Vec<String>,
    pub segment_ids: Vec<String>,
    pub theme_ids: Vec<String>,
}

impl From<&CaseStudy> for CaseStudySummary {
    fn from(case_study: &CaseStudy) -> Self {
        Self {
            slug: case_study.slug.clone(),
            title: case_study.title.clone(),
            authors: case_study.authors.clone(),
            publication_date: case_study.publication_date,
            headline: case_study.headline.clone(),
            location: case_study.location.clone(),
            segmentation_codes: case_study.segmentation_codes.clone(),
            segment_ids: case_study.segment_ids.clone(),
            theme_ids: case_study.theme_ids.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudyDetail {
    #[serde(flatten)]
    pub summary: CaseStudySummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl PathwaysControlPlane {
    /// Lists case studies, newest first.
    ///
    /// # Errors
    /// Returns `ControlError::Unavailable` if no snapshot is loaded.
    pub fn get_case_studies(
        &self,
        filter: &CaseStudyFilter,
    ) -> Result<Vec<CaseStudySummary>, ControlError> {
        let index = self.index()?;
        Ok(index
            .case_studies()
            .filter(|case_study| filter.matches(case_study))
            .map(CaseStudySummary::from)
            .collect())
    }

    /// Fetches one case study including its published body.
    ///
    /// # Errors
    /// Returns `ControlError::NotFound` if the slug is unknown.
    pub fn get_case_study(&self, slug: &str) -> Result<CaseStudyDetail, ControlError> {
        let index = self.index()?;
        let case_study = index.case_study(slug)?;
        Ok(CaseStudyDetail {
            summary: CaseStudySummary::from(case_study),
            content: case_study.content.clone(),
        })
    }
}
