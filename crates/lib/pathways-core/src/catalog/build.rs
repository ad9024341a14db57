use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use pathways_store::models::{Concentration, MetricValue, Snapshot};
use pathways_store::schema::{
    COLLECTION_CASE_STUDY,
    COLLECTION_CONCENTRATION,
    COLLECTION_METRIC,
    COLLECTION_REGION,
    COLLECTION_SEGMENT,
    COLLECTION_SEGMENTATION,
    COLLECTION_THEME,
    COLLECTION_VARIABLE,
    DEFAULT_TOTAL_TOLERANCE,
    PERCENT_TOTAL,
    UNCLASSIFIED_GROUP,
};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CatalogIndex, CatalogStats};

/// Validation settings applied while building an index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogBuildOptions {
    pub total_tolerance: f64,
    pub strict_totals: bool,
}

impl CatalogBuildOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total_tolerance: DEFAULT_TOTAL_TOLERANCE,
            strict_totals: true,
        }
    }

    #[must_use]
    pub const fn with_total_tolerance(mut self, total_tolerance: f64) -> Self {
        self.total_tolerance = total_tolerance;
        self
    }

    #[must_use]
    pub const fn with_strict_totals(mut self, strict_totals: bool) -> Self {
        self.strict_totals = strict_totals;
        self
    }

    fn total_limit(&self) -> f64 {
        PERCENT_TOTAL + self.total_tolerance
    }
}

impl Default for CatalogBuildOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Integrity violations that reject a snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("duplicate {kind} id: {id}")]
    Duplicate { kind: &'static str, id: String },
    #[error("{kind} '{id}' references unknown {target} '{target_id}'")]
    DanglingReference {
        kind: &'static str,
        id: String,
        target: &'static str,
        target_id: String,
    },
    #[error("country '{country_code}' has more than one active segmentation: {first}, {second}")]
    ConflictingActive {
        country_code: String,
        first: String,
        second: String,
    },
    #[error("invalid {kind} '{id}': {message}")]
    InvalidValue {
        kind: &'static str,
        id: String,
        message: String,
    },
    #[error("{scope} totals {total:.2}%, above the {limit:.2}% limit")]
    TotalExceeded { scope: String, total: f64, limit: f64 },
}

impl CatalogIndex {
    /// Validates a snapshot and builds its lookup structures.
    ///
    /// # Errors
    /// Returns `CatalogError` on the first integrity violation; nothing is
    /// partially built.
    pub fn build(snapshot: Snapshot, options: &CatalogBuildOptions) -> Result<Self, CatalogError> {
        let Snapshot {
            published_at,
            segmentations,
            segments,
            themes,
            variables,
            metrics,
            regions,
            concentrations,
            case_studies,
        } = snapshot;

        let mut stats = CatalogStats::default();

        let mut segmentation_map = HashMap::with_capacity(segmentations.len());
        let mut active_by_country: HashMap<String, String> = HashMap::new();
        for segmentation in segmentations {
            if segmentation.status.is_active() {
                stats.active_segmentations += 1;
                match active_by_country.entry(segmentation.country_code.clone()) {
                    Entry::Occupied(existing) => {
                        return Err(CatalogError::ConflictingActive {
                            country_code: segmentation.country_code.clone(),
                            first: existing.get().clone(),
                            second: segmentation.code,
                        });
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(segmentation.code.clone());
                    }
                }
            }
            insert_unique(
                &mut segmentation_map,
                segmentation.code.clone(),
                segmentation,
                COLLECTION_SEGMENTATION,
            )?;
        }
        stats.segmentations = segmentation_map.len();

        let mut segmentation_order: Vec<String> = segmentation_map.keys().cloned().collect();
        segmentation_order.sort_by(|left, right| {
            let a = &segmentation_map[left];
            let b = &segmentation_map[right];
            a.country
                .to_lowercase()
                .cmp(&b.country.to_lowercase())
                .then_with(|| a.code.cmp(&b.code))
        });

        let mut segment_map = HashMap::with_capacity(segments.len());
        let mut segments_by_segmentation: HashMap<String, Vec<String>> = HashMap::new();
        for segment in segments {
            if !segmentation_map.contains_key(&segment.segmentation_code) {
                return Err(dangling(
                    COLLECTION_SEGMENT,
                    &segment.id,
                    COLLECTION_SEGMENTATION,
                    &segment.segmentation_code,
                ));
            }
            ensure_percentage(segment.prevalence, COLLECTION_SEGMENT, &segment.id, "prevalence")?;
            segments_by_segmentation
                .entry(segment.segmentation_code.clone())
                .or_default()
                .push(segment.id.clone());
            insert_unique(&mut segment_map, segment.id.clone(), segment, COLLECTION_SEGMENT)?;
        }
        for ids in segments_by_segmentation.values_mut() {
            ids.sort_by(|left, right| {
                segment_map[left]
                    .code
                    .cmp(&segment_map[right].code)
                    .then_with(|| left.cmp(right))
            });
        }
        for segmentation_code in sorted_keys(&segments_by_segmentation) {
            let total: f64 = segments_by_segmentation[segmentation_code]
                .iter()
                .map(|id| segment_map[id].prevalence)
                .sum();
            check_total(
                options,
                format!("prevalence of segmentation '{segmentation_code}'"),
                total,
            )?;
        }
        stats.segments = segment_map.len();

        let mut theme_map = HashMap::with_capacity(themes.len());
        for theme in themes {
            if theme.id == UNCLASSIFIED_GROUP {
                return Err(CatalogError::InvalidValue {
                    kind: COLLECTION_THEME,
                    id: theme.id,
                    message: format!("'{UNCLASSIFIED_GROUP}' is reserved for unclassified variables"),
                });
            }
            insert_unique(&mut theme_map, theme.id.clone(), theme, COLLECTION_THEME)?;
        }
        let mut theme_order: Vec<String> = theme_map.keys().cloned().collect();
        theme_order.sort_by(|left, right| {
            let a = &theme_map[left];
            let b = &theme_map[right];
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.order.cmp(&b.order))
                .then_with(|| a.id.cmp(&b.id))
        });
        stats.themes = theme_map.len();

        let mut variable_map = HashMap::with_capacity(variables.len());
        let mut variables_by_theme: HashMap<String, Vec<String>> = HashMap::new();
        for mut variable in variables {
            let mut seen = HashSet::new();
            variable.theme_ids.retain(|theme_id| seen.insert(theme_id.clone()));
            for theme_id in &variable.theme_ids {
                if !theme_map.contains_key(theme_id) {
                    return Err(dangling(
                        COLLECTION_VARIABLE,
                        &variable.id,
                        COLLECTION_THEME,
                        theme_id,
                    ));
                }
                variables_by_theme
                    .entry(theme_id.clone())
                    .or_default()
                    .push(variable.id.clone());
            }
            insert_unique(&mut variable_map, variable.id.clone(), variable, COLLECTION_VARIABLE)?;
        }
        for ids in variables_by_theme.values_mut() {
            ids.sort();
        }
        let mut variable_order: Vec<String> = variable_map.keys().cloned().collect();
        variable_order.sort_by(|left, right| {
            variable_map[left]
                .order
                .cmp(&variable_map[right].order)
                .then_with(|| left.cmp(right))
        });
        stats.variables = variable_map.len();

        let mut segment_metrics: HashMap<String, BTreeMap<String, MetricValue>> = HashMap::new();
        let mut sample_metrics: HashMap<String, BTreeMap<String, MetricValue>> = HashMap::new();
        let mut segments_by_variable: HashMap<String, Vec<String>> = HashMap::new();
        for metric in metrics {
            let metric_id = metric_label(&metric);
            if !segmentation_map.contains_key(&metric.segmentation_code) {
                return Err(dangling(
                    COLLECTION_METRIC,
                    &metric_id,
                    COLLECTION_SEGMENTATION,
                    &metric.segmentation_code,
                ));
            }
            let Some(variable) = variable_map.get(&metric.variable_id) else {
                return Err(dangling(
                    COLLECTION_METRIC,
                    &metric_id,
                    COLLECTION_VARIABLE,
                    &metric.variable_id,
                ));
            };
            if variable.data_type.is_proportion() {
                ensure_percentage(metric.value, COLLECTION_METRIC, &metric_id, "value")?;
            }
            if !metric.value.is_finite() {
                return Err(CatalogError::InvalidValue {
                    kind: COLLECTION_METRIC,
                    id: metric_id,
                    message: "value must be a finite number".to_string(),
                });
            }

            let bucket = if let Some(segment_id) = metric.segment_id.as_ref() {
                let Some(segment) = segment_map.get(segment_id) else {
                    return Err(dangling(COLLECTION_METRIC, &metric_id, COLLECTION_SEGMENT, segment_id));
                };
                if segment.segmentation_code != metric.segmentation_code {
                    return Err(CatalogError::InvalidValue {
                        kind: COLLECTION_METRIC,
                        id: metric_id,
                        message: format!(
                            "segment belongs to segmentation '{}'",
                            segment.segmentation_code
                        ),
                    });
                }
                segments_by_variable
                    .entry(metric.variable_id.clone())
                    .or_default()
                    .push(segment_id.clone());
                segment_metrics.entry(segment_id.clone()).or_default()
            } else {
                sample_metrics
                    .entry(metric.segmentation_code.clone())
                    .or_default()
            };

            if bucket.contains_key(&metric.variable_id) {
                return Err(CatalogError::Duplicate {
                    kind: COLLECTION_METRIC,
                    id: metric_id,
                });
            }
            bucket.insert(metric.variable_id.clone(), metric);
            stats.metrics += 1;
        }
        for ids in segments_by_variable.values_mut() {
            ids.sort();
        }

        let mut region_map = HashMap::with_capacity(regions.len());
        let mut regions_by_country: HashMap<String, Vec<String>> = HashMap::new();
        for region in regions {
            regions_by_country
                .entry(region.country_code.clone())
                .or_default()
                .push(region.code.clone());
            insert_unique(&mut region_map, region.code.clone(), region, COLLECTION_REGION)?;
        }
        for codes in regions_by_country.values_mut() {
            codes.sort_by(|left, right| {
                region_map[left]
                    .name
                    .to_lowercase()
                    .cmp(&region_map[right].name.to_lowercase())
                    .then_with(|| left.cmp(right))
            });
        }
        stats.regions = region_map.len();

        let mut distribution_by_segment: HashMap<String, Vec<Concentration>> = HashMap::new();
        let mut distribution_by_region: HashMap<String, Vec<Concentration>> = HashMap::new();
        let mut seen_pairs = HashSet::new();
        for concentration in concentrations {
            let pair_id = format!("{}@{}", concentration.segment_id, concentration.region_code);
            let Some(segment) = segment_map.get(&concentration.segment_id) else {
                return Err(dangling(
                    COLLECTION_CONCENTRATION,
                    &pair_id,
                    COLLECTION_SEGMENT,
                    &concentration.segment_id,
                ));
            };
            let Some(region) = region_map.get(&concentration.region_code) else {
                return Err(dangling(
                    COLLECTION_CONCENTRATION,
                    &pair_id,
                    COLLECTION_REGION,
                    &concentration.region_code,
                ));
            };
            let country_code = &segmentation_map[&segment.segmentation_code].country_code;
            if &region.country_code != country_code {
                return Err(CatalogError::InvalidValue {
                    kind: COLLECTION_CONCENTRATION,
                    id: pair_id,
                    message: format!(
                        "region is in '{}' but the segment's study covers '{country_code}'",
                        region.country_code
                    ),
                });
            }
            ensure_percentage(concentration.weight, COLLECTION_CONCENTRATION, &pair_id, "weight")?;
            if !seen_pairs.insert(pair_id.clone()) {
                return Err(CatalogError::Duplicate {
                    kind: COLLECTION_CONCENTRATION,
                    id: pair_id,
                });
            }
            distribution_by_region
                .entry(concentration.region_code.clone())
                .or_default()
                .push(concentration.clone());
            distribution_by_segment
                .entry(concentration.segment_id.clone())
                .or_default()
                .push(concentration);
            stats.concentrations += 1;
        }
        for entries in distribution_by_segment.values_mut() {
            sort_by_weight(entries, |entry| &entry.region_code);
        }
        for segment_id in sorted_keys(&distribution_by_segment) {
            let total: f64 = distribution_by_segment[segment_id]
                .iter()
                .map(|entry| entry.weight)
                .sum();
            check_total(
                options,
                format!("geographic weight of segment '{segment_id}'"),
                total,
            )?;
        }
        for entries in distribution_by_region.values_mut() {
            sort_by_weight(entries, |entry| &entry.segment_id);
        }

        let mut case_study_map = HashMap::with_capacity(case_studies.len());
        for case_study in case_studies {
            for code in &case_study.segmentation_codes {
                if !segmentation_map.contains_key(code) {
                    return Err(dangling(
                        COLLECTION_CASE_STUDY,
                        &case_study.slug,
                        COLLECTION_SEGMENTATION,
                        code,
                    ));
                }
            }
            for segment_id in &case_study.segment_ids {
                if !segment_map.contains_key(segment_id) {
                    return Err(dangling(
                        COLLECTION_CASE_STUDY,
                        &case_study.slug,
                        COLLECTION_SEGMENT,
                        segment_id,
                    ));
                }
            }
            for theme_id in &case_study.theme_ids {
                if !theme_map.contains_key(theme_id) {
                    return Err(dangling(
                        COLLECTION_CASE_STUDY,
                        &case_study.slug,
                        COLLECTION_THEME,
                        theme_id,
                    ));
                }
            }
            insert_unique(
                &mut case_study_map,
                case_study.slug.clone(),
                case_study,
                COLLECTION_CASE_STUDY,
            )?;
        }
        let mut case_study_order: Vec<String> = case_study_map.keys().cloned().collect();
        case_study_order.sort_by(|left, right| {
            case_study_map[right]
                .publication_date
                .cmp(&case_study_map[left].publication_date)
                .then_with(|| left.cmp(right))
        });
        stats.case_studies = case_study_map.len();

        let index = Self {
            snapshot_id: Uuid::new_v4(),
            built_at: Utc::now(),
            published_at,
            stats,
            segmentations: segmentation_map,
            segmentation_order,
            segments: segment_map,
            segments_by_segmentation,
            themes: theme_map,
            theme_order,
            variables: variable_map,
            variable_order,
            variables_by_theme,
            segments_by_variable,
            segment_metrics,
            sample_metrics,
            regions: region_map,
            regions_by_country,
            distribution_by_segment,
            distribution_by_region,
            case_studies: case_study_map,
            case_study_order,
        };
        debug!(snapshot_id = %index.snapshot_id, ?stats, "catalog index built");
        Ok(index)
    }
}

fn insert_unique<T>(
    map: &mut HashMap<String, T>,
    id: String,
    value: T,
    kind: &'static str,
) -> Result<(), CatalogError> {
    match map.entry(id) {
        Entry::Occupied(existing) => Err(CatalogError::Duplicate {
            kind,
            id: existing.key().clone(),
        }),
        Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(())
        }
    }
}

fn dangling(kind: &'static str, id: &str, target: &'static str, target_id: &str) -> CatalogError {
    CatalogError::DanglingReference {
        kind,
        id: id.to_string(),
        target,
        target_id: target_id.to_string(),
    }
}

fn ensure_percentage(
    value: f64,
    kind: &'static str,
    id: &str,
    field: &str,
) -> Result<(), CatalogError> {
    if value.is_finite() && (0.0..=PERCENT_TOTAL).contains(&value) {
        return Ok(());
    }
    Err(CatalogError::InvalidValue {
        kind,
        id: id.to_string(),
        message: format!("{field} {value} is outside 0-100"),
    })
}

fn check_total(options: &CatalogBuildOptions, scope: String, total: f64) -> Result<(), CatalogError> {
    let limit = options.total_limit();
    if total <= limit {
        return Ok(());
    }
    if options.strict_totals {
        return Err(CatalogError::TotalExceeded { scope, total, limit });
    }
    warn!(%scope, total, limit, "percentage total above tolerance; serving as published");
    Ok(())
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys
}

fn sort_by_weight<F>(entries: &mut [Concentration], tie_key: F)
where
    F: Fn(&Concentration) -> &String,
{
    entries.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| tie_key(a).cmp(tie_key(b)))
    });
}

fn metric_label(metric: &MetricValue) -> String {
    metric.segment_id.as_deref().map_or_else(
        || format!("{}/sample/{}", metric.segmentation_code, metric.variable_id),
        |segment_id| format!("{segment_id}/{}", metric.variable_id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathways_store::models::{
        DataType,
        PublicationStatus,
        Region,
        RegionKind,
        Segment,
        SegmentNarrative,
        Segmentation,
        Stratum,
        Theme,
        ThemeKind,
        Variable,
        VariableType,
        VulnerabilityLevel,
    };

    fn segmentation(code: &str, country_code: &str, country: &str) -> Segmentation {
        Segmentation {
            code: code.to_string(),
            country_code: country_code.to_string(),
            country: country.to_string(),
            status: PublicationStatus::Active,
            description: None,
            source: None,
            methodology: None,
            population_size: None,
            sample_size: None,
            geographic_coverage: None,
            representativeness: None,
        }
    }

    fn segment(id: &str, segmentation_code: &str, code: &str, prevalence: f64) -> Segment {
        Segment {
            id: id.to_string(),
            segmentation_code: segmentation_code.to_string(),
            code: code.to_string(),
            name: format!("Segment {code}"),
            vulnerability_level: VulnerabilityLevel::More,
            stratum: Stratum::Rural,
            prevalence,
            sample_size: None,
            profile_ref: None,
            narrative: SegmentNarrative::default(),
        }
    }

    fn base_snapshot() -> Snapshot {
        Snapshot {
            segmentations: vec![
                segmentation("SN", "SEN", "Senegal"),
                segmentation("KE", "KEN", "Kenya"),
            ],
            segments: vec![
                segment("KE-R2", "KE", "R2", 31.0),
                segment("KE-R1", "KE", "R1", 22.0),
                segment("SN-U1", "SN", "U1", 40.0),
            ],
            themes: vec![Theme {
                id: "maternal_health".to_string(),
                kind: ThemeKind::Theme,
                name: "Maternal Health".to_string(),
                description: None,
                order: 1,
            }],
            variables: vec![Variable {
                id: "anc4".to_string(),
                name: "Four or more ANC visits".to_string(),
                unit: Some("%".to_string()),
                description: None,
                data_type: DataType::Binary,
                variable_type: VariableType::Outcome,
                theme_ids: vec!["maternal_health".to_string(), "maternal_health".to_string()],
                keywords: vec![],
                order: 0,
            }],
            regions: vec![
                Region {
                    code: "KE-NAI".to_string(),
                    country_code: "KEN".to_string(),
                    name: "Nairobi".to_string(),
                    kind: RegionKind::Region,
                },
                Region {
                    code: "KE-KIS".to_string(),
                    country_code: "KEN".to_string(),
                    name: "Kisumu".to_string(),
                    kind: RegionKind::Region,
                },
            ],
            ..Snapshot::default()
        }
    }

    fn metric(segment_id: Option<&str>, variable_id: &str, value: f64) -> MetricValue {
        MetricValue {
            segmentation_code: "KE".to_string(),
            segment_id: segment_id.map(str::to_string),
            variable_id: variable_id.to_string(),
            value,
            standard_error: None,
            median: None,
            min: None,
            max: None,
            sample_size: None,
            levels: vec![],
        }
    }

    fn concentration(segment_id: &str, region_code: &str, weight: f64) -> Concentration {
        Concentration {
            segment_id: segment_id.to_string(),
            region_code: region_code.to_string(),
            weight,
        }
    }

    #[test]
    fn orders_segmentations_by_country_and_segments_by_code() {
        let index = CatalogIndex::build(base_snapshot(), &CatalogBuildOptions::default())
            .expect("snapshot should build");

        let countries: Vec<&str> = index.segmentations().map(|s| s.country.as_str()).collect();
        assert_eq!(countries, vec!["Kenya", "Senegal"]);
        assert_eq!(index.segment_ids_for("KE"), ["KE-R1", "KE-R2"]);
        assert_eq!(index.variable_ids_for_theme("maternal_health"), ["anc4"]);
        assert_eq!(index.stats().active_segmentations, 2);
    }

    #[test]
    fn rejects_segment_with_unknown_segmentation() {
        let mut snapshot = base_snapshot();
        snapshot.segments.push(segment("UG-R1", "UG", "R1", 10.0));

        let err = CatalogIndex::build(snapshot, &CatalogBuildOptions::default())
            .expect_err("dangling segment should fail");
        assert!(matches!(err, CatalogError::DanglingReference { target: "segmentation", .. }));
    }

    #[test]
    fn rejects_second_active_segmentation_for_country() {
        let mut snapshot = base_snapshot();
        snapshot
            .segmentations
            .push(segmentation("KE_2014", "KEN", "Kenya"));

        let err = CatalogIndex::build(snapshot.clone(), &CatalogBuildOptions::default())
            .expect_err("two active studies should fail");
        assert!(matches!(err, CatalogError::ConflictingActive { .. }));

        if let Some(old) = snapshot.segmentations.last_mut() {
            old.status = PublicationStatus::Inactive;
        }
        let index = CatalogIndex::build(snapshot, &CatalogBuildOptions::default())
            .expect("inactive duplicate is allowed");
        assert_eq!(index.stats().active_segmentations, 2);
        assert_eq!(index.stats().segmentations, 3);
    }

    #[test]
    fn prevalence_total_respects_tolerance() {
        let mut snapshot = base_snapshot();
        snapshot.segments.push(segment("KE-U1", "KE", "U1", 47.4));
        CatalogIndex::build(snapshot.clone(), &CatalogBuildOptions::default())
            .expect("100.4 is within tolerance");

        if let Some(last) = snapshot.segments.last_mut() {
            last.prevalence = 48.0;
        }
        let err = CatalogIndex::build(snapshot.clone(), &CatalogBuildOptions::default())
            .expect_err("101 exceeds the strict limit");
        assert!(matches!(err, CatalogError::TotalExceeded { .. }));

        let lenient = CatalogBuildOptions::default().with_strict_totals(false);
        CatalogIndex::build(snapshot, &lenient).expect("lenient build serves as published");
    }

    #[test]
    fn geographic_weight_total_respects_tolerance() {
        let mut snapshot = base_snapshot();
        snapshot.concentrations = vec![
            concentration("KE-R1", "KE-NAI", 60.0),
            concentration("KE-R1", "KE-KIS", 41.0),
        ];
        let err = CatalogIndex::build(snapshot.clone(), &CatalogBuildOptions::default())
            .expect_err("101 exceeds the strict limit");
        assert!(matches!(
            err,
            CatalogError::TotalExceeded { ref scope, .. } if scope.contains("'KE-R1'")
        ));

        let lenient = CatalogBuildOptions::default().with_strict_totals(false);
        let index = CatalogIndex::build(snapshot, &lenient).expect("lenient build serves as published");
        assert_eq!(index.distribution_for_segment("KE-R1").len(), 2);
    }

    #[test]
    fn reports_first_exceeded_total_by_code() {
        let mut snapshot = base_snapshot();
        snapshot.segments.push(segment("SN-R1", "SN", "R1", 65.0));
        snapshot.segments.push(segment("KE-U1", "KE", "U1", 50.0));
        for _ in 0..8 {
            let err = CatalogIndex::build(snapshot.clone(), &CatalogBuildOptions::default())
                .expect_err("both studies exceed the limit");
            assert!(matches!(
                err,
                CatalogError::TotalExceeded { ref scope, .. } if scope.contains("'KE'")
            ));
        }
    }

    #[test]
    fn rejects_reserved_theme_id() {
        let mut snapshot = base_snapshot();
        snapshot.themes.push(Theme {
            id: UNCLASSIFIED_GROUP.to_string(),
            kind: ThemeKind::Domain,
            name: "Other".to_string(),
            description: None,
            order: 9,
        });
        let err = CatalogIndex::build(snapshot, &CatalogBuildOptions::default())
            .expect_err("reserved id");
        assert!(matches!(err, CatalogError::InvalidValue { kind: "theme", .. }));
    }

    #[test]
    fn orders_regions_by_name_ignoring_case() {
        let mut snapshot = base_snapshot();
        snapshot.regions.push(Region {
            code: "KE-ELD".to_string(),
            country_code: "KEN".to_string(),
            name: "eldoret".to_string(),
            kind: RegionKind::District,
        });
        let index = CatalogIndex::build(snapshot, &CatalogBuildOptions::default())
            .expect("snapshot should build");
        assert_eq!(index.region_codes_for_country("KEN"), ["KE-ELD", "KE-KIS", "KE-NAI"]);
    }

    #[test]
    fn indexes_sparse_metrics_and_sample_totals() {
        let mut snapshot = base_snapshot();
        snapshot.metrics = vec![
            metric(Some("KE-R1"), "anc4", 41.5),
            metric(None, "anc4", 55.0),
        ];
        let index = CatalogIndex::build(snapshot, &CatalogBuildOptions::default())
            .expect("snapshot should build");

        assert!(index.segment_metrics("KE-R1").is_some_and(|m| m.contains_key("anc4")));
        assert!(index.segment_metrics("KE-R2").is_none());
        assert!(index.sample_metrics("KE").is_some_and(|m| m.len() == 1));
        assert_eq!(index.segments_with_variable("anc4"), ["KE-R1"]);
    }

    #[test]
    fn rejects_duplicate_metric_for_segment() {
        let mut snapshot = base_snapshot();
        snapshot.metrics = vec![
            metric(Some("KE-R1"), "anc4", 41.5),
            metric(Some("KE-R1"), "anc4", 42.0),
        ];
        let err = CatalogIndex::build(snapshot, &CatalogBuildOptions::default())
            .expect_err("duplicate metric should fail");
        assert!(matches!(err, CatalogError::Duplicate { kind: "metric", .. }));
    }

    #[test]
    fn rejects_proportion_above_hundred() {
        let mut snapshot = base_snapshot();
        snapshot.metrics = vec![metric(Some("KE-R1"), "anc4", 104.0)];
        let err = CatalogIndex::build(snapshot, &CatalogBuildOptions::default())
            .expect_err("binary variable is a percentage");
        assert!(matches!(err, CatalogError::InvalidValue { kind: "metric", .. }));
    }

    #[test]
    fn sorts_distribution_by_weight_descending() {
        let mut snapshot = base_snapshot();
        snapshot.concentrations = vec![
            concentration("KE-R1", "KE-NAI", 12.5),
            concentration("KE-R1", "KE-KIS", 60.0),
        ];
        let index = CatalogIndex::build(snapshot, &CatalogBuildOptions::default())
            .expect("snapshot should build");

        let weights: Vec<f64> = index
            .distribution_for_segment("KE-R1")
            .iter()
            .map(|entry| entry.weight)
            .collect();
        assert_eq!(weights, vec![60.0, 12.5]);
    }

    #[test]
    fn rejects_region_outside_segment_country() {
        let mut snapshot = base_snapshot();
        snapshot.concentrations = vec![concentration("SN-U1", "KE-NAI", 10.0)];
        let err = CatalogIndex::build(snapshot, &CatalogBuildOptions::default())
            .expect_err("cross-country concentration should fail");
        assert!(matches!(err, CatalogError::InvalidValue { kind: "concentration", .. }));
    }
}
