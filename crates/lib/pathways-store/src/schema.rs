pub const COLLECTION_SEGMENTATION: &str = "segmentation";
pub const COLLECTION_SEGMENT: &str = "segment";
pub const COLLECTION_THEME: &str = "theme";
pub const COLLECTION_VARIABLE: &str = "variable";
pub const COLLECTION_METRIC: &str = "metric";
pub const COLLECTION_REGION: &str = "region";
pub const COLLECTION_CONCENTRATION: &str = "concentration";
pub const COLLECTION_CASE_STUDY: &str = "case_study";

/// Upper bound for prevalence and concentration totals, in percent.
pub const PERCENT_TOTAL: f64 = 100.0;

/// Default rounding tolerance applied to percentage totals.
pub const DEFAULT_TOTAL_TOLERANCE: f64 = 0.5;

/// Group key used for metrics whose variable has no theme or domain.
pub const UNCLASSIFIED_GROUP: &str = "other";
