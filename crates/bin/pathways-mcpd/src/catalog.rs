use pathways_core::catalog::CatalogBuildOptions;
use pathways_core::services::{CatalogHandle, CatalogHandleConfig};
use pathways_core::store::{SnapshotFile, StoreError};
use tracing::info;

use crate::config::PathwaysConfig;

/// Builds the catalog handle with the configured file source and validation.
///
/// # Errors
/// Returns `StoreError` if the snapshot path has an unsupported extension.
pub fn build_catalog(config: &PathwaysConfig) -> Result<CatalogHandle, StoreError> {
    let build_options = CatalogBuildOptions::default()
        .with_total_tolerance(config.total_tolerance)
        .with_strict_totals(config.strict_totals);
    let mut handle_config = CatalogHandleConfig::new().with_build_options(build_options);

    if let Some(path) = config.snapshot_path.as_ref() {
        let source = SnapshotFile::new(path)?;
        info!(
            path = %source.path().display(),
            format = ?source.format(),
            interval = ?config.refresh_interval,
            "snapshot source configured"
        );
        handle_config = handle_config.with_loader(source.into_loader());
        if let Some(interval) = config.refresh_interval {
            handle_config = handle_config.with_refresh_interval(interval);
        }
    }

    Ok(CatalogHandle::new(handle_config))
}
