use std::path::{Path, PathBuf};
use std::sync::Arc;

use pathways_store::models::Snapshot;
use thiserror::Error;
use tracing::debug;

use crate::services::{LoadSnapshotFn, LoadSnapshotFuture};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read snapshot {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML snapshot: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported snapshot format for {} (expected .json or .toml)", .0.display())]
    UnsupportedFormat(PathBuf),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Serialization format of a snapshot bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Toml,
}

impl SnapshotFormat {
    /// Infers the format from a file extension.
    ///
    /// # Errors
    /// Returns `StoreError::UnsupportedFormat` for anything but `.json` or `.toml`.
    pub fn from_path(path: &Path) -> StoreResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(StoreError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Parses a snapshot bundle from text.
///
/// # Errors
/// Returns `StoreError` if the text is not a valid bundle in the given format.
pub fn parse_snapshot(text: &str, format: SnapshotFormat) -> StoreResult<Snapshot> {
    let snapshot = match format {
        SnapshotFormat::Json => serde_json::from_str(text)?,
        SnapshotFormat::Toml => toml::from_str(text)?,
    };
    Ok(snapshot)
}

/// Snapshot bundle published as a file on disk.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    format: SnapshotFormat,
}

impl SnapshotFile {
    /// Creates a file source, inferring the format from the extension.
    ///
    /// # Errors
    /// Returns `StoreError::UnsupportedFormat` if the extension is not recognised.
    pub fn new(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let format = SnapshotFormat::from_path(&path)?;
        Ok(Self { path, format })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn format(&self) -> SnapshotFormat {
        self.format
    }

    /// Reads and parses the whole bundle.
    ///
    /// # Errors
    /// Returns `StoreError` if the file cannot be read or parsed.
    pub async fn load(&self) -> StoreResult<Snapshot> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;
        let snapshot = parse_snapshot(&text, self.format)?;
        debug!(
            path = %self.path.display(),
            segmentations = snapshot.segmentations.len(),
            segments = snapshot.segments.len(),
            metrics = snapshot.metrics.len(),
            "snapshot file parsed"
        );
        Ok(snapshot)
    }

    /// Wraps this source as a loader for the catalog handle.
    #[must_use]
    pub fn into_loader(self) -> LoadSnapshotFn {
        let source = Arc::new(self);
        Arc::new(move || -> LoadSnapshotFuture {
            let source = source.clone();
            Box::pin(async move { source.load().await })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOML_BUNDLE: &str = r#"
published_at = "2026-03-01T00:00:00Z"

[[segmentations]]
code = "KE"
country_code = "KEN"
country = "Kenya"

[[segments]]
id = "S1"
segmentation_code = "KE"
code = "U1"
name = "Urban 1"
vulnerability_level = "most vulnerable"
stratum = "urban"
prevalence = 22.0
"#;

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(
            SnapshotFormat::from_path(Path::new("data/pathways.JSON")).ok(),
            Some(SnapshotFormat::Json)
        );
        assert_eq!(
            SnapshotFormat::from_path(Path::new("pathways.toml")).ok(),
            Some(SnapshotFormat::Toml)
        );
        assert!(matches!(
            SnapshotFormat::from_path(Path::new("pathways.csv")),
            Err(StoreError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn parses_toml_bundle() {
        let snapshot = parse_snapshot(TOML_BUNDLE, SnapshotFormat::Toml).expect("toml should parse");
        assert_eq!(snapshot.segmentations.len(), 1);
        assert_eq!(snapshot.segments[0].code, "U1");
        assert!(snapshot.published_at.is_some());
        assert!(snapshot.metrics.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = parse_snapshot("{\"segments\": 3}", SnapshotFormat::Json).expect_err("should fail");
        assert!(matches!(err, StoreError::Json(_)));
    }

    #[tokio::test]
    async fn loads_bundle_from_disk() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        file.write_all(TOML_BUNDLE.as_bytes()).expect("write bundle");

        let source = SnapshotFile::new(file.path()).expect("supported format");
        assert_eq!(source.format(), SnapshotFormat::Toml);
        assert_eq!(source.path(), file.path());
        let loader = source.into_loader();
        let snapshot = loader().await.expect("bundle should load");
        assert_eq!(snapshot.segments.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let source = SnapshotFile::new("/nonexistent/pathways.json").expect("supported format");
        let err = source.load().await.expect_err("missing file should fail");
        assert!(err.to_string().contains("/nonexistent/pathways.json"));
    }
}
