use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use pathways_store::models::Snapshot;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{CatalogBuildOptions, CatalogError, CatalogIndex, CatalogStats, CatalogStatus};
use crate::control::ControlError;
use crate::store::StoreError;

pub type LoadSnapshotFuture =
    Pin<Box<dyn Future<Output = Result<Snapshot, StoreError>> + Send + 'static>>;
pub type LoadSnapshotFn = Arc<dyn Fn() -> LoadSnapshotFuture + Send + Sync + 'static>;

/// Configuration for the catalog handle and its refresh source.
#[derive(Clone, Default)]
pub struct CatalogHandleConfig {
    pub build_options: CatalogBuildOptions,
    pub loader: Option<LoadSnapshotFn>,
    pub refresh_interval: Option<Duration>,
}

impl CatalogHandleConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_build_options(mut self, build_options: CatalogBuildOptions) -> Self {
        self.build_options = build_options;
        self
    }

    #[must_use]
    pub fn with_loader(mut self, loader: LoadSnapshotFn) -> Self {
        self.loader = Some(loader);
        self
    }

    #[must_use]
    pub const fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = Some(refresh_interval);
        self
    }
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("snapshot rejected: {0}")]
    Catalog(#[from] CatalogError),
    #[error("a refresh is already in progress")]
    InProgress,
    #[error("no snapshot source is configured")]
    NoSource,
    #[error("catalog build task failed: {0}")]
    Build(#[from] tokio::task::JoinError),
}

/// Outcome of a successful swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub snapshot_id: Uuid,
    pub built_at: DateTime<Utc>,
    pub stats: CatalogStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_snapshot_id: Option<Uuid>,
}

/// Shared, atomically swappable view of the current catalog index.
#[derive(Clone)]
pub struct CatalogHandle {
    inner: Arc<CatalogHandleInner>,
}

/// Internal handle state shared across clones.
struct CatalogHandleInner {
    current: ArcSwapOption<CatalogIndex>,
    refresh_lock: Mutex<()>,
    config: CatalogHandleConfig,
}

impl Default for CatalogHandle {
    fn default() -> Self {
        Self::new(CatalogHandleConfig::default())
    }
}

impl CatalogHandle {
    #[must_use]
    pub fn new(config: CatalogHandleConfig) -> Self {
        Self {
            inner: Arc::new(CatalogHandleInner {
                current: ArcSwapOption::empty(),
                refresh_lock: Mutex::new(()),
                config,
            }),
        }
    }

    /// Returns the index readers should answer from.
    ///
    /// # Errors
    /// Returns `ControlError::Unavailable` before the first successful refresh.
    pub fn snapshot(&self) -> Result<Arc<CatalogIndex>, ControlError> {
        self.inner
            .current
            .load_full()
            .ok_or(ControlError::Unavailable)
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.current.load().is_some()
    }

    #[must_use]
    pub fn status(&self) -> Option<CatalogStatus> {
        self.inner.current.load_full().map(|index| index.status())
    }

    #[must_use]
    pub fn has_source(&self) -> bool {
        self.inner.config.loader.is_some()
    }

    /// Builds and installs a snapshot delivered by the caller.
    ///
    /// # Errors
    /// Returns `RefreshError::InProgress` if another refresh holds the lock and
    /// `RefreshError::Catalog` if the snapshot fails validation. The current
    /// index is untouched on error.
    pub async fn install(&self, snapshot: Snapshot) -> Result<RefreshReport, RefreshError> {
        let _guard = self
            .inner
            .refresh_lock
            .try_lock()
            .map_err(|_| RefreshError::InProgress)?;
        self.swap_in(snapshot).await
    }

    /// Reloads from the configured source and installs the result.
    ///
    /// # Errors
    /// Returns `RefreshError::NoSource` without a loader, `RefreshError::InProgress`
    /// if another refresh is running, and load or validation errors otherwise.
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let loader = self
            .inner
            .config
            .loader
            .clone()
            .ok_or(RefreshError::NoSource)?;
        let _guard = self
            .inner
            .refresh_lock
            .try_lock()
            .map_err(|_| RefreshError::InProgress)?;
        let snapshot = (loader)().await?;
        self.swap_in(snapshot).await
    }

    /// Builds off the async workers; large snapshots take a while to index.
    async fn swap_in(&self, snapshot: Snapshot) -> Result<RefreshReport, RefreshError> {
        let options = self.inner.config.build_options;
        let index = tokio::task::spawn_blocking(move || CatalogIndex::build(snapshot, &options))
            .await??;
        let index = Arc::new(index);
        let report = RefreshReport {
            snapshot_id: index.snapshot_id(),
            built_at: index.built_at(),
            stats: index.stats(),
            previous_snapshot_id: None,
        };
        let previous = self.inner.current.swap(Some(index));
        let report = RefreshReport {
            previous_snapshot_id: previous.map(|index| index.snapshot_id()),
            ..report
        };
        info!(
            snapshot_id = %report.snapshot_id,
            previous = ?report.previous_snapshot_id,
            segmentations = report.stats.segmentations,
            segments = report.stats.segments,
            metrics = report.stats.metrics,
            "catalog snapshot installed"
        );
        Ok(report)
    }

    /// Spawns the periodic refresher when both a loader and an interval are set.
    #[must_use]
    pub fn spawn_refresher(self) -> Option<tokio::task::JoinHandle<()>> {
        let interval = self.inner.config.refresh_interval?;
        self.inner.config.loader.as_ref()?;
        let handle = self;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match handle.refresh().await {
                    Ok(_) => {}
                    Err(RefreshError::InProgress) => {
                        debug!("scheduled refresh skipped; another refresh is running");
                    }
                    Err(err) => warn!(error = %err, "scheduled refresh failed; keeping current snapshot"),
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pathways_store::models::{PublicationStatus, Segmentation};
    use tokio::sync::Notify;

    fn snapshot(code: &str) -> Snapshot {
        Snapshot {
            segmentations: vec![Segmentation {
                code: code.to_string(),
                country_code: "KEN".to_string(),
                country: "Kenya".to_string(),
                status: PublicationStatus::Active,
                description: None,
                source: None,
                methodology: None,
                population_size: None,
                sample_size: None,
                geographic_coverage: None,
                representativeness: None,
            }],
            ..Snapshot::default()
        }
    }

    #[tokio::test]
    async fn install_swaps_and_reports_previous() {
        let handle = CatalogHandle::default();
        assert!(matches!(handle.snapshot(), Err(ControlError::Unavailable)));

        let first = handle.install(snapshot("KE")).await.expect("first install");
        assert!(first.previous_snapshot_id.is_none());
        let second = handle.install(snapshot("KE")).await.expect("second install");
        assert_eq!(second.previous_snapshot_id, Some(first.snapshot_id));
        assert_eq!(
            handle.snapshot().expect("loaded").snapshot_id(),
            second.snapshot_id
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn install_builds_on_single_threaded_runtime() {
        let handle = CatalogHandle::default();
        let reader = handle.clone();
        let report = handle.install(snapshot("SN")).await.expect("install");
        assert_eq!(reader.snapshot().expect("loaded").snapshot_id(), report.snapshot_id);
    }

    #[tokio::test]
    async fn rejected_snapshot_keeps_current() {
        let handle = CatalogHandle::default();
        let report = handle.install(snapshot("KE")).await.expect("install");

        let mut broken = snapshot("KE");
        broken.segmentations.push(broken.segmentations[0].clone());
        let err = handle.install(broken).await.expect_err("duplicate should fail");
        assert!(matches!(err, RefreshError::Catalog(_)));
        assert_eq!(
            handle.snapshot().expect("still loaded").snapshot_id(),
            report.snapshot_id
        );
    }

    #[tokio::test]
    async fn refresh_without_source_fails() {
        let handle = CatalogHandle::default();
        assert!(matches!(handle.refresh().await, Err(RefreshError::NoSource)));
        assert!(handle.clone().spawn_refresher().is_none());
    }

    #[tokio::test]
    async fn concurrent_refresh_is_rejected() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let loader: LoadSnapshotFn = {
            let started = started.clone();
            let release = release.clone();
            let calls = calls.clone();
            Arc::new(move || -> LoadSnapshotFuture {
                let started = started.clone();
                let release = release.clone();
                let calls = calls.clone();
                Box::pin(async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    started.notify_one();
                    release.notified().await;
                    Ok(snapshot("KE"))
                })
            })
        };
        let handle = CatalogHandle::new(CatalogHandleConfig::new().with_loader(loader));

        let background = handle.clone();
        let running = tokio::spawn(async move { background.refresh().await });
        started.notified().await;

        assert!(matches!(handle.install(snapshot("KE")).await, Err(RefreshError::InProgress)));
        assert!(matches!(handle.refresh().await, Err(RefreshError::InProgress)));

        release.notify_one();
        let report = running.await.expect("join").expect("refresh succeeds");
        assert_eq!(report.stats.segmentations, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(handle.is_loaded());
    }
}
