use std::io::Write;
use std::time::Duration;

use futures::future::join_all;
use pathways_core::control::{ControlError, PathwaysControlPlane};
use pathways_core::services::{CatalogHandle, CatalogHandleConfig, RefreshError};
use pathways_core::store::{SnapshotFile, SnapshotFormat, parse_snapshot};
use pathways_store::models::Snapshot;

const FIXTURE: &str = include_str!("data/kenya.json");

fn fixture() -> Snapshot {
    parse_snapshot(FIXTURE, SnapshotFormat::Json).expect("fixture parses")
}

/// Fixture variant tagged through the KE description, with the segment set
/// depending on the tag.
fn tagged(tag: &str, drop_s4: bool) -> Snapshot {
    let mut snapshot = fixture();
    for segmentation in &mut snapshot.segmentations {
        if segmentation.code == "KE" {
            segmentation.description = Some(tag.to_string());
        }
    }
    if drop_s4 {
        snapshot.segments.retain(|segment| segment.id != "S4");
    }
    snapshot
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_observe_one_snapshot_per_call() {
    let handle = CatalogHandle::default();
    handle.install(tagged("full", false)).await.expect("initial install");
    let control = PathwaysControlPlane::new(handle.clone());

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let control = control.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let detail = control.get_segmentation("KE", false).expect("KE");
                    let expected: &[&str] = match detail.description.as_deref() {
                        Some("full") => &["S2", "S3", "S1", "S4"],
                        Some("trimmed") => &["S2", "S3", "S1"],
                        other => panic!("unexpected tag {other:?}"),
                    };
                    assert_eq!(detail.segment_ids, expected);
                    assert_eq!(detail.segments.len(), detail.segment_ids.len());
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    let writer = tokio::spawn(async move {
        for round in 0..50 {
            let snapshot = if round % 2 == 0 {
                tagged("trimmed", true)
            } else {
                tagged("full", false)
            };
            handle.install(snapshot).await.expect("install");
            tokio::task::yield_now().await;
        }
    });

    for result in join_all(readers).await {
        result.expect("reader task");
    }
    writer.await.expect("writer task");
}

#[tokio::test]
async fn file_refresh_keeps_last_good_snapshot() {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("temp file");
    file.write_all(FIXTURE.as_bytes()).expect("write fixture");
    file.flush().expect("flush");

    let source = SnapshotFile::new(file.path()).expect("json source");
    let handle = CatalogHandle::new(
        CatalogHandleConfig::new()
            .with_loader(source.into_loader())
            .with_refresh_interval(Duration::from_secs(3600)),
    );
    let control = PathwaysControlPlane::new(handle.clone());
    assert!(matches!(control.status(), Err(ControlError::Unavailable)));

    let report = handle.refresh().await.expect("first refresh");
    assert_eq!(report.stats.segments, 7);

    std::fs::write(file.path(), "{ not json").expect("overwrite");
    assert!(matches!(handle.refresh().await, Err(RefreshError::Store(_))));

    let status = control.status().expect("still serving");
    assert_eq!(status.snapshot_id, report.snapshot_id);
    assert_eq!(control.list_segmentations(true).expect("list").len(), 2);

    let refresher = handle.spawn_refresher().expect("loader and interval configured");
    refresher.abort();
}
