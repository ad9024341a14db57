//! Snapshot store.
//!
//! The store layer reads complete snapshot bundles published upstream. It never
//! reconciles partial data; a bundle either parses as a whole or is rejected.

pub mod file;

pub use file::{SnapshotFile, SnapshotFormat, StoreError, StoreResult, parse_snapshot};
