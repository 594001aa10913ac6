use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Resource ceilings for one publish operation.
///
/// Every limit is configurable but ships with the documented default:
/// batches of 10 files, 3 concurrent subdirectory scans, 5 concurrent file
/// reads, depth ceiling 7, 100 MiB per file, 1000 files per operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Files submitted per upload transport call.
    pub batch_size: usize,
    /// Concurrent recursive scans per directory listing.
    pub scan_workers: usize,
    /// Concurrent file reads per batch.
    pub read_workers: usize,
    /// Deepest directory level below the root that will still be entered.
    pub max_depth: usize,
    /// Per-file byte ceiling; larger files are logged and skipped.
    pub max_file_size: u64,
    /// Total regular-file ceiling; once reached, further files are dropped.
    pub max_file_count: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            batch_size: 10,
            scan_workers: 3,
            read_workers: 5,
            max_depth: 7,
            max_file_size: 100 * 1024 * 1024,
            max_file_count: 1000,
        }
    }
}

impl Limits {
    pub fn trace_loaded(&self) {
        info!(
            batch_size = self.batch_size,
            scan_workers = self.scan_workers,
            read_workers = self.read_workers,
            max_depth = self.max_depth,
            max_file_size = self.max_file_size,
            max_file_count = self.max_file_count,
            "Loaded limits"
        );
        debug!(?self, "Limits (full debug)");
    }
}
