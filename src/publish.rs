//! High-level pipeline: validate → scan → upload → back-fill → render → insert.
//!
//! [`Publisher`] owns one operation at a time: the caller hands it a root
//! path and an anchor id, and it drives the full scan-and-upload pipeline,
//! back-fills the returned URLs into the tree, renders the markup, and hands
//! it to the insertion collaborator. Only a validation failure stops the
//! pipeline outright; everything else is absorbed into the failure log and
//! surfaced in aggregate through the final [`PublishReport`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::cancel::CancelFlag;
use crate::config::Limits;
use crate::contract::{AssetStore, NoteSink};
use crate::render::render;
use crate::scan::DirectoryScanner;
use crate::tree::{FailureLog, NodeKind, TreeNode};
use crate::upload::BatchUploader;
use crate::validate::{PathValidator, ValidationError};

#[derive(Debug)]
pub enum PublishError {
    /// The root path was rejected before any scanning began.
    Validation(ValidationError),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Validation(reason) => write!(f, "invalid root path: {reason}"),
        }
    }
}

impl std::error::Error for PublishError {}

/// Terse outcome of one operation; the failed-path list lives on the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    /// The scan found nothing to upload.
    EmptyFolder,
    Complete {
        uploaded: usize,
        elapsed: Duration,
    },
    Partial {
        uploaded: usize,
        total: usize,
        failed: usize,
        elapsed: Duration,
    },
}

#[derive(Debug)]
pub struct PublishReport {
    pub status: PublishStatus,
    /// Every path that failed at any stage, in log order. Not deduplicated.
    pub failed_paths: Vec<PathBuf>,
    /// The rendered markup, as handed to the insertion collaborator.
    pub markup: String,
}

/// The core's entire public surface: `run` and `cancel`.
pub struct Publisher<S: AssetStore, D: NoteSink> {
    limits: Limits,
    validator: Arc<PathValidator>,
    folder_id: String,
    store: S,
    sink: D,
    cancel: CancelFlag,
}

impl<S: AssetStore, D: NoteSink> Publisher<S, D> {
    pub fn new(
        limits: Limits,
        validator: PathValidator,
        folder_id: impl Into<String>,
        store: S,
        sink: D,
    ) -> Self {
        Self {
            limits,
            validator: Arc::new(validator),
            folder_id: folder_id.into(),
            store,
            sink,
            cancel: CancelFlag::new(),
        }
    }

    /// Requests cooperative cancellation of the operation in flight.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Handle for driving cancellation from another task.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Runs one full publish operation. All per-operation state (failure log,
    /// scan caches, cancellation flag) is created fresh here and discarded at
    /// the end; cancellation yields a partial report, never an error.
    pub async fn run(
        &self,
        root_path: &Path,
        anchor_id: &str,
    ) -> Result<PublishReport, PublishError> {
        let started = Instant::now();
        self.cancel.reset();
        let failures = FailureLog::new();

        let root_str = root_path.to_string_lossy();
        if let Err(reason) = self.validator.validate(&root_str) {
            error!(path = %root_path.display(), %reason, "Root path rejected");
            return Err(PublishError::Validation(reason));
        }
        info!(path = %root_path.display(), anchor = anchor_id, "Starting publish operation");

        let scanner = DirectoryScanner::new(
            self.limits.clone(),
            self.validator.clone(),
            self.cancel.clone(),
            failures.clone(),
        );
        let mut result = match scanner.scan(root_path).await {
            Ok(result) => result,
            Err(e) => {
                // Only a root already past the depth ceiling lands here;
                // treat it like an unreadable root.
                warn!(error = %e, "Scan failed at the root, treating as empty");
                failures.push(root_path);
                Default::default()
            }
        };
        info!(
            nodes = result.tree.len(),
            files = result.file_paths.len(),
            "Scan complete"
        );

        if result.tree.is_empty() && result.file_paths.is_empty() {
            info!(path = %root_path.display(), "Nothing to publish");
            return Ok(PublishReport {
                status: PublishStatus::EmptyFolder,
                failed_paths: failures.paths(),
                markup: render(&[], &root_name(root_path)),
            });
        }

        let uploader = BatchUploader::new(
            &self.store,
            &self.folder_id,
            &self.limits,
            &self.cancel,
            &failures,
        );
        let urls = uploader.upload(&result.file_paths).await;
        info!(
            uploaded = urls.len(),
            total = result.file_paths.len(),
            "Upload phase complete"
        );

        backfill(&mut result.tree, &urls);
        let markup = render(&result.tree, &root_name(root_path));

        if let Err(e) = self.sink.insert_after(anchor_id, &markup).await {
            // Logged only: already-uploaded files are never rolled back.
            error!(error = ?e, anchor = anchor_id, "Failed to insert rendered tree");
        }

        let total = result.file_paths.len();
        let uploaded = urls.len();
        let elapsed = started.elapsed();
        let status = if uploaded == total && failures.is_empty() {
            PublishStatus::Complete { uploaded, elapsed }
        } else {
            PublishStatus::Partial {
                uploaded,
                total,
                failed: failures.len(),
                elapsed,
            }
        };
        info!(?status, "Publish operation finished");

        Ok(PublishReport {
            status,
            failed_paths: failures.paths(),
            markup,
        })
    }
}

/// Back-fills upload URLs into the tree and clears `source_path` on every
/// File node, so each one leaves here either linked or unlinked.
fn backfill(nodes: &mut [TreeNode], urls: &HashMap<PathBuf, String>) {
    for node in nodes {
        match node.kind {
            NodeKind::File => {
                if let Some(path) = node.source_path.take() {
                    node.url = urls.get(&path).cloned();
                }
            }
            NodeKind::Directory => backfill(&mut node.children, urls),
            NodeKind::Symlink => {}
        }
    }
}

fn root_name(root_path: &Path) -> String {
    root_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root_path.to_string_lossy().into_owned())
}
