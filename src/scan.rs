//! Recursive, bounded directory traversal.
//!
//! Walks a root directory into a [`ScanResult`], applying the name filter,
//! depth/size/count limits, and hard-link cycle detection, with a fixed-size
//! pool of concurrent recursive scans per directory listing. Ordinary
//! per-entry problems never abort the walk: they are appended to the shared
//! [`FailureLog`] and the entry is skipped.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use tracing::{debug, warn};

use crate::cancel::CancelFlag;
use crate::config::Limits;
use crate::tree::{FailureLog, ScanResult, TreeNode};
use crate::validate::PathValidator;

/// Names never scanned: dotfiles and `~`-prefixed names are matched by
/// prefix, the tooling directories by full name.
const SKIPPED_NAMES: &[&str] = &["node_modules", ".git", ".vscode", ".idea"];

#[derive(Debug)]
pub enum ScanError {
    /// The directory sits deeper than the configured ceiling. Fatal to its
    /// subtree; the parent absorbs it and keeps the rest of the tree.
    DepthExceeded(PathBuf),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::DepthExceeded(path) => {
                write!(f, "depth limit exceeded at {}", path.display())
            }
        }
    }
}

impl std::error::Error for ScanError {}

#[cfg(unix)]
fn identity(meta: &std::fs::Metadata) -> (u64, u64) {
    use std::os::unix::fs::MetadataExt;
    (meta.dev(), meta.ino())
}

struct EntryOutcome {
    node: TreeNode,
    files: Vec<PathBuf>,
}

/// One scan's worth of traversal state. Created fresh per operation and
/// discarded at its end; nothing here outlives the operation.
pub struct DirectoryScanner {
    limits: Limits,
    validator: Arc<PathValidator>,
    cancel: CancelFlag,
    failures: FailureLog,
    /// Device+inode pairs of directories already entered, for hard-link and
    /// bind-mount cycle detection.
    visited: Mutex<HashSet<(u64, u64)>>,
    file_count: AtomicUsize,
    /// Basename memoization, owned by this scan only.
    name_cache: Mutex<HashMap<PathBuf, String>>,
}

impl DirectoryScanner {
    pub fn new(
        limits: Limits,
        validator: Arc<PathValidator>,
        cancel: CancelFlag,
        failures: FailureLog,
    ) -> Self {
        Self {
            limits,
            validator,
            cancel,
            failures,
            visited: Mutex::new(HashSet::new()),
            file_count: AtomicUsize::new(0),
            name_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Walks `root` into a tree plus the flat file list. An unreadable root
    /// yields an empty result with the failure logged, not an error; only a
    /// root already past the depth ceiling errors, and the orchestrator
    /// treats that as an empty scan as well.
    pub async fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_dir(root.to_path_buf(), 0).await
    }

    /// Recursive walk. Checks cancellation first and returns an empty partial
    /// result when set; a chain of `max_depth` directories below the root
    /// still scans, one level deeper is refused.
    fn scan_dir(&self, dir: PathBuf, depth: usize) -> BoxFuture<'_, Result<ScanResult, ScanError>> {
        async move {
            if self.cancel.is_cancelled() {
                debug!(path = %dir.display(), "Scan cancelled, returning partial result");
                return Ok(ScanResult::default());
            }
            if depth > self.limits.max_depth {
                return Err(ScanError::DepthExceeded(dir));
            }

            let mut listing = match tokio::fs::read_dir(&dir).await {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(error = ?e, path = %dir.display(), "Failed to list directory");
                    self.failures.push(&dir);
                    return Ok(ScanResult::default());
                }
            };

            // Collect entries first so the node order is the filesystem
            // listing order, independent of which worker finishes when.
            let mut entries: Vec<(PathBuf, std::fs::FileType)> = Vec::new();
            loop {
                match listing.next_entry().await {
                    Ok(Some(entry)) => match entry.file_type().await {
                        Ok(file_type) => entries.push((entry.path(), file_type)),
                        Err(e) => {
                            warn!(error = ?e, path = %entry.path().display(), "Failed to stat entry");
                            self.failures.push(entry.path());
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = ?e, path = %dir.display(), "Failed to read directory entry");
                        self.failures.push(&dir);
                        break;
                    }
                }
            }

            // `buffered` bounds the in-flight recursive scans and yields
            // outcomes in input order, which keeps children in listing order.
            let outcomes: Vec<Option<EntryOutcome>> = stream::iter(entries)
                .map(|(path, file_type)| self.scan_entry(path, file_type, depth))
                .buffered(self.limits.scan_workers.max(1))
                .collect()
                .await;

            let mut result = ScanResult::default();
            for outcome in outcomes.into_iter().flatten() {
                result.tree.push(outcome.node);
                result.file_paths.extend(outcome.files);
            }
            Ok(result)
        }
        .boxed()
    }

    /// Handles one directory entry; returns `None` when the entry is
    /// filtered, dropped, or failed.
    async fn scan_entry(
        &self,
        path: PathBuf,
        file_type: std::fs::FileType,
        depth: usize,
    ) -> Option<EntryOutcome> {
        let name = self.display_name(&path);
        if is_filtered(&name) {
            debug!(name = %name, "Entry excluded by name filter");
            return None;
        }

        if file_type.is_symlink() {
            return Some(self.scan_symlink(path, name).await);
        }
        if file_type.is_dir() {
            return self.scan_subdirectory(path, name, depth).await;
        }
        self.scan_file(path, name).await
    }

    /// Symlinks are never followed: each is recorded inert with its raw
    /// target. The safety check on the resolved target is advisory only.
    async fn scan_symlink(&self, path: PathBuf, name: String) -> EntryOutcome {
        let target = match tokio::fs::read_link(&path).await {
            Ok(target) => {
                let source_dir = path.parent().unwrap_or(Path::new("/"));
                if !self.validator.symlink_target_is_safe(&target, source_dir) {
                    warn!(
                        link = %path.display(),
                        target = %target.display(),
                        "Symlink target flagged unsafe; recording inert"
                    );
                }
                Some(target.to_string_lossy().into_owned())
            }
            Err(e) => {
                warn!(error = ?e, link = %path.display(), "Failed to read symlink target");
                self.failures.push(&path);
                None
            }
        };
        EntryOutcome {
            node: TreeNode::symlink(name, target),
            files: Vec::new(),
        }
    }

    async fn scan_file(&self, path: PathBuf, name: String) -> Option<EntryOutcome> {
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!(error = ?e, path = %path.display(), "Failed to stat file");
                self.failures.push(&path);
                return None;
            }
        };
        if meta.len() > self.limits.max_file_size {
            warn!(
                path = %path.display(),
                size = meta.len(),
                limit = self.limits.max_file_size,
                "File exceeds size ceiling, skipping"
            );
            self.failures.push(&path);
            return None;
        }
        if self.file_count.fetch_add(1, Ordering::SeqCst) >= self.limits.max_file_count {
            debug!(path = %path.display(), "File-count ceiling reached, dropping file");
            return None;
        }
        Some(EntryOutcome {
            node: TreeNode::file(name, &path),
            files: vec![path],
        })
    }

    async fn scan_subdirectory(
        &self,
        path: PathBuf,
        name: String,
        depth: usize,
    ) -> Option<EntryOutcome> {
        // The protected root may sit anywhere below the scanned folder;
        // refuse to descend into it rather than sweep it into the upload.
        if let Err(reason) = self.validator.validate(&path.to_string_lossy()) {
            warn!(path = %path.display(), %reason, "Skipping directory rejected by validator");
            return None;
        }

        match tokio::fs::metadata(&path).await {
            Ok(meta) => {
                #[cfg(unix)]
                {
                    let id = identity(&meta);
                    let first_visit = self
                        .visited
                        .lock()
                        .expect("visited set poisoned")
                        .insert(id);
                    if !first_visit {
                        warn!(path = %path.display(), "Directory identity already visited, skipping cycle");
                        return None;
                    }
                }
                #[cfg(not(unix))]
                let _ = &meta;
            }
            Err(e) => {
                warn!(error = ?e, path = %path.display(), "Failed to stat directory");
                self.failures.push(&path);
                return None;
            }
        }

        match self.scan_dir(path.clone(), depth + 1).await {
            Ok(sub) => Some(EntryOutcome {
                node: TreeNode::directory(name, sub.tree),
                files: sub.file_paths,
            }),
            Err(ScanError::DepthExceeded(deep)) => {
                warn!(path = %deep.display(), "Depth limit exceeded, keeping subtree as empty node");
                self.failures.push(&deep);
                Some(EntryOutcome {
                    node: TreeNode::directory(name, Vec::new()),
                    files: Vec::new(),
                })
            }
        }
    }

    fn display_name(&self, path: &Path) -> String {
        let mut cache = self.name_cache.lock().expect("name cache poisoned");
        if let Some(name) = cache.get(path) {
            return name.clone();
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        cache.insert(path.to_path_buf(), name.clone());
        name
    }
}

fn is_filtered(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('~') || SKIPPED_NAMES.contains(&name)
}
