use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// What kind of filesystem entry a [`TreeNode`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
    Symlink,
}

/// One filesystem entry discovered during a scan.
///
/// A File node carries at most one of `source_path` and `url` once rendering
/// occurs: `source_path` is cleared the moment a URL is assigned or the upload
/// is known to have failed, so a rendered File node is either linked (`url`
/// present) or unlinked (neither present). A Directory node's `children` keep
/// filesystem listing order. A Symlink node never has children.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub kind: NodeKind,
    /// Absolute path at scan time; File nodes only.
    pub source_path: Option<PathBuf>,
    /// Stable reference returned by the asset store; File nodes only.
    pub url: Option<String>,
    /// Directory nodes only; insertion order = scan order.
    pub children: Vec<TreeNode>,
    /// Symlink nodes only; the raw, unresolved link text.
    pub link_target: Option<String>,
}

impl TreeNode {
    pub fn file(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::File,
            source_path: Some(source_path.into()),
            url: None,
            children: Vec::new(),
            link_target: None,
        }
    }

    pub fn directory(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Directory,
            source_path: None,
            url: None,
            children,
            link_target: None,
        }
    }

    pub fn symlink(name: impl Into<String>, target: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Symlink,
            source_path: None,
            url: None,
            children: Vec::new(),
            link_target: target,
        }
    }
}

/// Output of one directory scan: the tree plus a flat list of every regular
/// file recorded in it, so the upload phase never re-walks the tree.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub tree: Vec<TreeNode>,
    pub file_paths: Vec<PathBuf>,
}

/// Append-only list of paths that failed at any stage (oversized, unreadable,
/// upload rejected). Not deduplicated. Owned by a single operation and created
/// fresh at its start; entry order across concurrent workers is unspecified.
#[derive(Clone, Debug, Default)]
pub struct FailureLog(Arc<Mutex<Vec<PathBuf>>>);

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: impl AsRef<Path>) {
        self.0
            .lock()
            .expect("failure log poisoned")
            .push(path.as_ref().to_path_buf());
    }

    /// Snapshot of the recorded paths.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.0.lock().expect("failure log poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().expect("failure log poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
