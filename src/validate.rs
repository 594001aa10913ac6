use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

/// Why a candidate path was rejected, in check-priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The path contains a parent-directory traversal token.
    TraversalToken,
    /// The path is empty or whitespace-only.
    EmptyPath,
    /// The path is the protected root or one of its ancestors; scanning it
    /// would sweep the protected data store into the upload.
    AncestorOfProtectedRoot,
    /// The path lies inside the protected root.
    InsideProtectedRoot,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TraversalToken => {
                write!(f, "path contains a parent-directory traversal token")
            }
            ValidationError::EmptyPath => write!(f, "path is empty"),
            ValidationError::AncestorOfProtectedRoot => {
                write!(f, "path contains the protected root")
            }
            ValidationError::InsideProtectedRoot => {
                write!(f, "path is inside the protected root")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Target prefixes a symlink may never point into, regardless of the
/// configured protected root.
const SENSITIVE_DIRS: &[&str] = &["/etc", "/root", "/home", "/proc", "/sys"];

/// Gatekeeper for every path the pipeline touches.
///
/// The protected root is supplied once at construction and normalized there;
/// `validate` never re-normalizes it per call. When no protected root is
/// available the ancestor/descendant rules become no-ops while the traversal
/// and empty-path checks stay active.
#[derive(Debug)]
pub struct PathValidator {
    protected_root: Option<PathBuf>,
}

impl PathValidator {
    pub fn new(protected_root: Option<PathBuf>) -> Self {
        let protected_root = protected_root.map(|root| normalize(&root));
        debug!(protected_root = ?protected_root, "Path validator initialized");
        Self { protected_root }
    }

    /// Checks a candidate path against the traversal, empty-path, and
    /// protected-root rules, in that priority order.
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if Path::new(path)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(ValidationError::TraversalToken);
        }
        if path.trim().is_empty() {
            return Err(ValidationError::EmptyPath);
        }
        if let Some(root) = &self.protected_root {
            let candidate = normalize(Path::new(path));
            if root.starts_with(&candidate) {
                return Err(ValidationError::AncestorOfProtectedRoot);
            }
            if candidate.starts_with(root) {
                return Err(ValidationError::InsideProtectedRoot);
            }
        }
        Ok(())
    }

    /// Advisory check on a symlink's target: resolves it relative to the
    /// link's containing directory and reports whether the resolved target
    /// stays clear of the protected root and the fixed sensitive prefixes.
    ///
    /// This never aborts anything; callers record the verdict and move on.
    pub fn symlink_target_is_safe(&self, target: &Path, source_dir: &Path) -> bool {
        let resolved = if target.is_absolute() {
            normalize(target)
        } else {
            normalize(&source_dir.join(target))
        };
        if let Some(root) = &self.protected_root {
            if resolved.starts_with(root) {
                warn!(
                    target = %resolved.display(),
                    "Symlink target resolves into the protected root"
                );
                return false;
            }
        }
        for prefix in SENSITIVE_DIRS {
            if resolved.starts_with(prefix) {
                warn!(
                    target = %resolved.display(),
                    prefix,
                    "Symlink target resolves into a sensitive system directory"
                );
                return false;
            }
        }
        true
    }
}

/// Lexical normalization: drops `.` components and trailing separators
/// without touching the filesystem. Parent tokens are rejected upstream, so
/// they are preserved verbatim here rather than resolved.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}
