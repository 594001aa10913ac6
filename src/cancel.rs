use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

/// Shared cooperative cancellation flag for a single publish operation.
///
/// Set at most once by an explicit cancel request; the scan and upload phases
/// poll it before starting each unit of work (one directory, one batch, one
/// file read). There is no mid-read interruption: work already in flight is
/// allowed to finish, and nothing after the next checkpoint starts.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Request cancellation. Idempotent; never raises.
    pub fn cancel(&self) {
        if !self.0.swap(true, Ordering::SeqCst) {
            info!("Cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears the flag at the start of a fresh operation.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
