//! Transport contracts consumed by the publish pipeline.
//!
//! The core only defines what it expects from the outside world: an
//! [`AssetStore`] that persists named byte blobs and answers with stable
//! references, and a [`NoteSink`] that inserts the rendered markup into the
//! host document. Both traits are async, return boxed errors, and are
//! annotated for `mockall` so tests can drive the pipeline without a network.

use std::collections::HashMap;

use async_trait::async_trait;
use mockall::automock;

/// Error type shared by all transport calls.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// A named byte blob staged for one upload call. The name is the
/// collision-free upload name, not necessarily the on-disk basename.
#[derive(Debug, Clone)]
pub struct UploadBlob {
    pub name: String,
    pub content: Vec<u8>,
}

/// Answer to one batch upload: submitted name → stable URL, for every blob
/// the store accepted. A submitted name absent from the map means that blob
/// was rejected.
#[derive(Debug, Clone, Default)]
pub struct BatchReceipt {
    pub urls: HashMap<String, String>,
}

/// Upload transport: persists file bytes under a destination folder and
/// returns stable references.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload one batch of named blobs into the destination folder.
    ///
    /// A top-level error means every blob in this call failed.
    async fn upload_batch(
        &self,
        folder_id: &str,
        blobs: Vec<UploadBlob>,
    ) -> Result<BatchReceipt, TransportError>;
}

/// Insertion transport: places the rendered markup into the host document
/// after the given anchor.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait NoteSink: Send + Sync {
    async fn insert_after(&self, anchor_id: &str, markup: &str) -> Result<(), TransportError>;
}
