//! Batch upload of the scanned file list.
//!
//! Partitions the flat file list into fixed-size batches and processes them
//! strictly serially; within a batch, file contents are read with a bounded
//! pool of concurrent reads. Each batch is submitted to the [`AssetStore`] as
//! a single call under collision-free upload names, and the name-keyed answer
//! is translated back to paths. Every failure below the batch level is
//! absorbed into the shared [`FailureLog`]; a batch-level transport failure
//! marks that batch's files failed and the next batch still attempts.

use std::collections::HashMap;
use std::path::PathBuf;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use crate::cancel::CancelFlag;
use crate::config::Limits;
use crate::contract::{AssetStore, UploadBlob};
use crate::disambiguate::{disambiguate, upload_name, RenameMap};
use crate::tree::FailureLog;

pub struct BatchUploader<'a, S: AssetStore> {
    store: &'a S,
    folder_id: &'a str,
    limits: &'a Limits,
    cancel: &'a CancelFlag,
    failures: &'a FailureLog,
}

impl<'a, S: AssetStore> BatchUploader<'a, S> {
    pub fn new(
        store: &'a S,
        folder_id: &'a str,
        limits: &'a Limits,
        cancel: &'a CancelFlag,
        failures: &'a FailureLog,
    ) -> Self {
        Self {
            store,
            folder_id,
            limits,
            cancel,
            failures,
        }
    }

    /// Uploads every file, batch by batch in index order, and returns the
    /// path → URL map for everything the store accepted. On cancellation no
    /// further batch starts; URLs already resolved are retained.
    pub async fn upload(&self, file_paths: &[PathBuf]) -> HashMap<PathBuf, String> {
        let mut urls = HashMap::new();
        let batch_size = self.limits.batch_size.max(1);
        for (index, batch) in file_paths.chunks(batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                info!(
                    batch = index,
                    resolved = urls.len(),
                    "Cancelled before batch start, skipping remaining batches"
                );
                break;
            }
            self.upload_batch(index, batch, &mut urls).await;
        }
        urls
    }

    async fn upload_batch(
        &self,
        index: usize,
        batch: &[PathBuf],
        urls: &mut HashMap<PathBuf, String>,
    ) {
        let renames = disambiguate(batch);
        let staged = self.read_batch(batch, &renames).await;
        if staged.is_empty() {
            if !self.cancel.is_cancelled() {
                warn!(batch = index, "No readable files in batch, nothing to submit");
            }
            return;
        }

        let (paths, blobs): (Vec<PathBuf>, Vec<UploadBlob>) = staged.into_iter().unzip();
        info!(batch = index, files = blobs.len(), "Submitting batch");
        match self.store.upload_batch(self.folder_id, blobs).await {
            Ok(receipt) => {
                for path in paths {
                    let name = upload_name(&path, &renames);
                    match receipt.urls.get(&name) {
                        Some(url) => {
                            debug!(path = %path.display(), url = %url, "File uploaded");
                            urls.insert(path, url.clone());
                        }
                        None => {
                            warn!(path = %path.display(), name = %name, "Store accepted batch but omitted file");
                            self.failures.push(&path);
                        }
                    }
                }
            }
            Err(e) => {
                error!(batch = index, error = ?e, "Batch upload failed, marking all files in batch failed");
                for path in paths {
                    self.failures.push(&path);
                }
            }
        }
    }

    /// Reads batch contents with bounded concurrency, in batch order. A read
    /// failure logs the path and drops it from the payload; a cancellation
    /// observed before a read starts abandons that read without logging a
    /// failure (the file is simply work not yet done).
    async fn read_batch(
        &self,
        batch: &[PathBuf],
        renames: &RenameMap,
    ) -> Vec<(PathBuf, UploadBlob)> {
        let staged: Vec<Option<(PathBuf, UploadBlob)>> = stream::iter(batch)
            .map(|path| async move {
                if self.cancel.is_cancelled() {
                    debug!(path = %path.display(), "Cancelled before read");
                    return None;
                }
                match tokio::fs::read(path).await {
                    Ok(content) => Some((
                        path.clone(),
                        UploadBlob {
                            name: upload_name(path, renames),
                            content,
                        },
                    )),
                    Err(e) => {
                        warn!(error = ?e, path = %path.display(), "Failed to read file, excluding from batch");
                        self.failures.push(path);
                        None
                    }
                }
            })
            .buffered(self.limits.read_workers.max(1))
            .collect()
            .await;
        staged.into_iter().flatten().collect()
    }
}
