//! Concrete HTTP collaborators.
//!
//! [`HttpAssetStore`] ships each batch as one multipart POST (blob parts plus
//! a JSON manifest with per-blob sha256 hashes) and expects a name → URL map
//! back. [`HttpNoteSink`] inserts the rendered markup after an anchor block
//! with a single JSON POST. Both are thin transports: every meaningful error
//! is converted to a boxed error for the pipeline to absorb.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::contract::{AssetStore, BatchReceipt, NoteSink, TransportError, UploadBlob};
use crate::load_config::{SinkConfig, StoreConfig};

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Serialize)]
struct ManifestEntry {
    name: String,
    sha256: String,
    size: usize,
}

#[derive(Deserialize)]
struct UploadBatchResponse {
    assets: HashMap<String, String>,
}

pub struct HttpAssetStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAssetStore {
    pub fn new(config: &StoreConfig) -> Self {
        info!(
            base_url = %config.base_url,
            api_key_set = config.api_key.is_some(),
            "Initialized asset store client"
        );
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload_batch(
        &self,
        folder_id: &str,
        blobs: Vec<UploadBlob>,
    ) -> Result<BatchReceipt, TransportError> {
        let url = format!("{}/v1/folders/{}/assets", self.base_url, folder_id);
        info!(url = %url, files = blobs.len(), "Uploading asset batch");

        let manifest: Vec<ManifestEntry> = blobs
            .iter()
            .map(|blob| {
                let mut hasher = Sha256::new();
                hasher.update(&blob.content);
                ManifestEntry {
                    name: blob.name.clone(),
                    sha256: format!("{:x}", hasher.finalize()),
                    size: blob.content.len(),
                }
            })
            .collect();

        let mut form = Form::new().text("manifest", serde_json::to_string(&manifest)?);
        for blob in blobs {
            let part = Part::bytes(blob.content).file_name(blob.name.clone());
            form = form.part(blob.name, part);
        }

        let mut request = self.client.post(&url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = ?e, url = %url, "Asset store request failed");
            e
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            error!(status = %status, url = %url, "Asset store returned error: {body}");
            return Err(format!("asset store error: status {status}: {body}").into());
        }

        let parsed: UploadBatchResponse = response.json().await.map_err(|e| {
            error!(error = ?e, url = %url, "Failed to parse asset store response");
            e
        })?;
        info!(accepted = parsed.assets.len(), "Asset batch accepted");
        Ok(BatchReceipt {
            urls: parsed.assets,
        })
    }
}

pub struct HttpNoteSink {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpNoteSink {
    pub fn new(config: &SinkConfig) -> Self {
        info!(
            base_url = %config.base_url,
            api_key_set = config.api_key.is_some(),
            "Initialized note sink client"
        );
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl NoteSink for HttpNoteSink {
    async fn insert_after(&self, anchor_id: &str, markup: &str) -> Result<(), TransportError> {
        let url = format!("{}/v1/anchors/{}/blocks", self.base_url, anchor_id);
        info!(url = %url, bytes = markup.len(), "Inserting rendered tree");

        let mut request = self.client.post(&url).json(&serde_json::json!({
            "position": "after",
            "markup": markup,
        }));
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = ?e, url = %url, "Note sink request failed");
            e
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            error!(status = %status, url = %url, "Note sink returned error: {body}");
            return Err(format!("note sink error: status {status}: {body}").into());
        }
        info!("Rendered tree inserted");
        Ok(())
    }
}
