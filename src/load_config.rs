use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{error, info};

use crate::config::Limits;

/// Asset store endpoint: where file bytes go.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub folder_id: String,
    pub api_key: Option<String>,
}

/// Note sink endpoint: where the rendered tree is inserted.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Fully merged configuration for one publisher: static YAML plus
/// env-injected secrets.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub limits: Limits,
    /// The host application's own data store; never read as an upload source.
    pub protected_root: Option<PathBuf>,
    pub asset_store: StoreConfig,
    pub note_sink: SinkConfig,
}

#[derive(Deserialize)]
struct StaticConfig {
    #[serde(default)]
    limits: Limits,
    #[serde(default)]
    protected_root: Option<PathBuf>,
    asset_store: StoreSection,
    note_sink: SinkSection,
}

#[derive(Deserialize)]
struct StoreSection {
    base_url: String,
    folder_id: String,
}

#[derive(Deserialize)]
struct SinkSection {
    base_url: String,
}

/// Loads a static YAML config file (no secrets) and injects the API key from
/// the environment. Returns a fully merged [`PublishConfig`] or an error.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PublishConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = fs::read_to_string(path_ref)
        .with_context(|| format!("Failed to read config file {:?}", path_ref))?;

    let static_conf: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!(
                "Failed to parse config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // The transport key never lives in the config file.
    let api_key = match std::env::var("ASSET_STORE_KEY") {
        Ok(key) => key,
        Err(e) => {
            error!(error = ?e, "ASSET_STORE_KEY missing in environment");
            return Err(anyhow::anyhow!("ASSET_STORE_KEY must be set: {}", e));
        }
    };

    static_conf.limits.trace_loaded();

    Ok(PublishConfig {
        limits: static_conf.limits,
        protected_root: static_conf.protected_root,
        asset_store: StoreConfig {
            base_url: static_conf.asset_store.base_url,
            folder_id: static_conf.asset_store.folder_id,
            api_key: Some(api_key.clone()),
        },
        note_sink: SinkConfig {
            base_url: static_conf.note_sink.base_url,
            api_key: Some(api_key),
        },
    })
}
