//! Run configuration: versions, assets directory, and release mirrors.
//!
//! Loaded from `~/.config/just-kube-api/config.toml` (created with defaults on
//! first run); CLI flags override individual fields. The effective values are
//! passed into the orchestrator as plain arguments, never read from globals.

use crate::asset::{DEFAULT_ETCD_BASE_URL, DEFAULT_KUBERNETES_BASE_URL};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/just-kube-api/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JkaConfig {
    /// kube-apiserver version to provision.
    pub apiserver_version: String,
    /// etcd version to provision.
    pub etcd_version: String,
    /// Directory for the binaries; defaults to the XDG data dir when unset.
    #[serde(default)]
    pub assets_directory: Option<PathBuf>,
    /// Override for the kube-apiserver release host (testing/mirrors).
    #[serde(default)]
    pub kubernetes_base_url: Option<String>,
    /// Override for the etcd release host (testing/mirrors).
    #[serde(default)]
    pub etcd_base_url: Option<String>,
}

impl Default for JkaConfig {
    fn default() -> Self {
        Self {
            apiserver_version: "v1.22.2".to_string(),
            etcd_version: "v3.5.0".to_string(),
            assets_directory: None,
            kubernetes_base_url: None,
            etcd_base_url: None,
        }
    }
}

impl JkaConfig {
    pub fn kubernetes_base_url(&self) -> &str {
        self.kubernetes_base_url
            .as_deref()
            .unwrap_or(DEFAULT_KUBERNETES_BASE_URL)
    }

    pub fn etcd_base_url(&self) -> &str {
        self.etcd_base_url.as_deref().unwrap_or(DEFAULT_ETCD_BASE_URL)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("just-kube-api")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Default assets directory under the XDG data home.
pub fn default_assets_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("just-kube-api")?;
    Ok(xdg_dirs.get_data_home())
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<JkaConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = JkaConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: JkaConfig = toml::from_str(&data)?;
    Ok(cfg)
}
