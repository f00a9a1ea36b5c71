use anyhow::{Context, Result};
use clap::Parser;
use jka_core::asset::{self, AssetDescriptor};
use jka_core::config;
use jka_core::control::AbortToken;
use jka_core::provision;
use std::path::PathBuf;

/// Provision kube-apiserver and etcd binaries for a throwaway single-node
/// control plane. Starting the control plane itself is delegated to an
/// external launcher that consumes the assets directory.
#[derive(Debug, Parser)]
#[command(name = "just-kube-api")]
#[command(about = "Download and verify kube-apiserver and etcd binaries", long_about = None)]
pub struct Cli {
    /// Directory for etcd and kube-apiserver binaries.
    #[arg(long)]
    assets_directory: Option<PathBuf>,

    /// kube-apiserver version to use.
    #[arg(long)]
    apiserver_version: Option<String>,

    /// etcd version to use.
    #[arg(long)]
    etcd_version: Option<String>,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let assets_dir = match cli.assets_directory.or_else(|| cfg.assets_directory.clone()) {
            Some(dir) => dir,
            None => config::default_assets_dir()?,
        };
        let apiserver_version = cli
            .apiserver_version
            .unwrap_or_else(|| cfg.apiserver_version.clone());
        let etcd_version = cli.etcd_version.unwrap_or_else(|| cfg.etcd_version.clone());

        let os = asset::target_os();
        let arch = asset::target_arch();
        let assets = vec![
            AssetDescriptor::kube_apiserver(cfg.kubernetes_base_url(), &apiserver_version, os, arch),
            AssetDescriptor::etcd(cfg.etcd_base_url(), &etcd_version, os, arch),
        ];

        let abort = AbortToken::new();
        let signal_token = abort.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, aborting provisioning");
                signal_token.abort();
            }
        });

        let dir = assets_dir.clone();
        tokio::task::spawn_blocking(move || provision::ensure_all(&dir, &assets, &abort))
            .await
            .context("provisioning task panicked")??;

        println!("binaries ready in '{}'", assets_dir.display());
        Ok(())
    }
}
