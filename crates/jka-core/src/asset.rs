//! Asset descriptors: what to download, from where, and how it is named on
//! disk.
//!
//! A descriptor is built once per run from configuration and never mutated.
//! All local naming is derived deterministically from it, so repeated runs
//! for the same version resolve to the same cache entry.

use std::path::{Path, PathBuf};

/// Default release host for kube-apiserver binaries.
pub const DEFAULT_KUBERNETES_BASE_URL: &str = "https://dl.k8s.io";
/// Default release host for etcd archives.
pub const DEFAULT_ETCD_BASE_URL: &str = "https://github.com/etcd-io/etcd/releases/download";

/// How an asset is packaged and how its expected digest is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// A plain executable with a single-value `.sha256` sidecar manifest.
    RawBinary,
    /// A tar.gz archive listed in a multi-line SHA256SUMS manifest.
    TarGzArchive,
}

/// One provisionable binary: identity, remote URLs, and local naming.
#[derive(Debug, Clone)]
pub struct AssetDescriptor {
    name: String,
    version: String,
    os: String,
    arch: String,
    kind: AssetKind,
    source_url: String,
    manifest_url: String,
    /// Path of the binary inside the archive (archive kind only).
    archive_member: Option<String>,
}

impl AssetDescriptor {
    /// kube-apiserver: raw binary under
    /// `<base>/<version>/bin/<os>/<arch>/kube-apiserver`, sidecar digest at
    /// the same URL with `.sha256` appended.
    pub fn kube_apiserver(base_url: &str, version: &str, os: &str, arch: &str) -> Self {
        let source_url = format!(
            "{}/{}/bin/{}/{}/kube-apiserver",
            base_url.trim_end_matches('/'),
            version,
            os,
            arch
        );
        let manifest_url = format!("{source_url}.sha256");
        Self {
            name: "kube-apiserver".to_string(),
            version: version.to_string(),
            os: os.to_string(),
            arch: arch.to_string(),
            kind: AssetKind::RawBinary,
            source_url,
            manifest_url,
            archive_member: None,
        }
    }

    /// etcd: tar.gz archive under
    /// `<base>/<version>/etcd-<version>-<os>-<arch>.tar.gz`, digests listed
    /// in `<base>/<version>/SHA256SUMS`. The binary lives at
    /// `etcd-<version>-<os>-<arch>/etcd` inside the archive.
    pub fn etcd(base_url: &str, version: &str, os: &str, arch: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let stem = format!("etcd-{version}-{os}-{arch}");
        Self {
            name: "etcd".to_string(),
            version: version.to_string(),
            os: os.to_string(),
            arch: arch.to_string(),
            kind: AssetKind::TarGzArchive,
            source_url: format!("{base}/{version}/{stem}.tar.gz"),
            manifest_url: format!("{base}/{version}/SHA256SUMS"),
            archive_member: Some(format!("{stem}/etcd")),
        }
    }

    /// Canonical name; also the stable link name under the assets directory.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    pub fn archive_member(&self) -> Option<&str> {
        self.archive_member.as_deref()
    }

    /// `<name>-<version>-<os>-<arch>`, shared by cache and binary naming.
    fn version_stem(&self) -> String {
        format!("{}-{}-{}-{}", self.name, self.version, self.os, self.arch)
    }

    /// File name of the versioned cache entry (downloads land here).
    pub fn cache_file_name(&self) -> String {
        match self.kind {
            AssetKind::RawBinary => self.version_stem(),
            AssetKind::TarGzArchive => format!("{}.tar.gz", self.version_stem()),
        }
    }

    /// Versioned cache entry path under the assets directory.
    pub fn cache_path(&self, assets_dir: &Path) -> PathBuf {
        assets_dir.join(self.cache_file_name())
    }

    /// Path of the versioned executable the stable link points at. For raw
    /// binaries this is the cache entry itself; for archives it is the
    /// extraction output next to the archive.
    pub fn binary_path(&self, assets_dir: &Path) -> PathBuf {
        match self.kind {
            AssetKind::RawBinary => self.cache_path(assets_dir),
            AssetKind::TarGzArchive => assets_dir.join(self.version_stem()),
        }
    }

    /// Stable, version-independent link path under the assets directory.
    pub fn link_path(&self, assets_dir: &Path) -> PathBuf {
        assets_dir.join(&self.name)
    }
}

/// OS token used in release artifact names for the running platform.
pub fn target_os() -> &'static str {
    map_os(std::env::consts::OS)
}

/// Architecture token used in release artifact names for the running platform.
pub fn target_arch() -> &'static str {
    map_arch(std::env::consts::ARCH)
}

/// Kubernetes/etcd releases use Go's OS vocabulary.
fn map_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Kubernetes/etcd releases use Go's architecture vocabulary.
fn map_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}
