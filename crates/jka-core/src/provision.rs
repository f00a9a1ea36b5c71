//! Asset orchestration: one idempotent "ensure present and valid" pass per
//! asset.
//!
//! Per asset: resolve the expected digest, check the versioned cache entry
//! against it, download (hashing in the same pass) only on mismatch,
//! re-verify, extract archives, and publish the stable link. Old versions
//! are never deleted; corrupt or partial outputs are.

use crate::archive;
use crate::asset::{AssetDescriptor, AssetKind};
use crate::checksum::{ExpectedDigest, Sha256Verifier};
use crate::control::AbortToken;
use crate::error::ProvisionError;
use crate::fetch;
use crate::link;
use crate::manifest;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Provision every asset in order, failing fast on the first error. Creates
/// the assets directory if needed.
pub fn ensure_all(
    assets_dir: &Path,
    assets: &[AssetDescriptor],
    abort: &AbortToken,
) -> Result<(), ProvisionError> {
    fs::create_dir_all(assets_dir)
        .map_err(|e| ProvisionError::fs("create assets directory", assets_dir, e))?;
    for asset in assets {
        ensure_asset(assets_dir, asset, abort)?;
    }
    Ok(())
}

/// Ensure `asset` is present under `assets_dir`, verified against the digest
/// the remote manifest declares right now, and reachable through its stable
/// link. Calling this again without a manifest change performs no asset
/// download.
pub fn ensure_asset(
    assets_dir: &Path,
    asset: &AssetDescriptor,
    abort: &AbortToken,
) -> Result<(), ProvisionError> {
    let expected = manifest::resolve_expected_digest(asset, abort)?;

    let cache = asset.cache_path(assets_dir);
    let mut verifier = Sha256Verifier::new();
    let current = verifier
        .digest_path(&cache)
        .map_err(|e| ProvisionError::fs("read cache entry", &cache, e))?;

    if expected.matches(&current) {
        tracing::debug!(
            "{} {} already matches manifest digest, skipping download",
            asset.name(),
            asset.version()
        );
    } else {
        download_verified(asset, &cache, &expected, &mut verifier, abort)?;
    }

    let binary = materialize_binary(assets_dir, asset, &cache)?;
    link::publish_link(&binary, &asset.link_path(assets_dir))?;
    tracing::info!(
        "{} {} published at {}",
        asset.name(),
        asset.version(),
        asset.link_path(assets_dir).display()
    );
    Ok(())
}

/// Fetch the asset body to `cache`, hashing in the same pass, and verify it
/// against `expected`. Any failure removes the written file.
fn download_verified(
    asset: &AssetDescriptor,
    cache: &Path,
    expected: &ExpectedDigest,
    verifier: &mut Sha256Verifier,
    abort: &AbortToken,
) -> Result<(), ProvisionError> {
    tracing::info!("starting download of {} from {}", asset.name(), asset.source_url());

    if let Err(e) = fetch::fetch_to_file(asset.source_url(), cache, verifier, abort) {
        let _ = fs::remove_file(cache);
        return Err(e.into());
    }

    let actual = verifier.finalize();
    if !expected.matches(&actual) {
        let _ = fs::remove_file(cache);
        return Err(ProvisionError::Integrity {
            url: asset.source_url().to_string(),
            path: cache.to_path_buf(),
            expected: expected.to_hex(),
            actual: hex::encode(actual),
        });
    }

    tracing::info!("download of {} complete", asset.name());
    Ok(())
}

/// Produce the executable the stable link will point at: raw binaries are the
/// verified cache entry itself (made executable); archives are re-extracted
/// from the verified archive, which also heals a missing or damaged
/// extraction output from an earlier interrupted run.
fn materialize_binary(
    assets_dir: &Path,
    asset: &AssetDescriptor,
    cache: &Path,
) -> Result<PathBuf, ProvisionError> {
    match asset.kind() {
        AssetKind::RawBinary => {
            set_executable(cache).map_err(|e| ProvisionError::fs("chmod", cache, e))?;
            Ok(cache.to_path_buf())
        }
        AssetKind::TarGzArchive => {
            // Constructors guarantee archive assets carry a member path.
            let member = asset.archive_member().ok_or_else(|| {
                ProvisionError::ArchiveMemberNotFound {
                    archive: cache.to_path_buf(),
                    member: String::new(),
                }
            })?;
            let binary = asset.binary_path(assets_dir);
            archive::extract_member(cache, member, &binary)?;
            tracing::debug!("extracted {} to {}", member, binary.display());
            Ok(binary)
        }
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
