//! Digest resolution from remote manifests.
//!
//! Two manifest shapes exist: a sidecar file whose entire body is one hex
//! digest (kube-apiserver `.sha256`), and a multi-line `digest  filename`
//! listing (etcd `SHA256SUMS`). A listing entry that is missing or does not
//! decode is a fatal format error, never a silent skip.

use crate::asset::{AssetDescriptor, AssetKind};
use crate::checksum::ExpectedDigest;
use crate::control::AbortToken;
use crate::error::ProvisionError;
use crate::fetch::{self, FetchError};

/// Fetch the manifest for `asset` and return its expected digest.
pub fn resolve_expected_digest(
    asset: &AssetDescriptor,
    abort: &AbortToken,
) -> Result<ExpectedDigest, ProvisionError> {
    let url = asset.manifest_url();
    let body = fetch::fetch_to_vec(url, abort).map_err(|source| match source {
        // Cancellation is not a manifest failure.
        FetchError::Aborted => ProvisionError::Fetch(FetchError::Aborted),
        source => ProvisionError::ManifestFetch {
            url: url.to_string(),
            source,
        },
    })?;
    let text = String::from_utf8_lossy(&body);
    match asset.kind() {
        AssetKind::RawBinary => parse_sidecar(&text),
        AssetKind::TarGzArchive => parse_shasums(&text, &asset.cache_file_name()),
    }
}

/// Sidecar manifest: the whole body, trimmed of surrounding whitespace, is
/// the hex digest.
pub fn parse_sidecar(body: &str) -> Result<ExpectedDigest, ProvisionError> {
    ExpectedDigest::from_hex(body.trim()).map_err(|e| ProvisionError::ManifestFormat {
        reason: format!("sidecar digest: {e}"),
    })
}

/// SHA256SUMS manifest: scan `digest  filename` lines for the entry whose
/// filename matches `file_name` exactly (a leading directory component is
/// tolerated; a longer filename that merely ends in `file_name` is not).
pub fn parse_shasums(body: &str, file_name: &str) -> Result<ExpectedDigest, ProvisionError> {
    for line in body.lines() {
        let mut tokens = line.split_whitespace();
        let (Some(digest), Some(entry)) = (tokens.next(), tokens.next_back()) else {
            continue;
        };
        // Checksum tools mark binary mode with a leading '*'.
        let entry = entry.strip_prefix('*').unwrap_or(entry);
        if entry == file_name || entry.ends_with(&format!("/{file_name}")) {
            return ExpectedDigest::from_hex(digest).map_err(|e| {
                ProvisionError::ManifestFormat {
                    reason: format!("digest for {file_name}: {e}"),
                }
            });
        }
    }
    Err(ProvisionError::ManifestFormat {
        reason: format!("no entry for {file_name} in checksum listing"),
    })
}
