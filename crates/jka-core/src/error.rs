//! Provisioning error taxonomy.
//!
//! Every error here is fatal to the run: nothing in the pipeline retries, and
//! the orchestrator stops at the first failing asset. Corrupt or partial
//! outputs are deleted before the error propagates so the next invocation
//! starts clean.

use crate::fetch::FetchError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The digest manifest could not be retrieved (network or HTTP status).
    #[error("failed to fetch manifest {url}: {source}")]
    ManifestFetch { url: String, source: FetchError },

    /// The manifest was retrieved but its content is unusable: no entry for
    /// the asset, or a digest that does not decode to 32 hex-encoded bytes.
    #[error("bad manifest content: {reason}")]
    ManifestFormat { reason: String },

    /// Asset body download failed (transport, HTTP status, disk write, or
    /// abort). The partial cache entry has already been removed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A freshly downloaded asset does not match the manifest digest. The
    /// offending file has already been removed.
    #[error("digest mismatch for {path} from {url}: expected {expected}, got {actual}")]
    Integrity {
        url: String,
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// The archive was scanned to its end without finding the member.
    #[error("archive {archive} does not contain member {member}")]
    ArchiveMemberNotFound { archive: PathBuf, member: String },

    /// The archive could not be read (bad gzip stream, malformed tar header,
    /// truncated member).
    #[error("failed to read archive {archive}: {source}")]
    Archive {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Local filesystem operation failed (directory creation, cache reads,
    /// extraction output, link publishing).
    #[error("failed to {op} {path}: {source}")]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionError {
    pub(crate) fn fs(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            op,
            path: path.into(),
            source,
        }
    }
}
