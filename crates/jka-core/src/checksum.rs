//! Streaming SHA-256 verification of cache entries and response bodies.
//!
//! One verifier instance is reused per asset: first to digest whatever sits
//! at the cache path, then (on mismatch) to hash the fresh download as it is
//! written. A nonexistent file digests as empty content, which can never
//! match a real expected digest and so forces a download.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// SHA-256 digest length in bytes.
pub const DIGEST_LEN: usize = 32;

/// Expected digest decoded from manifest hex text. Always exactly 32 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedDigest([u8; DIGEST_LEN]);

impl ExpectedDigest {
    /// Decode a hex digest string. Fails on non-hex input or any length
    /// other than 64 hex characters.
    pub fn from_hex(text: &str) -> Result<Self, DigestParseError> {
        let bytes = hex::decode(text).map_err(DigestParseError::InvalidHex)?;
        let digest: [u8; DIGEST_LEN] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| DigestParseError::WrongLength(v.len()))?;
        Ok(Self(digest))
    }

    pub fn matches(&self, actual: &[u8; DIGEST_LEN]) -> bool {
        &self.0 == actual
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ExpectedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Error decoding a manifest digest string.
#[derive(Debug, thiserror::Error)]
pub enum DigestParseError {
    #[error("digest is not valid hex: {0}")]
    InvalidHex(#[source] hex::FromHexError),
    #[error("digest has {0} bytes, expected {DIGEST_LEN}")]
    WrongLength(usize),
}

/// Resettable streaming SHA-256 hasher.
#[derive(Default)]
pub struct Sha256Verifier {
    hasher: Sha256,
}

impl Sha256Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the stream being verified.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Return the digest of everything fed so far and reset for reuse.
    pub fn finalize(&mut self) -> [u8; DIGEST_LEN] {
        self.hasher.finalize_reset().into()
    }

    /// Digest the file at `path` in bounded chunks, resetting afterwards.
    /// A missing file digests as empty content.
    pub fn digest_path(&mut self, path: &Path) -> io::Result<[u8; DIGEST_LEN]> {
        match File::open(path) {
            Ok(mut f) => {
                let mut buf = [0u8; BUF_SIZE];
                loop {
                    let n = f.read(&mut buf)?;
                    if n == 0 {
                        break;
                    }
                    self.hasher.update(&buf[..n]);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        Ok(self.finalize())
    }
}

/// SHA-256 of a byte slice as lowercase hex. Used by tests and diagnostics.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
