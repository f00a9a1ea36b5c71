//! Single-attempt HTTP GET via libcurl.
//!
//! No retries: a failed attempt surfaces to the caller, who treats any
//! provisioning failure as fatal. `fail_on_error` keeps HTTP error bodies out
//! of the destination; redirects are followed. The abort token is checked
//! before the request and at every body write callback.

use crate::checksum::Sha256Verifier;
use crate::control::AbortToken;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Connect timeout for every request.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Overall timeout for small manifest fetches.
const MANIFEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Overall timeout for asset body downloads.
const BODY_TIMEOUT: Duration = Duration::from_secs(3600);

/// Error from a single GET attempt.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection-level failure (DNS, TLS, timeout, reset).
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },

    /// The server answered with a non-success status.
    #[error("GET '{url}' status not ok: {status}")]
    Status { url: String, status: u32 },

    /// Writing the response body to disk failed.
    #[error("failed to write response body: {0}")]
    Io(#[from] io::Error),

    /// The run was cancelled while the transfer was in flight.
    #[error("fetch aborted")]
    Aborted,
}

fn new_easy(url: &str, timeout: Duration) -> Result<curl::easy::Easy, FetchError> {
    let transport = |source: curl::Error| FetchError::Transport {
        url: url.to_string(),
        source,
    };
    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(transport)?;
    easy.follow_location(true).map_err(transport)?;
    easy.max_redirections(10).map_err(transport)?;
    easy.fail_on_error(true).map_err(transport)?;
    easy.connect_timeout(CONNECT_TIMEOUT).map_err(transport)?;
    easy.timeout(timeout).map_err(transport)?;
    Ok(easy)
}

/// Classify a failed `perform`: abort and write errors are reported through
/// the callback state; everything else is an HTTP status or transport error.
fn classify_failure(
    url: &str,
    easy: &mut curl::easy::Easy,
    err: curl::Error,
    write_err: Option<io::Error>,
    abort: &AbortToken,
) -> FetchError {
    if abort.is_aborted() {
        return FetchError::Aborted;
    }
    if let Some(ioe) = write_err {
        return FetchError::Io(ioe);
    }
    if err.is_http_returned_error() {
        if let Ok(status) = easy.response_code() {
            return FetchError::Status {
                url: url.to_string(),
                status,
            };
        }
    }
    FetchError::Transport {
        url: url.to_string(),
        source: err,
    }
}

/// GET `url` and return the whole body. Intended for small manifests.
pub fn fetch_to_vec(url: &str, abort: &AbortToken) -> Result<Vec<u8>, FetchError> {
    if abort.is_aborted() {
        return Err(FetchError::Aborted);
    }
    let mut easy = new_easy(url, MANIFEST_TIMEOUT)?;
    let mut body = Vec::new();
    let result = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                if abort.is_aborted() {
                    return Ok(0); // abort transfer
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        transfer.perform()
    };
    if let Err(e) = result {
        return Err(classify_failure(url, &mut easy, e, None, abort));
    }
    Ok(body)
}

/// GET `url`, streaming the body to `dest` and into `verifier` in a single
/// pass. Returns the number of bytes written. On failure the partial file is
/// left in place; the caller removes it (and knows whether `dest` pre-existed).
pub fn fetch_to_file(
    url: &str,
    dest: &Path,
    verifier: &mut Sha256Verifier,
    abort: &AbortToken,
) -> Result<u64, FetchError> {
    if abort.is_aborted() {
        return Err(FetchError::Aborted);
    }
    let mut easy = new_easy(url, BODY_TIMEOUT)?;
    let mut file = File::create(dest)?;
    let mut written: u64 = 0;
    let mut write_err: Option<io::Error> = None;
    let result = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                if abort.is_aborted() {
                    return Ok(0); // abort transfer
                }
                if let Err(e) = file.write_all(data) {
                    write_err = Some(e);
                    return Ok(0); // abort transfer
                }
                verifier.update(data);
                written += data.len() as u64;
                Ok(data.len())
            })
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        transfer.perform()
    };
    if let Err(e) = result {
        return Err(classify_failure(url, &mut easy, e, write_err, abort));
    }
    file.flush()?;
    Ok(written)
}
