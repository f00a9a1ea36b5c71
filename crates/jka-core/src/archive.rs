//! Extraction of a single member from a gzip-compressed tar archive.
//!
//! The archive is scanned sequentially until the member path matches exactly.
//! Exactly the member's declared size is copied, so trailing tar padding (or
//! the start of the next member) never leaks into the extracted binary.

use crate::error::ProvisionError;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

/// Scan the tar.gz at `archive_path` for `member` and copy its exact declared
/// length to `dest`, marking it executable. Returns the number of bytes
/// written. A missing member, a truncated member, or any write failure is an
/// error; write failures remove the partial `dest` first.
pub fn extract_member(
    archive_path: &Path,
    member: &str,
    dest: &Path,
) -> Result<u64, ProvisionError> {
    let archive_err = |source: io::Error| ProvisionError::Archive {
        archive: archive_path.to_path_buf(),
        source,
    };

    let file = File::open(archive_path)
        .map_err(|e| ProvisionError::fs("open archive", archive_path, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    for entry in archive.entries().map_err(archive_err)? {
        let entry = entry.map_err(archive_err)?;
        let path = entry.path().map_err(archive_err)?;
        if path.as_ref() != Path::new(member) {
            continue;
        }
        let size = entry.size();
        return copy_exact(entry, size, dest).map_err(|e| match e {
            CopyError::Read(source) => archive_err(source),
            CopyError::Write(source) => ProvisionError::fs("write", dest, source),
        });
    }

    Err(ProvisionError::ArchiveMemberNotFound {
        archive: archive_path.to_path_buf(),
        member: member.to_string(),
    })
}

enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

/// Copy exactly `size` bytes from the archive entry to a fresh executable
/// file at `dest`. The partial file is removed on any failure.
fn copy_exact(entry: impl Read, size: u64, dest: &Path) -> Result<u64, CopyError> {
    let mut out = File::create(dest).map_err(CopyError::Write)?;
    let result = copy_into(entry, size, &mut out);
    drop(out);
    match result {
        Ok(written) => {
            set_executable(dest).map_err(|e| {
                let _ = fs::remove_file(dest);
                CopyError::Write(e)
            })?;
            Ok(written)
        }
        Err(e) => {
            let _ = fs::remove_file(dest);
            Err(e)
        }
    }
}

fn copy_into(entry: impl Read, size: u64, out: &mut File) -> Result<u64, CopyError> {
    let mut limited = entry.take(size);
    let written = match io::copy(&mut limited, out) {
        Ok(n) => n,
        Err(e) => {
            // io::copy conflates both sides; a full disk is the likely cause.
            return Err(CopyError::Write(e));
        }
    };
    if written != size {
        return Err(CopyError::Read(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("archive member truncated: got {written} of {size} bytes"),
        )));
    }
    Ok(written)
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

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::path::PathBuf;

    /// Build a tar.gz with the given (path, content) members.
    fn build_archive(members: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o755);
            builder.append_data(&mut header, path, *content).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn write_archive(dir: &Path, bytes: &[u8]) -> PathBuf {
        let path = dir.join("asset.tar.gz");
        let mut f = File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn extracts_matching_member() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = build_archive(&[
            ("etcd-v3.5.0-linux-amd64/README", b"docs"),
            ("etcd-v3.5.0-linux-amd64/etcd", b"#!binary"),
        ]);
        let archive = write_archive(dir.path(), &bytes);
        let dest = dir.path().join("etcd");

        let written = extract_member(&archive, "etcd-v3.5.0-linux-amd64/etcd", &dest).unwrap();
        assert_eq!(written, 8);
        assert_eq!(fs::read(&dest).unwrap(), b"#!binary");
    }

    #[test]
    fn extraction_is_exact_length_despite_following_member() {
        let dir = tempfile::tempdir().unwrap();
        // The target member is followed by another member whose bytes sit
        // right behind it in the stream.
        let bytes = build_archive(&[
            ("pkg/target", b"0123456789"),
            ("pkg/trailing", b"XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX"),
        ]);
        let archive = write_archive(dir.path(), &bytes);
        let dest = dir.path().join("target");

        let written = extract_member(&archive, "pkg/target", &dest).unwrap();
        assert_eq!(written, 10);
        let content = fs::read(&dest).unwrap();
        assert_eq!(content.len(), 10);
        assert_eq!(content, b"0123456789");
    }

    #[test]
    fn missing_member_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = build_archive(&[("pkg/other", b"x")]);
        let archive = write_archive(dir.path(), &bytes);
        let dest = dir.path().join("out");

        let err = extract_member(&archive, "pkg/missing", &dest).unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::ArchiveMemberNotFound { member, .. } if member == "pkg/missing"
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn truncated_member_is_an_error_and_partial_output_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        // Hand-build a tar whose header declares more bytes than the stream
        // actually carries, then gzip it validly.
        let mut header = tar::Header::new_gnu();
        header.set_path("pkg/big").unwrap();
        header.set_size(100);
        header.set_mode(0o755);
        header.set_cksum();
        let mut raw = header.as_bytes().to_vec();
        raw.extend_from_slice(b"0123456789");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).unwrap();
        let bytes = encoder.finish().unwrap();
        let archive = write_archive(dir.path(), &bytes);
        let dest = dir.path().join("big");

        let err = extract_member(&archive, "pkg/big", &dest).unwrap_err();
        assert!(matches!(err, ProvisionError::Archive { .. }), "{err}");
        assert!(!dest.exists(), "partial extraction output must be removed");
    }

    #[test]
    fn garbage_archive_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(dir.path(), b"this is not gzip");
        let dest = dir.path().join("out");

        let err = extract_member(&archive, "pkg/etcd", &dest).unwrap_err();
        assert!(matches!(err, ProvisionError::Archive { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn extracted_member_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let bytes = build_archive(&[("pkg/bin", b"binary")]);
        let archive = write_archive(dir.path(), &bytes);
        let dest = dir.path().join("bin");

        extract_member(&archive, "pkg/bin", &dest).unwrap();
        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
