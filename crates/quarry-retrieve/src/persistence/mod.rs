//! Persistence layer: versioned on-disk formats for the retrieval structures.
//!
//! Three artifact kinds exist, each tagged by its own magic bytes:
//! - the positional index file ([`format::INDEX_MAGIC`]), a single header +
//!   postcard payload blob written by `PositionalIndex::save`
//! - the sparse index directory ([`format::SPARSE_MAGIC`]), a manifest plus
//!   postings and doc-id payload files written by `SparseIndex::save`
//! - the titles file ([`format::TITLES_MAGIC`]), an opaque doc-id to title
//!   map stored by the engine layer for display purposes
//!
//! All writes go through [`atomic_write`]: data lands in a temp file that is
//! fsynced and renamed over the destination, so readers never observe a
//! half-written artifact.

pub mod codec;
pub mod error;
pub mod format;

pub use error::{PersistenceError, PersistenceResult};
pub use format::{ArtifactHeader, FORMAT_VERSION, INDEX_MAGIC, SPARSE_MAGIC, TITLES_MAGIC};

use std::fs;
use std::io::Write;
use std::path::Path;

/// Atomically write data to a file using the temp-file + fsync + rename
/// pattern.
///
/// The temp file lives in the destination's directory so the final rename
/// stays on one filesystem and is atomic on POSIX.
pub fn atomic_write(path: &Path, data: &[u8]) -> PersistenceResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp);

    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Read an artifact file, mapping a missing file to
/// [`PersistenceError::NotFound`] so callers can degrade gracefully.
pub fn read_artifact(path: &Path) -> PersistenceResult<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PersistenceError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Split an artifact's bytes into its validated header and payload.
pub fn split_artifact(
    bytes: &[u8],
    expected_magic: [u8; 4],
) -> PersistenceResult<(ArtifactHeader, &[u8])> {
    if bytes.len() < ArtifactHeader::SIZE {
        return Err(PersistenceError::Format {
            message: "Artifact shorter than header".to_string(),
            expected: Some(format!("at least {} bytes", ArtifactHeader::SIZE)),
            actual: Some(bytes.len().to_string()),
        });
    }

    let mut reader = std::io::Cursor::new(&bytes[..ArtifactHeader::SIZE]);
    let header = ArtifactHeader::read(&mut reader)?;
    header.validate(expected_magic)?;

    let payload = &bytes[ArtifactHeader::SIZE..];
    header.verify_payload(payload)?;

    Ok((header, payload))
}

/// Frame a payload with its header into a single buffer ready for
/// [`atomic_write`].
pub fn frame_artifact(
    magic: [u8; 4],
    fingerprint: u32,
    payload: &[u8],
) -> PersistenceResult<Vec<u8>> {
    let header = ArtifactHeader::for_payload(magic, fingerprint, payload);
    let mut bytes = Vec::with_capacity(ArtifactHeader::SIZE + payload.len());
    header.write(&mut bytes)?;
    bytes.extend_from_slice(payload);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_and_split() {
        let payload = b"some payload";
        let bytes = frame_artifact(INDEX_MAGIC, 7, payload).unwrap();
        let (header, read_payload) = split_artifact(&bytes, INDEX_MAGIC).unwrap();

        assert_eq!(header.fingerprint, 7);
        assert_eq!(read_payload, payload);
    }

    #[test]
    fn test_split_rejects_truncated() {
        let err = split_artifact(b"short", INDEX_MAGIC).unwrap_err();
        assert!(matches!(err, PersistenceError::Format { .. }));
    }

    #[test]
    fn test_atomic_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("artifact.bin");

        atomic_write(&path, b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");

        // Overwrite fully replaces the old content
        atomic_write(&path, b"world").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"world");
    }
}
