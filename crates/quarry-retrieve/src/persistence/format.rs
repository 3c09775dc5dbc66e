//! Binary format definitions for persisted artifacts.
//!
//! Every artifact starts with the same fixed-size little-endian header:
//! 4 magic bytes, a u16 format version, the tokenizer fingerprint (zero for
//! artifacts that do not depend on tokenization), a CRC32 of the payload, and
//! the payload length. The header makes stale or foreign files detectable
//! before any payload bytes are interpreted.

use crate::persistence::error::{PersistenceError, PersistenceResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Magic bytes for the positional index file.
pub const INDEX_MAGIC: [u8; 4] = *b"QIDX";

/// Magic bytes for the sparse index manifest.
pub const SPARSE_MAGIC: [u8; 4] = *b"QSPX";

/// Magic bytes for the titles file.
pub const TITLES_MAGIC: [u8; 4] = *b"QTTL";

/// Current format version.
pub const FORMAT_VERSION: u16 = 1;

/// Fixed artifact header (18 bytes on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactHeader {
    /// Artifact kind tag.
    pub magic: [u8; 4],

    /// Format version.
    pub version: u16,

    /// Tokenizer configuration fingerprint, or 0 when not applicable.
    pub fingerprint: u32,

    /// CRC32 of the payload that follows the header.
    pub checksum: u32,

    /// Payload length in bytes.
    pub payload_len: u64,
}

impl ArtifactHeader {
    /// Serialized size in bytes.
    pub const SIZE: usize = 4 + 2 + 4 + 4 + 8;

    /// Create a header for a payload, computing its checksum.
    pub fn for_payload(magic: [u8; 4], fingerprint: u32, payload: &[u8]) -> Self {
        Self {
            magic,
            version: FORMAT_VERSION,
            fingerprint,
            checksum: crc32fast::hash(payload),
            payload_len: payload.len() as u64,
        }
    }

    /// Validate magic and version against the expected artifact kind.
    pub fn validate(&self, expected_magic: [u8; 4]) -> PersistenceResult<()> {
        if self.magic != expected_magic {
            return Err(PersistenceError::Format {
                message: "Invalid magic bytes".to_string(),
                expected: Some(format!("{:?}", expected_magic)),
                actual: Some(format!("{:?}", self.magic)),
            });
        }

        if self.version != FORMAT_VERSION {
            return Err(PersistenceError::Format {
                message: "Format version mismatch".to_string(),
                expected: Some(FORMAT_VERSION.to_string()),
                actual: Some(self.version.to_string()),
            });
        }

        Ok(())
    }

    /// Verify the payload against the recorded checksum and length.
    pub fn verify_payload(&self, payload: &[u8]) -> PersistenceResult<()> {
        if payload.len() as u64 != self.payload_len {
            return Err(PersistenceError::Format {
                message: "Payload length mismatch".to_string(),
                expected: Some(self.payload_len.to_string()),
                actual: Some(payload.len().to_string()),
            });
        }

        let actual = crc32fast::hash(payload);
        if actual != self.checksum {
            return Err(PersistenceError::ChecksumMismatch {
                expected: self.checksum,
                actual,
            });
        }

        Ok(())
    }

    /// Write the header to a writer (little-endian).
    pub fn write<W: std::io::Write>(&self, writer: &mut W) -> PersistenceResult<()> {
        writer.write_all(&self.magic)?;
        writer.write_u16::<LittleEndian>(self.version)?;
        writer.write_u32::<LittleEndian>(self.fingerprint)?;
        writer.write_u32::<LittleEndian>(self.checksum)?;
        writer.write_u64::<LittleEndian>(self.payload_len)?;
        Ok(())
    }

    /// Read a header from a reader (little-endian).
    pub fn read<R: std::io::Read>(reader: &mut R) -> PersistenceResult<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        let version = reader.read_u16::<LittleEndian>()?;
        let fingerprint = reader.read_u32::<LittleEndian>()?;
        let checksum = reader.read_u32::<LittleEndian>()?;
        let payload_len = reader.read_u64::<LittleEndian>()?;

        Ok(Self {
            magic,
            version,
            fingerprint,
            checksum,
            payload_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let payload = b"payload bytes";
        let header = ArtifactHeader::for_payload(INDEX_MAGIC, 0xDEAD_BEEF, payload);

        let mut buffer = Vec::new();
        header.write(&mut buffer).unwrap();
        assert_eq!(buffer.len(), ArtifactHeader::SIZE);

        let mut reader = std::io::Cursor::new(&buffer);
        let read_back = ArtifactHeader::read(&mut reader).unwrap();

        assert_eq!(read_back, header);
        read_back.validate(INDEX_MAGIC).unwrap();
        read_back.verify_payload(payload).unwrap();
    }

    #[test]
    fn test_wrong_magic_rejected() {
        let header = ArtifactHeader::for_payload(INDEX_MAGIC, 0, b"x");
        let err = header.validate(SPARSE_MAGIC).unwrap_err();
        assert!(matches!(err, PersistenceError::Format { .. }));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let header = ArtifactHeader::for_payload(TITLES_MAGIC, 0, b"original");
        let err = header.verify_payload(b"origina").unwrap_err();
        assert!(matches!(err, PersistenceError::Format { .. }));
    }

    #[test]
    fn test_corrupt_payload_rejected() {
        let header = ArtifactHeader::for_payload(TITLES_MAGIC, 0, b"aaaaaaaa");
        let err = header.verify_payload(b"bbbbbbbb").unwrap_err();
        assert!(matches!(err, PersistenceError::ChecksumMismatch { .. }));
    }
}
