//! Tape artifact binary layout (32-byte header + postcard payload).

use crate::{ArtifactError, Tape};

/// Magic bytes: b"DNTP".
pub const MAGIC: [u8; 4] = *b"DNTP";

/// Artifact format version.
pub const VERSION: u32 = 1;

const HEADER_LEN: usize = 32;

/// Artifact file header, the first 32 bytes.
///
/// - 0-3: magic
/// - 4-7: format version
/// - 8-11: CRC32 checksum of the payload
/// - 12-15: payload length in bytes
/// - 16-31: reserved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u32,
    pub checksum: u32,
    pub payload_len: u32,
    pub _reserved: [u8; 16],
}

impl Default for Header {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            checksum: 0,
            payload_len: 0,
            _reserved: [0; 16],
        }
    }
}

impl Header {
    /// Decode header from 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        if bytes.len() < HEADER_LEN {
            return Err(ArtifactError::TooShort);
        }
        let mut reserved = [0u8; 16];
        reserved.copy_from_slice(&bytes[16..32]);
        Ok(Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            checksum: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            payload_len: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
            _reserved: reserved,
        })
    }

    /// Encode header to 32 bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes[16..32].copy_from_slice(&self._reserved);
        bytes
    }
}

/// Serialize a tape to artifact bytes.
pub fn encode(tape: &Tape) -> Vec<u8> {
    let payload = postcard::to_allocvec(tape).expect("tape serialization should not fail");
    let header = Header {
        checksum: crc32fast::hash(&payload),
        payload_len: payload.len() as u32,
        ..Default::default()
    };

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Deserialize a tape from artifact bytes, validating magic, version,
/// length, and checksum. No partial loads: any anomaly is an error.
pub fn decode(bytes: &[u8]) -> Result<Tape, ArtifactError> {
    let header = Header::from_bytes(bytes)?;
    if header.magic != MAGIC {
        return Err(ArtifactError::BadMagic);
    }
    if header.version != VERSION {
        return Err(ArtifactError::Version(header.version));
    }
    let payload = &bytes[HEADER_LEN..];
    if payload.len() != header.payload_len as usize {
        return Err(ArtifactError::Length);
    }
    if crc32fast::hash(payload) != header.checksum {
        return Err(ArtifactError::Checksum);
    }
    Ok(postcard::from_bytes(payload)?)
}
