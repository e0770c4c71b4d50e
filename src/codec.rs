//! Binary format of capture files: file header and per-subframe blocks
//!
//! All integer and float fields are serialized explicitly little-endian,
//! independent of the host's native struct layout. The file header is
//! packed (28 bytes, no padding). Every block starts with a 32-byte block
//! header so the IQ payload stays 32-byte aligned for vectorized
//! consumers, followed by exactly `BlockLayout::payload_len` payload
//! bytes. Pure encode/decode logic, no I/O.

use crate::error::{FormatError, RecPlayError, Result};

/// Format tag closing the file header ("Recorded IQ File")
pub const FORMAT_TAG: [u8; 4] = *b"RIQF";

/// Magic constant opening every block, the primary corruption and
/// misalignment detector during replay
pub const BLOCK_MAGIC: u64 = 0xABAB_ABAB_ABAB_ABAB;

/// Serialized file header size in bytes
pub const FILE_HEADER_SIZE: usize = 28;

/// Serialized block header size in bytes (keeps the payload 32-byte aligned)
pub const BLOCK_HEADER_SIZE: usize = 32;

/// Bytes per complex sample: 16-bit I + 16-bit Q
pub const IQ_SAMPLE_BYTES: usize = 4;

/// Bandwidth classes and their complex-sample count per 1 ms subframe.
/// The payload size of a capture file is fixed by the class of its
/// recorded bandwidth; 5 MHz (7680 samples, 30720 bytes) is the
/// reference class.
const BANDWIDTH_CLASSES: [(f64, usize); 3] = [(1.4e6, 1920), (3.0e6, 3840), (5.0e6, 7680)];

/// File header, one per capture file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileHeader {
    /// Opaque tag for the originating hardware profile
    pub device_type: u64,
    /// Device-specific transmit timing correction, in samples
    pub tx_sample_advance: u64,
    /// Recorded bandwidth in Hz, declares the payload size class
    pub bandwidth: f64,
}

impl FileHeader {
    /// Serialize the header, including the format tag.
    ///
    /// Fails only if the bandwidth maps to no known payload-size class.
    pub fn encode(&self) -> Result<[u8; FILE_HEADER_SIZE]> {
        BlockLayout::for_bandwidth(self.bandwidth)?;
        let mut buf = [0u8; FILE_HEADER_SIZE];
        buf[0..8].copy_from_slice(&self.device_type.to_le_bytes());
        buf[8..16].copy_from_slice(&self.tx_sample_advance.to_le_bytes());
        buf[16..24].copy_from_slice(&self.bandwidth.to_le_bytes());
        buf[24..28].copy_from_slice(&FORMAT_TAG);
        Ok(buf)
    }

    /// Deserialize and validate a header from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, FormatError> {
        if bytes.len() < FILE_HEADER_SIZE {
            return Err(FormatError::Truncated { len: bytes.len() });
        }
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&bytes[24..28]);
        if tag != FORMAT_TAG {
            return Err(FormatError::BadTag { found: tag });
        }
        Ok(Self {
            device_type: u64::from_le_bytes(bytes[0..8].try_into().unwrap()),
            tx_sample_advance: u64::from_le_bytes(bytes[8..16].try_into().unwrap()),
            bandwidth: f64::from_le_bytes(bytes[16..24].try_into().unwrap()),
        })
    }
}

/// Fixed per-file block geometry
///
/// The payload length is declared once by the bandwidth class and is
/// identical for every block in a file; replay indexing is offset
/// arithmetic over the resulting stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    payload_len: usize,
}

impl BlockLayout {
    /// Layout for a bandwidth class, smallest class covering `bandwidth`.
    pub fn for_bandwidth(bandwidth: f64) -> Result<Self> {
        if bandwidth > 0.0 {
            for (class_bw, samples) in BANDWIDTH_CLASSES {
                if bandwidth <= class_bw {
                    return Ok(Self {
                        payload_len: samples * IQ_SAMPLE_BYTES,
                    });
                }
            }
        }
        Err(RecPlayError::UnsupportedBandwidth(bandwidth))
    }

    /// Layout with an explicit payload length, for tests and tooling.
    pub fn with_payload_len(payload_len: usize) -> Self {
        Self { payload_len }
    }

    /// Payload bytes per block
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// Total serialized block size (block header + payload)
    pub fn block_size(&self) -> usize {
        BLOCK_HEADER_SIZE + self.payload_len
    }

    /// Serialize one block: magic, timestamp, zeroed reserved fields,
    /// payload.
    pub fn encode_block(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() != self.payload_len {
            return Err(RecPlayError::PayloadSize {
                len: payload.len(),
                expected: self.payload_len,
            });
        }
        let mut buf = Vec::with_capacity(self.block_size());
        buf.extend_from_slice(&BLOCK_MAGIC.to_le_bytes());
        buf.extend_from_slice(&timestamp.to_le_bytes());
        buf.extend_from_slice(&[0u8; 16]); // reserved1, reserved2
        buf.extend_from_slice(payload);
        Ok(buf)
    }

    /// Deserialize one block, validating the magic. The reserved fields
    /// are ignored.
    pub fn decode_block<'a>(
        &self,
        bytes: &'a [u8],
    ) -> std::result::Result<(i64, &'a [u8]), FormatError> {
        if bytes.len() < self.block_size() {
            return Err(FormatError::Truncated { len: bytes.len() });
        }
        let magic = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
        if magic != BLOCK_MAGIC {
            return Err(FormatError::BadMagic { found: magic });
        }
        let timestamp = i64::from_le_bytes(bytes[8..16].try_into().unwrap());
        Ok((timestamp, &bytes[BLOCK_HEADER_SIZE..self.block_size()]))
    }
}
