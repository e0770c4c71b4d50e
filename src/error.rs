//! Error handling for record/replay sessions
//!
//! This module defines the custom error types and a Result alias used
//! throughout the crate.

use thiserror::Error;

/// Errors detected while decoding a capture file or block
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// The 4-byte format tag at the end of the file header did not match
    #[error("not a capture file: format tag {found:02x?} does not match")]
    BadTag { found: [u8; 4] },

    /// Fewer bytes available than a complete file header
    #[error("truncated file header: {len} bytes")]
    Truncated { len: usize },

    /// File size is not a file header plus a whole number of blocks
    #[error("file size {size} is not a header plus a multiple of {block_size}-byte blocks")]
    SizeMismatch { size: u64, block_size: u64 },

    /// The leading 64 bits of a block did not equal the block magic
    #[error("bad block magic 0x{found:016x}")]
    BadMagic { found: u64 },
}

/// Main error type for record/replay operations
#[derive(Error, Debug)]
pub enum RecPlayError {
    /// Errors in the session configuration, rejected before any file I/O
    #[error("configuration error: {0}")]
    Config(String),

    /// Bandwidth that maps to no known payload-size class
    #[error("unsupported bandwidth {0} Hz: no known payload size class")]
    UnsupportedBandwidth(f64),

    /// Errors in the on-disk format, detected at open or at a block boundary
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Payload passed to the codec does not match the block layout
    #[error("payload length {len} does not match block layout ({expected} bytes)")]
    PayloadSize { len: usize, expected: usize },

    /// Block index beyond the recorded/available block count
    #[error("block index {index} out of range ({total} blocks)")]
    OutOfRange { index: u64, total: u64 },

    /// Magic mismatch mid-replay, fatal for the session
    #[error("corrupted block at index {index}: {source}")]
    Corruption {
        index: u64,
        #[source]
        source: FormatError,
    },

    /// Tick arrived after the session was explicitly closed
    #[error("session is closed")]
    Closed,

    /// IO errors from the underlying storage layer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for record/replay operations
pub type Result<T> = std::result::Result<T, RecPlayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = FormatError::BadMagic { found: 0xdead };
        assert_eq!(err.to_string(), "bad block magic 0x000000000000dead");
    }

    #[test]
    fn test_corruption_carries_index() {
        let err = RecPlayError::Corruption {
            index: 42,
            source: FormatError::BadMagic { found: 0 },
        };
        assert!(err.to_string().contains("index 42"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: RecPlayError = io.into();
        assert!(matches!(err, RecPlayError::Io(_)));
    }
}
