//! Block-indexed access to file-backed capture memory
//!
//! Two interchangeable strategies sit behind the [`BlockStore`] trait:
//!
//! - [`MappedStore`] memory-maps the whole pre-sized region once, giving
//!   O(1) random access for looped replay with no copy per block.
//! - [`StreamStore`] falls back to positioned file I/O for captures too
//!   large for the address-space reservation the process is willing to
//!   make. Writes must be strictly sequential in stream mode.
//!
//! Callers stay agnostic to which is active; [`open_record`] and
//! [`open_replay`] pick one from the configured [`Strategy`].

mod mapped;
mod stream;

pub use mapped::MappedStore;
pub use stream::StreamStore;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::codec::{BlockLayout, FileHeader, FILE_HEADER_SIZE};
use crate::config::Strategy;
use crate::error::{FormatError, Result};

/// Largest region mapped under [`Strategy::Auto`] (1 GiB)
pub const MMAP_RESERVATION_CAP: u64 = 1 << 30;

/// Block-indexed access to a capture file region
///
/// Implementations own the mapped or buffered region exclusively and
/// release it in `close`, which must be idempotent and also runs on Drop.
pub trait BlockStore: Send {
    /// Fixed block geometry of this file
    fn layout(&self) -> BlockLayout;

    /// Capacity in blocks when write-opened, available blocks when
    /// read-opened
    fn total_blocks(&self) -> u64;

    /// Write one encoded block at `index`
    ///
    /// Random indices are supported by the mapped strategy; the stream
    /// strategy accepts strictly increasing indices only.
    fn write_block(&mut self, index: u64, bytes: &[u8]) -> Result<()>;

    /// Read the encoded block at `index`
    fn read_block(&mut self, index: u64) -> Result<&[u8]>;

    /// Flush pending writes to the underlying file
    fn flush(&mut self) -> Result<()>;

    /// Flush, truncate a write-opened file to its written extent,
    /// release the region and close the file handle. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// Whether `Auto` maps a region of `total_size` bytes.
fn fits_mapping(strategy: Strategy, total_size: u64) -> bool {
    match strategy {
        Strategy::Mapped => true,
        Strategy::Streamed => false,
        Strategy::Auto => total_size <= MMAP_RESERVATION_CAP,
    }
}

/// Total file size for a given geometry.
pub(crate) fn region_size(layout: BlockLayout, blocks: u64) -> u64 {
    FILE_HEADER_SIZE as u64 + blocks * layout.block_size() as u64
}

/// Create/truncate a capture file sized for `capacity` blocks and open
/// it for recording.
pub fn open_record(
    path: &Path,
    header: &FileHeader,
    layout: BlockLayout,
    capacity: u64,
    strategy: Strategy,
) -> Result<Box<dyn BlockStore>> {
    let size = region_size(layout, capacity);
    if fits_mapping(strategy, size) {
        tracing::debug!("recording to {:?} via mapped store ({} bytes)", path, size);
        Ok(Box::new(MappedStore::create(path, header, layout, capacity)?))
    } else {
        tracing::debug!("recording to {:?} via stream store ({} bytes)", path, size);
        Ok(Box::new(StreamStore::create(path, header, layout, capacity)?))
    }
}

/// Open an existing capture file for replay.
///
/// Decodes and validates the file header, derives the block layout from
/// the recorded bandwidth and validates that the file holds a whole
/// number of blocks.
pub fn open_replay(
    path: &Path,
    strategy: Strategy,
) -> Result<(Box<dyn BlockStore>, FileHeader, u64)> {
    let header = read_file_header(path)?;
    let layout = BlockLayout::for_bandwidth(header.bandwidth)?;
    let size = std::fs::metadata(path)?.len();

    if fits_mapping(strategy, size) {
        let (store, header, total) = MappedStore::open(path, layout)?;
        tracing::debug!("replaying {:?} via mapped store, {} blocks", path, total);
        Ok((Box::new(store), header, total))
    } else {
        let (store, header, total) = StreamStore::open(path, layout)?;
        tracing::debug!("replaying {:?} via stream store, {} blocks", path, total);
        Ok((Box::new(store), header, total))
    }
}

/// Read and decode the file header without touching any block data.
fn read_file_header(path: &Path) -> Result<FileHeader> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    if len < FILE_HEADER_SIZE as u64 {
        return Err(FormatError::Truncated { len: len as usize }.into());
    }
    let mut buf = [0u8; FILE_HEADER_SIZE];
    file.read_exact(&mut buf)?;
    Ok(FileHeader::decode(&buf)?)
}

/// Validate that `size` is a header plus a whole number of blocks and
/// return the block count.
pub(crate) fn validate_region(layout: BlockLayout, size: u64) -> Result<u64> {
    let block_size = layout.block_size() as u64;
    let header = FILE_HEADER_SIZE as u64;
    if size < header || (size - header) % block_size != 0 {
        return Err(FormatError::SizeMismatch { size, block_size }.into());
    }
    Ok((size - header) / block_size)
}
