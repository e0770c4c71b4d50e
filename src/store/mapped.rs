//! Memory-mapped block store
//!
//! Maps the whole pre-sized capture region once. Block access is a
//! direct memory copy (write) or a borrowed slice (read) at
//! `header + index * block_size`, which keeps the per-subframe cost
//! inside the near-real-time tick budget and makes wraparound replay
//! plain offset arithmetic.

use memmap2::{Mmap, MmapMut};
use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::codec::{BlockLayout, FileHeader, FILE_HEADER_SIZE};
use crate::error::{RecPlayError, Result};

use super::{region_size, validate_region, BlockStore};

enum Region {
    Writable(MmapMut),
    ReadOnly(Mmap),
}

/// Block store backed by one memory mapping of the capture file
pub struct MappedStore {
    file: Option<File>,
    region: Option<Region>,
    layout: BlockLayout,
    total_blocks: u64,
    written: u64,
    writable: bool,
}

impl MappedStore {
    /// Create/truncate `path`, reserve the full region for `capacity`
    /// blocks, map it and write the file header.
    pub fn create(
        path: &Path,
        header: &FileHeader,
        layout: BlockLayout,
        capacity: u64,
    ) -> Result<Self> {
        let header_bytes = header.encode()?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(path)?;
        file.set_len(region_size(layout, capacity))?;

        let mut map = unsafe { MmapMut::map_mut(&file)? };
        map[..FILE_HEADER_SIZE].copy_from_slice(&header_bytes);

        Ok(Self {
            file: Some(file),
            region: Some(Region::Writable(map)),
            layout,
            total_blocks: capacity,
            written: 0,
            writable: true,
        })
    }

    /// Open an existing capture file read-only and map it.
    ///
    /// Validates the file size against the block stride and the header
    /// tag; returns the decoded header and the available block count.
    pub fn open(path: &Path, layout: BlockLayout) -> Result<(Self, FileHeader, u64)> {
        let file = File::open(path)?;
        let total_blocks = validate_region(layout, file.metadata()?.len())?;
        let map = unsafe { Mmap::map(&file)? };
        let header = FileHeader::decode(&map[..FILE_HEADER_SIZE])?;

        let store = Self {
            file: Some(file),
            region: Some(Region::ReadOnly(map)),
            layout,
            total_blocks,
            written: 0,
            writable: false,
        };
        Ok((store, header, total_blocks))
    }

    fn offset(&self, index: u64) -> usize {
        FILE_HEADER_SIZE + index as usize * self.layout.block_size()
    }

    /// Blocks readable right now: recorded count when writing, file
    /// content when reading.
    fn available(&self) -> u64 {
        if self.writable {
            self.written
        } else {
            self.total_blocks
        }
    }
}

impl BlockStore for MappedStore {
    fn layout(&self) -> BlockLayout {
        self.layout
    }

    fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    fn write_block(&mut self, index: u64, bytes: &[u8]) -> Result<()> {
        let block_size = self.layout.block_size();
        if bytes.len() != block_size {
            return Err(RecPlayError::PayloadSize {
                len: bytes.len(),
                expected: block_size,
            });
        }
        if index >= self.total_blocks {
            return Err(RecPlayError::OutOfRange {
                index,
                total: self.total_blocks,
            });
        }
        let offset = self.offset(index);
        match self.region.as_mut() {
            Some(Region::Writable(map)) => {
                map[offset..offset + block_size].copy_from_slice(bytes);
                self.written = self.written.max(index + 1);
                Ok(())
            }
            _ => Err(RecPlayError::Closed),
        }
    }

    fn read_block(&mut self, index: u64) -> Result<&[u8]> {
        if index >= self.available() {
            return Err(RecPlayError::OutOfRange {
                index,
                total: self.available(),
            });
        }
        let offset = self.offset(index);
        let block_size = self.layout.block_size();
        match self.region.as_ref() {
            Some(Region::Writable(map)) => Ok(&map[offset..offset + block_size]),
            Some(Region::ReadOnly(map)) => Ok(&map[offset..offset + block_size]),
            None => Err(RecPlayError::Closed),
        }
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(Region::Writable(map)) = self.region.as_ref() {
            map.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(region) = self.region.take() {
            if let Region::Writable(map) = region {
                map.flush()?;
                drop(map);
                if let Some(file) = self.file.as_ref() {
                    // Drop the unrecorded tail so the file reopens with
                    // the written block count.
                    file.set_len(region_size(self.layout, self.written))?;
                    file.sync_all()?;
                }
            }
        }
        self.file = None;
        Ok(())
    }
}

impl Drop for MappedStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
