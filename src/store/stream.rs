//! Streamed block store
//!
//! Positioned file I/O fallback for captures larger than the mapping
//! reservation cap. Writes are accepted in strictly increasing index
//! order only; reads seek to the computed offset and fill an internal
//! block buffer.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::codec::{BlockLayout, FileHeader, FILE_HEADER_SIZE};
use crate::error::{RecPlayError, Result};

use super::{region_size, validate_region, BlockStore};

/// Block store backed by positioned reads/writes on the capture file
pub struct StreamStore {
    file: Option<File>,
    layout: BlockLayout,
    total_blocks: u64,
    written: u64,
    writable: bool,
    buf: Vec<u8>,
}

impl StreamStore {
    /// Create/truncate `path`, reserve the full region for `capacity`
    /// blocks and write the file header.
    pub fn create(
        path: &Path,
        header: &FileHeader,
        layout: BlockLayout,
        capacity: u64,
    ) -> Result<Self> {
        let header_bytes = header.encode()?;
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(path)?;
        file.set_len(region_size(layout, capacity))?;
        file.write_all(&header_bytes)?;

        Ok(Self {
            file: Some(file),
            layout,
            total_blocks: capacity,
            written: 0,
            writable: true,
            buf: Vec::new(),
        })
    }

    /// Open an existing capture file read-only.
    pub fn open(path: &Path, layout: BlockLayout) -> Result<(Self, FileHeader, u64)> {
        let mut file = File::open(path)?;
        let total_blocks = validate_region(layout, file.metadata()?.len())?;
        let mut header_bytes = [0u8; FILE_HEADER_SIZE];
        file.read_exact(&mut header_bytes)?;
        let header = FileHeader::decode(&header_bytes)?;

        let store = Self {
            file: Some(file),
            layout,
            total_blocks,
            written: 0,
            writable: false,
            buf: Vec::new(),
        };
        Ok((store, header, total_blocks))
    }

    fn offset(&self, index: u64) -> u64 {
        FILE_HEADER_SIZE as u64 + index * self.layout.block_size() as u64
    }

    fn available(&self) -> u64 {
        if self.writable {
            self.written
        } else {
            self.total_blocks
        }
    }
}

impl BlockStore for StreamStore {
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
        // Stream writes must arrive in strictly increasing index order;
        // anything else is a driver sequencing bug.
        if index != self.written || index >= self.total_blocks {
            return Err(RecPlayError::OutOfRange {
                index,
                total: self.total_blocks,
            });
        }
        let offset = self.offset(index);
        match self.file.as_mut() {
            Some(file) => {
                file.seek(SeekFrom::Start(offset))?;
                file.write_all(bytes)?;
                self.written = index + 1;
                Ok(())
            }
            None => Err(RecPlayError::Closed),
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
        match self.file.as_mut() {
            Some(file) => {
                file.seek(SeekFrom::Start(offset))?;
                self.buf.resize(block_size, 0);
                file.read_exact(&mut self.buf)?;
                Ok(&self.buf)
            }
            None => Err(RecPlayError::Closed),
        }
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            if self.writable {
                file.flush()?;
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            if self.writable {
                file.flush()?;
                file.set_len(region_size(self.layout, self.written))?;
                file.sync_all()?;
            }
        }
        Ok(())
    }
}

impl Drop for StreamStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
