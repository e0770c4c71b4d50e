//! Recording session: persist one sample block per subframe tick
//!
//! The device driver calls [`Recorder::record`] once per subframe with
//! the raw IQ payload and the tick's timestamp. When the configured
//! block ceiling is reached the recorder silently switches to
//! pass-through: further ticks are no-ops and the device keeps running
//! live. Hitting the ceiling is a policy choice, not an error.

use std::time::Duration;

use crate::codec::{BlockLayout, FileHeader};
use crate::config::{SessionConfig, SessionMode};
use crate::error::{RecPlayError, Result};
use crate::store::{self, BlockStore};

use super::pacing::{Pacer, SleepPacer};

/// What one record tick did with the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Block encoded and written at the next sequential index
    Captured,
    /// Block ceiling reached, payload ignored, device continues live
    PassThrough,
}

/// Recording half of the session controller
pub struct Recorder {
    store: Box<dyn BlockStore>,
    layout: BlockLayout,
    max_blocks: u64,
    written: u64,
    write_delay: Duration,
    pacer: Box<dyn Pacer>,
    closed: bool,
}

impl Recorder {
    /// Open a capture file for recording per `config`.
    pub fn open(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        if config.mode() != SessionMode::Record {
            return Err(RecPlayError::Config("record flag is not set".into()));
        }
        let layout = BlockLayout::for_bandwidth(config.bandwidth)?;
        let header = FileHeader {
            device_type: config.device_type,
            tx_sample_advance: config.tx_sample_advance,
            bandwidth: config.bandwidth,
        };
        let store = store::open_record(
            &config.file_path,
            &header,
            layout,
            config.max_blocks,
            config.strategy,
        )?;
        tracing::info!(
            "recording up to {} blocks ({} payload bytes each) to {:?}",
            config.max_blocks,
            layout.payload_len(),
            config.file_path
        );
        Ok(Self::from_store(
            store,
            config.max_blocks,
            Duration::from_micros(config.write_delay_us),
            Box::new(SleepPacer),
        ))
    }

    /// Build a recorder from an already-open store.
    ///
    /// This is the injection seam for tests and for drivers that manage
    /// the store themselves.
    pub fn from_store(
        store: Box<dyn BlockStore>,
        max_blocks: u64,
        write_delay: Duration,
        pacer: Box<dyn Pacer>,
    ) -> Self {
        let layout = store.layout();
        Self {
            store,
            layout,
            max_blocks,
            written: 0,
            write_delay,
            pacer,
            closed: false,
        }
    }

    /// Persist one subframe, invoked once per tick by the device driver.
    ///
    /// Enforces the configured write delay after each captured block,
    /// emulating the completion latency of a real device write.
    pub fn record(&mut self, timestamp: i64, payload: &[u8]) -> Result<RecordOutcome> {
        if self.closed {
            return Err(RecPlayError::Closed);
        }
        if self.written >= self.max_blocks {
            return Ok(RecordOutcome::PassThrough);
        }

        let block = self.layout.encode_block(timestamp, payload)?;
        self.store.write_block(self.written, &block)?;
        self.written += 1;
        if self.written == self.max_blocks {
            tracing::info!(
                "recording complete at {} blocks, passing through from now on",
                self.written
            );
        }
        self.pacer.pause(self.write_delay);
        Ok(RecordOutcome::Captured)
    }

    /// Blocks captured so far
    pub fn blocks_written(&self) -> u64 {
        self.written
    }

    /// Whether the block ceiling has been reached
    pub fn is_full(&self) -> bool {
        self.written >= self.max_blocks
    }

    /// Flush, truncate to the written extent and release the store.
    /// Idempotent; also runs on drop.
    pub fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            tracing::debug!("closing recorder after {} blocks", self.written);
            self.store.close()?;
        }
        Ok(())
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::pacing::NoopPacer;
    use crate::store::MappedStore;
    use std::path::Path;

    fn layout() -> BlockLayout {
        BlockLayout::with_payload_len(8)
    }

    fn header() -> FileHeader {
        FileHeader {
            device_type: 1,
            tx_sample_advance: 0,
            bandwidth: 1.4e6,
        }
    }

    fn test_recorder(path: &Path, max_blocks: u64) -> Recorder {
        let store = MappedStore::create(path, &header(), layout(), max_blocks).unwrap();
        Recorder::from_store(
            Box::new(store),
            max_blocks,
            Duration::ZERO,
            Box::new(NoopPacer),
        )
    }

    #[test]
    fn test_records_until_ceiling_then_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cap.iq");
        let mut recorder = test_recorder(&path, 3);

        for i in 0..3 {
            assert_eq!(
                recorder.record(i, b"AAAAAAAA").unwrap(),
                RecordOutcome::Captured
            );
        }
        assert!(recorder.is_full());
        // Extra ticks are silent no-ops, not errors.
        for i in 3..6 {
            assert_eq!(
                recorder.record(i, b"AAAAAAAA").unwrap(),
                RecordOutcome::PassThrough
            );
        }
        assert_eq!(recorder.blocks_written(), 3);
        recorder.close().unwrap();

        let (_, _, total) = MappedStore::open(&path, layout()).unwrap();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_payload_size_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cap.iq");
        let mut recorder = test_recorder(&path, 2);

        assert!(matches!(
            recorder.record(0, b"short"),
            Err(RecPlayError::PayloadSize { .. })
        ));
        assert_eq!(recorder.blocks_written(), 0);
    }

    #[test]
    fn test_record_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cap.iq");
        let mut recorder = test_recorder(&path, 2);

        recorder.record(0, b"AAAAAAAA").unwrap();
        recorder.close().unwrap();
        recorder.close().unwrap();
        assert!(matches!(
            recorder.record(1, b"BBBBBBBB"),
            Err(RecPlayError::Closed)
        ));
    }

    #[test]
    fn test_open_rejects_wrong_mode() {
        let config = SessionConfig {
            replay: true,
            ..Default::default()
        };
        assert!(matches!(
            Recorder::open(&config),
            Err(RecPlayError::Config(_))
        ));
    }
}
