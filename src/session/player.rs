//! Replay session: feed recorded sample blocks back per subframe tick
//!
//! The device driver calls [`Player::next_block`] once per subframe and
//! treats the returned payload as freshly captured. Every block's magic
//! is validated on read; a mismatch is fatal for the session (the file
//! is untrustworthy beyond that point) but never crashes the host. The
//! cursor wraps around the file for the configured number of passes,
//! then the player signals end-of-stream with `None`.

use std::time::Duration;

use crate::codec::{BlockLayout, FileHeader, BLOCK_HEADER_SIZE};
use crate::config::{SessionConfig, SessionMode};
use crate::error::{RecPlayError, Result};
use crate::store::{self, BlockStore};

use super::pacing::{Pacer, SleepPacer};

/// One replayed subframe, borrowed from the store region
#[derive(Debug)]
pub struct ReplayBlock<'a> {
    /// Timestamp recorded with the block
    pub timestamp: i64,
    /// Raw IQ payload for one subframe
    pub payload: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerState {
    Playing,
    /// Loop count exhausted; the next tick signals end-of-stream
    Ended,
    Closed,
}

/// Replaying half of the session controller
pub struct Player {
    store: Box<dyn BlockStore>,
    layout: BlockLayout,
    header: FileHeader,
    total_blocks: u64,
    cursor: u64,
    /// Remaining full passes, `None` for infinite replay
    loops_remaining: Option<u32>,
    read_delay: Duration,
    pacer: Box<dyn Pacer>,
    state: PlayerState,
}

impl Player {
    /// Open a capture file for replay per `config`.
    pub fn open(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        if config.mode() != SessionMode::Replay {
            return Err(RecPlayError::Config("replay flag is not set".into()));
        }
        let (store, header, total_blocks) =
            store::open_replay(&config.file_path, config.strategy)?;
        tracing::info!(
            "replaying {} blocks from {:?} ({} passes, {} µs read delay)",
            total_blocks,
            config.file_path,
            if config.loops == 0 {
                "infinite".to_string()
            } else {
                config.loops.to_string()
            },
            config.read_delay_us
        );
        Ok(Self::from_store(
            store,
            header,
            config.loops,
            Duration::from_micros(config.read_delay_us),
            Box::new(SleepPacer),
        ))
    }

    /// Build a player from an already-open store.
    ///
    /// Injection seam for tests and for drivers that manage the store
    /// themselves. `loops == 0` replays forever.
    pub fn from_store(
        store: Box<dyn BlockStore>,
        header: FileHeader,
        loops: u32,
        read_delay: Duration,
        pacer: Box<dyn Pacer>,
    ) -> Self {
        let layout = store.layout();
        let total_blocks = store.total_blocks();
        let state = if total_blocks == 0 {
            PlayerState::Ended
        } else {
            PlayerState::Playing
        };
        Self {
            store,
            layout,
            header,
            total_blocks,
            cursor: 0,
            loops_remaining: (loops > 0).then_some(loops),
            read_delay,
            pacer,
            state,
        }
    }

    /// Header of the capture file being replayed
    ///
    /// The driver needs the recorded device type, bandwidth and
    /// transmit-sample-advance to stand in for the live hardware.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Blocks available per pass
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    /// Index the next tick will deliver
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Deliver the next subframe, invoked once per tick by the driver.
    ///
    /// Returns `Ok(None)` exactly once per session when the loop count
    /// is exhausted; the last valid block is still delivered in full on
    /// the call before. Enforces the configured read delay before
    /// returning, emulating device read completion latency.
    pub fn next_block(&mut self) -> Result<Option<ReplayBlock<'_>>> {
        match self.state {
            PlayerState::Closed => return Ok(None),
            PlayerState::Ended => {
                tracing::debug!("replay reached end-of-stream");
                self.teardown();
                return Ok(None);
            }
            PlayerState::Playing => {}
        }

        let index = self.cursor;
        // Validation pass; the borrow ends before any teardown below.
        let validated = match self.store.read_block(index) {
            Ok(bytes) => match self.layout.decode_block(bytes) {
                Ok((timestamp, _)) => Ok(timestamp),
                Err(source) => Err(RecPlayError::Corruption { index, source }),
            },
            Err(e) => Err(e),
        };
        let timestamp = match validated {
            Ok(ts) => ts,
            Err(e) => {
                tracing::error!("replay failed at block {}: {}", index, e);
                self.teardown();
                return Err(e);
            }
        };

        self.pacer.pause(self.read_delay);
        self.advance();

        // Re-borrow for the caller; free for the mapped strategy, one
        // extra positioned read when streaming.
        let bytes = self.store.read_block(index)?;
        Ok(Some(ReplayBlock {
            timestamp,
            payload: &bytes[BLOCK_HEADER_SIZE..],
        }))
    }

    /// Move the cursor one block forward, wrapping at end of file until
    /// the loop count runs out.
    fn advance(&mut self) {
        self.cursor += 1;
        if self.cursor < self.total_blocks {
            return;
        }
        match self.loops_remaining.as_mut() {
            None => {
                self.cursor = 0;
                tracing::debug!("replay wrapped to block 0");
            }
            Some(remaining) => {
                *remaining -= 1;
                if *remaining == 0 {
                    self.state = PlayerState::Ended;
                } else {
                    self.cursor = 0;
                    tracing::debug!("replay wrapped, {} passes remaining", remaining);
                }
            }
        }
    }

    fn teardown(&mut self) {
        self.state = PlayerState::Closed;
        if let Err(e) = self.store.close() {
            tracing::warn!("error releasing replay store: {}", e);
        }
    }

    /// Release the store and end the session. Idempotent; also runs on
    /// drop. Subsequent ticks return end-of-stream.
    pub fn close(&mut self) -> Result<()> {
        if self.state != PlayerState::Closed {
            self.state = PlayerState::Closed;
            tracing::debug!("closing player at block {}", self.cursor);
            self.store.close()?;
        }
        Ok(())
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
