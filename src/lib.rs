//! # recplay-rs: IQ subframe record/replay
//!
//! Lets a software-radio front-end substitute a captured stream of
//! baseband sample blocks for a live hardware device. In record mode,
//! fixed-size sample blocks (one per 1 ms subframe) produced by the
//! device driver are persisted to a capture file; in replay mode,
//! previously captured blocks are fed back into the signal-processing
//! pipeline with the original timing cadence, no hardware required.
//!
//! ## Architecture
//!
//! - **Codec** ([`codec`]): fixed binary layout of the file header and
//!   per-subframe blocks; pure encode/decode, no I/O
//! - **Store** ([`store`]): block-indexed access to the file-backed
//!   region, memory-mapped or streamed behind one trait
//! - **Session** ([`session`]): the record/replay state machine, its
//!   per-block pacing delays and the loop/wraparound cursor
//!
//! ## Example
//!
//! ```ignore
//! use recplay_rs::{Session, SessionConfig};
//!
//! let config = SessionConfig {
//!     replay: true,
//!     file_path: "/tmp/iqfile".into(),
//!     loops: 2,
//!     ..Default::default()
//! };
//!
//! let mut session = Session::from_config(&config)?;
//! if let Session::Replaying(player) = &mut session {
//!     // Once per subframe tick, until end-of-stream:
//!     while let Some(block) = player.next_block()? {
//!         deliver_to_pipeline(block.timestamp, block.payload);
//!     }
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use codec::{BlockLayout, FileHeader};
pub use config::{SessionConfig, SessionMode, Strategy};
pub use error::{FormatError, RecPlayError, Result};
pub use session::{Player, RecordOutcome, Recorder, ReplayBlock, Session};
pub use store::BlockStore;
