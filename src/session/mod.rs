//! Record/replay session controller
//!
//! One [`Session`] is constructed from the configuration at startup and
//! handed to the device driver, which calls its tick methods directly —
//! no global hooks. The session is single-threaded and tick-driven:
//! exactly one call per subframe period, made synchronously from the
//! driver's sample-processing thread. Close requests are observed
//! between ticks and always run the store teardown.

pub mod pacing;
pub mod player;
pub mod recorder;

pub use pacing::{NoopPacer, Pacer, SleepPacer};
pub use player::{Player, ReplayBlock};
pub use recorder::{RecordOutcome, Recorder};

use crate::config::{SessionConfig, SessionMode};
use crate::error::Result;

/// A configured record/replay session, owned by one device driver
pub enum Session {
    /// Neither mode enabled; the driver runs the live device untouched
    Disabled,
    /// Capturing device output into the file
    Recording(Recorder),
    /// Substituting file content for the live device
    Replaying(Player),
}

impl Session {
    /// Build the session the configuration asks for.
    ///
    /// Configuration and open-time format errors abort session start.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        match config.mode() {
            SessionMode::Disabled => Ok(Session::Disabled),
            SessionMode::Record => Ok(Session::Recording(Recorder::open(config)?)),
            SessionMode::Replay => Ok(Session::Replaying(Player::open(config)?)),
        }
    }

    /// Mode this session was built for
    pub fn mode(&self) -> SessionMode {
        match self {
            Session::Disabled => SessionMode::Disabled,
            Session::Recording(_) => SessionMode::Record,
            Session::Replaying(_) => SessionMode::Replay,
        }
    }

    /// Whether the subsystem is out of the device path entirely
    pub fn is_disabled(&self) -> bool {
        matches!(self, Session::Disabled)
    }

    /// Close whichever half is active. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        match self {
            Session::Disabled => Ok(()),
            Session::Recording(recorder) => recorder.close(),
            Session::Replaying(player) => player.close(),
        }
    }
}
