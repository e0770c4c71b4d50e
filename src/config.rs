//! Session configuration
//!
//! An explicit configuration struct, populated once at startup (by the
//! host's command-line/config layer or from a TOML file) and passed by
//! reference into the session constructors. Record and replay are
//! mutually exclusive; `validate` rejects bad combinations before any
//! file I/O is attempted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RecPlayError, Result};

/// Default capture file path
pub const DEFAULT_CAPTURE_FILE: &str = "/tmp/iqfile";

/// Default maximum recorded blocks (two minutes of 1 ms subframes)
pub const DEFAULT_MAX_BLOCKS: u64 = 120_000;

/// Default number of full replay passes
pub const DEFAULT_LOOPS: u32 = 5;

/// Default per-block read delay in replay, microseconds
pub const DEFAULT_READ_DELAY_US: u64 = 700;

/// Default per-block write delay in record, microseconds
pub const DEFAULT_WRITE_DELAY_US: u64 = 15;

/// Default bandwidth in Hz (the 5 MHz reference class)
pub const DEFAULT_BANDWIDTH: f64 = 5.0e6;

/// Session mode derived from the record/replay flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Neither flag set, the subsystem stays out of the device path
    #[default]
    Disabled,
    /// Persist blocks from the device driver into the capture file
    Record,
    /// Feed blocks from the capture file back to the driver
    Replay,
}

/// Storage strategy for the capture file region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Map when the region fits the address-space reservation cap,
    /// stream otherwise
    #[default]
    Auto,
    /// Always memory-map the whole pre-sized region
    Mapped,
    /// Always use positioned file I/O
    Streamed,
}

/// Configuration for one record or replay session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path of the file used for subframe record or replay
    pub file_path: PathBuf,
    /// Record subframes from the device driver into the capture file
    pub record: bool,
    /// Replay subframes from the capture file
    pub replay: bool,
    /// Maximum count of subframes recorded before pass-through
    pub max_blocks: u64,
    /// Number of full replay passes (0 = infinite)
    pub loops: u32,
    /// Delay in microseconds to read one subframe in replay mode
    pub read_delay_us: u64,
    /// Delay in microseconds to write one subframe in record mode
    pub write_delay_us: u64,
    /// Hardware profile tag written into the file header
    pub device_type: u64,
    /// Transmit timing correction written into the file header
    pub tx_sample_advance: u64,
    /// Bandwidth in Hz, declares the payload size class
    pub bandwidth: f64,
    /// Storage strategy for the capture file region
    pub strategy: Strategy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from(DEFAULT_CAPTURE_FILE),
            record: false,
            replay: false,
            max_blocks: DEFAULT_MAX_BLOCKS,
            loops: DEFAULT_LOOPS,
            read_delay_us: DEFAULT_READ_DELAY_US,
            write_delay_us: DEFAULT_WRITE_DELAY_US,
            device_type: 0,
            tx_sample_advance: 0,
            bandwidth: DEFAULT_BANDWIDTH,
            strategy: Strategy::default(),
        }
    }
}

impl SessionConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| RecPlayError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject invalid option combinations before any file I/O.
    pub fn validate(&self) -> Result<()> {
        if self.record && self.replay {
            return Err(RecPlayError::Config(
                "record and replay are mutually exclusive".into(),
            ));
        }
        if self.file_path.as_os_str().is_empty() {
            return Err(RecPlayError::Config("capture file path is empty".into()));
        }
        if (self.record || self.replay) && self.max_blocks == 0 {
            return Err(RecPlayError::Config("max_blocks must be at least 1".into()));
        }
        Ok(())
    }

    /// Session mode derived from the record/replay flags
    pub fn mode(&self) -> SessionMode {
        match (self.record, self.replay) {
            (true, _) => SessionMode::Record,
            (_, true) => SessionMode::Replay,
            _ => SessionMode::Disabled,
        }
    }
}
