//! Pacing delays emulating device completion latency
//!
//! Record and replay insert a deliberate per-block wait so the host
//! experiences the read/write latency of the real device. The mechanism
//! sits behind the [`Pacer`] trait so tests can substitute a
//! deterministic implementation.

use std::time::{Duration, Instant};

/// Sleeps below which [`SleepPacer`] spins instead of yielding
const SPIN_THRESHOLD: Duration = Duration::from_millis(1);

/// Per-block pacing delay mechanism
///
/// Waits are best-effort: overshoot beyond the subframe tick budget is
/// not corrected, matching a worst-case device rather than a periodic
/// clock.
pub trait Pacer: Send {
    /// Block the calling thread for roughly `delay`.
    fn pause(&mut self, delay: Duration);
}

/// Default pacer: sleep for millisecond-scale delays, spin below
///
/// The configured delays are tens to hundreds of microseconds, well
/// under the scheduler's sleep granularity, so short waits busy-spin on
/// the monotonic clock.
#[derive(Debug, Default)]
pub struct SleepPacer;

impl Pacer for SleepPacer {
    fn pause(&mut self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        if delay >= SPIN_THRESHOLD {
            std::thread::sleep(delay);
        } else {
            let deadline = Instant::now() + delay;
            while Instant::now() < deadline {
                std::hint::spin_loop();
            }
        }
    }
}

/// Pacer that skips all delays, for headless replay and tests
#[derive(Debug, Default)]
pub struct NoopPacer;

impl Pacer for NoopPacer {
    fn pause(&mut self, _delay: Duration) {}
}
