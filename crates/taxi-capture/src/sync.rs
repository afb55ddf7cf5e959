//! Frame synchronization against the DSTRB strobe.
//!
//! The strobe is a periodic pulse train with idle gaps between frames.
//! Capture is armed from inside such a gap so the first sampled word lines up
//! with the start of a frame.

use embassy_time::Duration;
use embedded_hal::digital::InputPin;

use crate::error::{errno, Error};
use crate::hal::TimeSource;

/// Tuning for the strobe synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncConfig {
    /// Time without a rising edge that counts as a gap between frames.
    pub window: Duration,
    /// Number of gaps to wait for back to back before arming capture.
    pub passes: u8,
    /// Upper bound on a single wait. `None` waits for as long as the strobe
    /// keeps pulsing, which assumes the upstream hardware always leaves gaps.
    pub timeout: Option<Duration>,
}

impl SyncConfig {
    pub const DEFAULT_WINDOW: Duration = Duration::from_micros(1000);
    pub const DEFAULT_PASSES: u8 = 2;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
}

impl SyncConfig {
    /// Check that these settings can arm capture on a quiet strobe.
    ///
    /// At least one pass must run, the window must be non-zero, and a
    /// timeout must leave room for a full window.
    pub fn validate(&self) -> Result<(), Error> {
        if self.passes == 0 || self.window == Duration::from_ticks(0) {
            return Err(Error::InvalidConfig);
        }
        match self.timeout {
            Some(timeout) if timeout <= self.window => Err(Error::InvalidConfig),
            _ => Ok(()),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            window: Self::DEFAULT_WINDOW,
            passes: Self::DEFAULT_PASSES,
            timeout: Some(Self::DEFAULT_TIMEOUT),
        }
    }
}

/// Block until `status` has shown no rising edge for a full `window`.
///
/// The baseline restarts on every low to high transition, so this returns
/// between `window` and `window` plus one polling interval after the last
/// edge. Fails with [`Error::SyncTimeout`] once `timeout` has passed since
/// the call started.
pub fn wait_for_quiescence<S: InputPin, C: TimeSource>(
    status: &mut S,
    clock: &C,
    window: Duration,
    timeout: Option<Duration>,
) -> Result<(), Error> {
    let start = clock.now();
    let mut base = start;
    let mut prev = false;

    loop {
        let now = clock.now();
        if now.saturating_duration_since(base) >= window {
            return Ok(());
        }
        if let Some(timeout) = timeout {
            if now.saturating_duration_since(start) >= timeout {
                warn!("taxi: strobe never went quiet");
                return Err(Error::SyncTimeout);
            }
        }

        let level = status
            .is_high()
            .map_err(|_| Error::DriverConfigFailure(errno::EIO))?;
        if !prev && level {
            base = clock.now();
        }
        prev = level;
    }
}

/// Run [`wait_for_quiescence`] once per configured pass.
///
/// Waiting for more than one gap keeps a single spurious early edge from
/// arming capture mid-frame.
pub fn settle<S: InputPin, C: TimeSource>(
    status: &mut S,
    clock: &C,
    config: &SyncConfig,
) -> Result<(), Error> {
    for pass in 0..config.passes {
        trace!("taxi: frame sync pass {}", pass);
        wait_for_quiescence(status, clock, config.window, config.timeout)?;
    }
    Ok(())
}
