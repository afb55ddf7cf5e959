//! Interfaces to the collaborators the session controller drives.
//!
//! The reservation registry, the GPIO block, the SGPIO capture driver, the
//! bulk transport and the time base all live outside this crate. Each is
//! reached through one trait here so boards and tests can supply their own.

use embassy_time::Instant;

use crate::capture::{CaptureFunction, SgpioPinConfig};
use crate::pins::{ClassId, GpioPin, PinMapping, ScuPin};

/// Raw status code returned by a failing driver call.
pub type DriverCode = i32;

/// Direction of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// High impedance.
    Input,
    Output,
}

/// Bookkeeping of which class owns which physical pin.
///
/// The registry is shared with every other class on the device.
pub trait PinRegistry {
    /// Reserve `pin` for `owner`.
    ///
    /// Succeeds if the pin is free or already held by `owner`. Returns `false`
    /// without side effects if another class holds it.
    fn ensure_reservation(&mut self, pin: ScuPin, owner: ClassId) -> bool;

    /// Give up `owner`'s reservation of `pin`.
    fn release_reservation(
        &mut self,
        pin: ScuPin,
        owner: ClassId,
    ) -> Result<(), DriverCode>;
}

/// The GPIO block and its pin multiplexer.
pub trait GpioDriver {
    /// Route the physical pin behind `pin` to its GPIO function.
    fn configure_pinmux(
        &mut self,
        pin: GpioPin,
        mapping: PinMapping,
    ) -> Result<(), DriverCode>;

    /// Return the physical pin to its reset function.
    fn reset_pinmux(&mut self, mapping: PinMapping);

    fn set_direction(&mut self, pin: GpioPin, direction: Direction);

    fn set_high(&mut self, pin: GpioPin);
}

/// The synchronous capture peripheral.
///
/// `halt` must be harmless on an engine that is not running.
pub trait CaptureEngine {
    /// Route `pin` to the fast I/O alternate `function` in the SCU.
    fn configure_fast_io(
        &mut self,
        pin: &SgpioPinConfig,
        function: u8,
    ) -> Result<(), DriverCode>;

    /// Register the function table with the engine. Nothing is sampled
    /// until [`run`](Self::run).
    fn set_up_functions(
        &mut self,
        functions: &'static [CaptureFunction],
    ) -> Result<(), DriverCode>;

    /// Start the shift clocks of every registered function.
    fn run(&mut self);

    fn halt(&mut self);

    /// Current level of the sixteen SGPIO lines, one bit per line.
    fn pin_state(&mut self) -> u16;
}

/// Moves captured bytes from a function's buffer to the host.
///
/// `stop_streaming` must be harmless when nothing is streaming.
pub trait BulkTransport {
    fn start_streaming(&mut self, function: &'static CaptureFunction);

    fn stop_streaming(&mut self);
}

/// Monotonic time base used for strobe synchronization.
pub trait TimeSource {
    fn now(&self) -> Instant;
}

/// [`TimeSource`] backed by the embassy time driver.
#[cfg(feature = "time-driver")]
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

#[cfg(feature = "time-driver")]
impl TimeSource for EmbassyClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}
