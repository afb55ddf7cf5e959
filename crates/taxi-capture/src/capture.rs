//! Declarative description of an SGPIO capture function.
//!
//! These types are handed to the external capture driver as configuration;
//! the driver performs the sampling.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin};

use crate::hal::CaptureEngine;
use crate::pins::{Pull, ScuPin};

/// Binding of one SGPIO line to its physical pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SgpioPinConfig {
    pub sgpio_pin: u8,
    pub scu: ScuPin,
    pub pull: Pull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureMode {
    /// Shift samples in from the pins and stream them into the buffer.
    StreamDataIn,
    /// Shift the buffer contents out onto the pins.
    StreamDataOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// The engine's internal counter.
    Local,
    /// An external clock arriving on the given SGPIO line.
    Sgpio(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockEdge {
    Rising,
    Falling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftQualifier {
    /// Shift on every edge of the shift clock.
    Always,
    /// Shift only while the given SGPIO line is high.
    WhenHigh(u8),
    /// Shift only while the given SGPIO line is low.
    WhenLow(u8),
}

/// Destination buffer of a capture function.
///
/// The buffer itself belongs to the bulk transport; only its size is known
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferDescriptor {
    /// Base two logarithm of the buffer length in bytes.
    pub order: u8,
}

impl BufferDescriptor {
    pub const fn len(&self) -> usize {
        1 << self.order
    }
}

/// One capture function: a group of data lines shifted in together on a
/// common clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureFunction {
    pub enabled: bool,
    pub mode: CaptureMode,
    /// Data lines. Table order is bit order within a sampled word.
    pub pins: &'static [SgpioPinConfig],
    pub shift_clock_source: ClockSource,
    pub shift_clock_edge: ClockEdge,
    pub shift_clock_qualifier: ShiftQualifier,
    pub buffer: BufferDescriptor,
    /// Pin that mirrors the shift clock, if any.
    pub shift_clock_output: Option<&'static SgpioPinConfig>,
}

impl CaptureFunction {
    /// Number of data lines sampled per shift.
    pub const fn bus_width(&self) -> usize {
        self.pins.len()
    }
}

/// One SGPIO line of a [`CaptureEngine`] viewed as a digital input.
///
/// Lines past the sixteen the engine reports always read low.
pub struct PinStateBit<'a, E: CaptureEngine> {
    engine: &'a mut E,
    bit: u8,
}

impl<'a, E: CaptureEngine> PinStateBit<'a, E> {
    pub fn new(engine: &'a mut E, bit: u8) -> Self {
        Self { engine, bit }
    }
}

impl<E: CaptureEngine> ErrorType for PinStateBit<'_, E> {
    type Error = Infallible;
}

impl<E: CaptureEngine> InputPin for PinStateBit<'_, E> {
    #[inline]
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mask = 1u16.checked_shl(u32::from(self.bit)).unwrap_or(0);
        Ok(self.engine.pin_state() & mask != 0)
    }

    #[inline]
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
