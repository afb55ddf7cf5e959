//! TAXI front-end wiring.
//!
//! Static tables describing which lines the TAXI receiver uses. Bit `n` of a
//! sampled byte comes from `TAXI_DATA_PINS[n]`, so the table order must match
//! the hardware.

use crate::capture::{
    BufferDescriptor, CaptureFunction, CaptureMode, ClockEdge, ClockSource,
    SgpioPinConfig, ShiftQualifier,
};
use crate::pins::{ClassId, GpioPin, Pull, ScuPin};

/// Class number the TAXI verbs and pin reservations are registered under.
pub const TAXI_CLASS: ClassId = ClassId(0x199);

/// Output enable of the U4 bus buffer.
pub const U4_OE: GpioPin = GpioPin::new(2, 11);
/// Output enable of the U5 bus buffer.
pub const U5_OE: GpioPin = GpioPin::new(3, 3);
pub const TRIGGER: GpioPin = GpioPin::new(0, 4);

pub const CONTROL_PIN_COUNT: usize = 3;

/// GPIO lines held for the duration of a session, acquired in this order.
pub const CONTROL_PINS: [GpioPin; CONTROL_PIN_COUNT] = [U4_OE, U5_OE, TRIGGER];

/// SCU alternate function that routes a pin to its SGPIO fast I/O.
pub const SGPIO_FAST_IO_FUNCTION: u8 = 7;

const fn sgpio(sgpio_pin: u8, group: u8, pin: u8) -> SgpioPinConfig {
    SgpioPinConfig { sgpio_pin, scu: ScuPin::new(group, pin), pull: Pull::None }
}

/// Data capture lines of the TAXI receiver.
pub const TAXI_DATA_PINS: [SgpioPinConfig; 8] = [
    sgpio(0, 0, 0),
    sgpio(1, 0, 1),
    sgpio(2, 1, 15),
    sgpio(3, 1, 16),
    sgpio(4, 7, 0),
    sgpio(5, 6, 6),
    sgpio(6, 6, 7),
    sgpio(7, 6, 8),
];

/// Command strobe.
pub const TAXI_CSTRB_PIN: SgpioPinConfig = sgpio(8, 4, 2);

/// Data strobe. Clocks the data lines in, and its gaps mark frame
/// boundaries.
pub const TAXI_DSTRB_PIN: SgpioPinConfig = sgpio(9, 4, 3);

/// Mirror of the shift clock, for probing.
pub const CLKOUT_PIN: SgpioPinConfig = sgpio(15, 4, 10);

/// Size of the bulk streaming buffer: 16384 * 2 bytes.
pub const CAPTURE_BUFFER: BufferDescriptor = BufferDescriptor { order: 15 };

/// The single capture function of the TAXI receiver: observe the eight
/// data lines on each rising DSTRB edge and stream into the bulk buffer.
pub static TAXI_FUNCTIONS: [CaptureFunction; 1] = [CaptureFunction {
    enabled: true,
    mode: CaptureMode::StreamDataIn,
    pins: &TAXI_DATA_PINS,
    shift_clock_source: ClockSource::Sgpio(TAXI_DSTRB_PIN.sgpio_pin),
    shift_clock_edge: ClockEdge::Rising,
    shift_clock_qualifier: ShiftQualifier::Always,
    buffer: CAPTURE_BUFFER,
    shift_clock_output: Some(&CLKOUT_PIN),
}];
