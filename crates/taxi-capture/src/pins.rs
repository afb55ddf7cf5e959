//! Pin identities and the GPIO to SCU translation table.

/// Identifier of a software class that can own pins in the reservation
/// registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClassId(pub u16);

/// A GPIO line, addressed as `GPIO<port>[<pin>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioPin {
    pub port: u8,
    pub pin: u8,
}

/// A physical pin in the system control unit, addressed as `P<group>_<pin>`.
///
/// This is the identity the reservation registry and the pin multiplexer
/// work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScuPin {
    pub group: u8,
    pub pin: u8,
}

/// Pull resistor policy applied when a pin is multiplexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    None,
    Up,
    Down,
    Repeater,
}

/// Translation of a GPIO line into its physical pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMapping {
    pub scu: ScuPin,
    pub pull: Pull,
}

impl GpioPin {
    pub const fn new(port: u8, pin: u8) -> Self {
        Self { port, pin }
    }

    /// Looks up the physical pin behind this GPIO line.
    ///
    /// Returns `None` for lines that are not bonded out.
    pub fn mapping(&self) -> Option<PinMapping> {
        let scu = *GPIO_SCU_MAP
            .get(self.port as usize)?
            .get(self.pin as usize)?;
        Some(PinMapping { scu, pull: Pull::None })
    }
}

impl ScuPin {
    pub const fn new(group: u8, pin: u8) -> Self {
        Self { group, pin }
    }
}

impl core::fmt::Display for GpioPin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "GPIO{}[{}]", self.port, self.pin)
    }
}

impl core::fmt::Display for ScuPin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "P{:X}_{}", self.group, self.pin)
    }
}

const fn p(group: u8, pin: u8) -> ScuPin {
    ScuPin::new(group, pin)
}

/// SCU location of each GPIO line, indexed by `[port][pin]`.
#[rustfmt::skip]
static GPIO_SCU_MAP: [[ScuPin; 16]; 4] = [
    // GPIO0
    [
        p(0, 0), p(0, 1), p(1, 15), p(1, 16),
        p(1, 0), p(6, 6), p(3, 6), p(2, 7),
        p(1, 1), p(1, 2), p(1, 3), p(1, 4),
        p(1, 17), p(1, 18), p(2, 10), p(1, 20),
    ],
    // GPIO1
    [
        p(1, 7), p(1, 8), p(1, 9), p(1, 10),
        p(1, 11), p(1, 12), p(1, 13), p(1, 14),
        p(1, 5), p(1, 6), p(2, 9), p(2, 11),
        p(2, 12), p(2, 13), p(3, 4), p(3, 5),
    ],
    // GPIO2
    [
        p(4, 0), p(4, 1), p(4, 2), p(4, 3),
        p(4, 4), p(4, 5), p(4, 6), p(5, 7),
        p(6, 12), p(5, 0), p(5, 1), p(5, 2),
        p(5, 3), p(5, 4), p(5, 5), p(5, 6),
    ],
    // GPIO3
    [
        p(6, 1), p(6, 2), p(6, 3), p(6, 4),
        p(6, 5), p(6, 9), p(6, 10), p(6, 11),
        p(7, 0), p(7, 1), p(7, 2), p(7, 3),
        p(7, 4), p(7, 5), p(7, 6), p(7, 7),
    ],
];
