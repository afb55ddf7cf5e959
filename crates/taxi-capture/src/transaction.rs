//! All-or-nothing acquisition of a set of GPIO lines.

use heapless::Vec;

use crate::error::Error;
use crate::hal::{Direction, DriverCode, GpioDriver, PinRegistry};
use crate::pins::{ClassId, GpioPin, PinMapping};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct HeldPin {
    gpio: GpioPin,
    mapping: PinMapping,
}

/// A set of GPIO lines reserved, multiplexed and driven high for one owner.
///
/// Only [`acquire`] creates one, and [`release`](Self::release) is the only
/// way to hand the lines back.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use = "dropping an OwnedPinSet leaves its pins reserved"]
pub struct OwnedPinSet<const N: usize> {
    owner: ClassId,
    pins: Vec<HeldPin, N>,
}

/// Pins reserved so far by an [`acquire`] call in progress.
///
/// Dropping the guard before [`commit`](Self::commit) unwinds every
/// reservation it holds.
struct Acquisition<'a, R: PinRegistry, G: GpioDriver, const N: usize> {
    registry: &'a mut R,
    gpio: &'a mut G,
    owner: ClassId,
    held: Vec<HeldPin, N>,
}

/// Reserve and configure `pins` for `owner`, in order.
///
/// Either every pin ends up reserved, multiplexed as GPIO, set to output and
/// driven high, or none of them stays reserved when the error is returned.
pub fn acquire<R: PinRegistry, G: GpioDriver, const N: usize>(
    registry: &mut R,
    gpio: &mut G,
    pins: &[GpioPin; N],
    owner: ClassId,
) -> Result<OwnedPinSet<N>, Error> {
    let mut guard =
        Acquisition { registry, gpio, owner, held: Vec::new() };

    for &pin in pins {
        guard.set_up(pin)?;
    }

    Ok(guard.commit())
}

impl<R: PinRegistry, G: GpioDriver, const N: usize> Acquisition<'_, R, G, N> {
    fn set_up(&mut self, pin: GpioPin) -> Result<(), Error> {
        let mapping = pin.mapping().ok_or(Error::InvalidPin)?;

        if !self.registry.ensure_reservation(mapping.scu, self.owner) {
            warn!(
                "taxi: couldn't reserve busy pin GPIO{}[{}]!",
                pin.port,
                pin.pin
            );
            return Err(Error::PinBusy);
        }
        // One slot per requested pin, so this never overflows.
        let _ = self.held.push(HeldPin { gpio: pin, mapping });

        self.gpio.configure_pinmux(pin, mapping).map_err(|code| {
            warn!(
                "taxi: couldn't configure pinmux for GPIO{}[{}]!",
                pin.port,
                pin.pin
            );
            Error::DriverConfigFailure(code)
        })
    }

    fn commit(mut self) -> OwnedPinSet<N> {
        let pins = core::mem::take(&mut self.held);
        for held in &pins {
            self.gpio.set_direction(held.gpio, Direction::Output);
            self.gpio.set_high(held.gpio);
        }
        OwnedPinSet { owner: self.owner, pins }
    }
}

impl<R: PinRegistry, G: GpioDriver, const N: usize> Drop
    for Acquisition<'_, R, G, N>
{
    fn drop(&mut self) {
        for held in self.held.iter().rev() {
            if let Err(code) =
                tear_down(&mut *self.registry, &mut *self.gpio, held, self.owner)
            {
                error!(
                    "taxi: couldn't release GPIO{}[{}] during rollback ({})",
                    held.gpio.port,
                    held.gpio.pin,
                    code
                );
            }
        }
    }
}

impl<const N: usize> OwnedPinSet<N> {
    pub fn owner(&self) -> ClassId {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn contains(&self, pin: GpioPin) -> bool {
        self.pins.iter().any(|held| held.gpio == pin)
    }

    /// Return every line to high impedance and drop its reservation.
    ///
    /// All pins are processed even if some fail; the first failure is
    /// reported.
    pub fn release<R: PinRegistry, G: GpioDriver>(
        self,
        registry: &mut R,
        gpio: &mut G,
    ) -> Result<(), Error> {
        let mut result = Ok(());
        for held in &self.pins {
            if let Err(code) = tear_down(registry, gpio, held, self.owner) {
                warn!(
                    "taxi: couldn't release GPIO{}[{}] ({})",
                    held.gpio.port,
                    held.gpio.pin,
                    code
                );
                if result.is_ok() {
                    result = Err(Error::DriverConfigFailure(code));
                }
            }
        }
        result
    }
}

fn tear_down<R: PinRegistry, G: GpioDriver>(
    registry: &mut R,
    gpio: &mut G,
    held: &HeldPin,
    owner: ClassId,
) -> Result<(), DriverCode> {
    gpio.set_direction(held.gpio, Direction::Input);
    gpio.reset_pinmux(held.mapping);
    registry.release_reservation(held.mapping.scu, owner)
}
