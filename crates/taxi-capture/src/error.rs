/// Errno-style status values reported to the command layer.
pub(crate) mod errno {
    pub const EPERM: i32 = 1;
    pub const EIO: i32 = 5;
    pub const EBUSY: i32 = 16;
    pub const EINVAL: i32 = 22;
    pub const ETIMEDOUT: i32 = 110;
}

/// Errors that can occur while starting or stopping a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The GPIO line has no physical pin behind it.
    InvalidPin,
    /// The pin is reserved by another class.
    PinBusy,
    /// An external driver call failed with the given code.
    DriverConfigFailure(i32),
    /// The operation is not legal in the current session state.
    InvalidState,
    /// The strobe line never went quiet within the configured timeout.
    SyncTimeout,
    /// Synchronizer settings that could never arm capture correctly.
    InvalidConfig,
}

impl Error {
    /// Status code carried back to the command transport.
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidPin => errno::EINVAL,
            Error::PinBusy => errno::EBUSY,
            Error::DriverConfigFailure(code) => *code,
            Error::InvalidState => errno::EPERM,
            Error::SyncTimeout => errno::ETIMEDOUT,
            Error::InvalidConfig => errno::EINVAL,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidPin => write!(f, "GPIO line has no physical pin"),
            Error::PinBusy => write!(f, "pin is reserved by another class"),
            Error::DriverConfigFailure(code) => {
                write!(f, "driver call failed: {}", code)
            }
            Error::InvalidState => {
                write!(f, "operation not valid in current session state")
            }
            Error::SyncTimeout => {
                write!(f, "timed out waiting for a gap in the strobe")
            }
            Error::InvalidConfig => {
                write!(f, "synchronizer settings out of range")
            }
        }
    }
}
