use embassy_time::Duration;
use postcard_schema::Schema;
use serde::{Deserialize, Serialize};
use taxi_capture::{Error, SessionState, SyncConfig};

/// Outcome of a TAXI verb as seen by the host.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Schema, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaxiStatus {
    Ok,
    InvalidPin,
    PinBusy,
    DriverFailure(i32),
    InvalidState,
    SyncTimeout,
    InvalidConfig,
}

impl TaxiStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, TaxiStatus::Ok)
    }

    /// Errno-style code, zero on success.
    pub fn code(&self) -> i32 {
        match self.into_result() {
            Ok(()) => 0,
            Err(e) => e.code(),
        }
    }

    pub fn into_result(self) -> Result<(), Error> {
        match self {
            TaxiStatus::Ok => Ok(()),
            TaxiStatus::InvalidPin => Err(Error::InvalidPin),
            TaxiStatus::PinBusy => Err(Error::PinBusy),
            TaxiStatus::DriverFailure(code) => {
                Err(Error::DriverConfigFailure(code))
            }
            TaxiStatus::InvalidState => Err(Error::InvalidState),
            TaxiStatus::SyncTimeout => Err(Error::SyncTimeout),
            TaxiStatus::InvalidConfig => Err(Error::InvalidConfig),
        }
    }
}

impl From<Error> for TaxiStatus {
    fn from(value: Error) -> Self {
        match value {
            Error::InvalidPin => TaxiStatus::InvalidPin,
            Error::PinBusy => TaxiStatus::PinBusy,
            Error::DriverConfigFailure(code) => TaxiStatus::DriverFailure(code),
            Error::InvalidState => TaxiStatus::InvalidState,
            Error::SyncTimeout => TaxiStatus::SyncTimeout,
            Error::InvalidConfig => TaxiStatus::InvalidConfig,
        }
    }
}

impl From<Result<(), Error>> for TaxiStatus {
    fn from(value: Result<(), Error>) -> Self {
        match value {
            Ok(()) => TaxiStatus::Ok,
            Err(e) => e.into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Schema, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionStatus {
    Idle,
    Acquiring,
    Configuring,
    Synchronizing,
    Streaming,
    Halting,
}

impl From<SessionState> for SessionStatus {
    fn from(value: SessionState) -> Self {
        match value {
            SessionState::Idle => SessionStatus::Idle,
            SessionState::Acquiring => SessionStatus::Acquiring,
            SessionState::Configuring => SessionStatus::Configuring,
            SessionState::Synchronizing => SessionStatus::Synchronizing,
            SessionState::Streaming => SessionStatus::Streaming,
            SessionState::Halting => SessionStatus::Halting,
        }
    }
}

/// Frame synchronizer settings on the wire.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Schema, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncSettings {
    /// Quiet window in microseconds.
    pub window_us: u32,
    pub passes: u8,
    /// Per-pass timeout in milliseconds. `None` waits forever.
    pub timeout_ms: Option<u32>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncConfig::default().into()
    }
}

impl From<SyncSettings> for SyncConfig {
    fn from(value: SyncSettings) -> Self {
        SyncConfig {
            window: Duration::from_micros(value.window_us.into()),
            passes: value.passes,
            timeout: value.timeout_ms.map(|ms| Duration::from_millis(ms.into())),
        }
    }
}

impl From<SyncConfig> for SyncSettings {
    fn from(value: SyncConfig) -> Self {
        let saturate = |v: u64| u32::try_from(v).unwrap_or(u32::MAX);
        SyncSettings {
            window_us: saturate(value.window.as_micros()),
            passes: value.passes,
            timeout_ms: value.timeout.map(|t| saturate(t.as_millis())),
        }
    }
}

/// Largest number of capture bytes carried by one [`CaptureChunk`].
pub const CAPTURE_CHUNK_LEN: usize = 512;

/// A slice of the capture buffer as drained by the bulk transport.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Schema, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureChunk {
    /// Increments by one per chunk within a session, so the host can spot
    /// dropped chunks.
    pub seq: u32,
    pub data: heapless::Vec<u8, CAPTURE_CHUNK_LEN>,
}
