use derive_more::{Display, From};
use std::io;

use crate::clients::UsbError;
use taxi_icd::TaxiStatus;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, From, Display)]
pub enum Error {
    #[display("no TAXI device found: {_0}")]
    #[from(skip)]
    NotFound(String),
    #[display("data stream closed by the device")]
    StreamClosed,
    #[display("{_0}")]
    Command(UsbError<TaxiStatus>),

    // External
    #[display("{_0}")]
    Io(io::Error),
}

impl std::error::Error for Error {}

impl From<UsbError<std::convert::Infallible>> for Error {
    fn from(value: UsbError<std::convert::Infallible>) -> Self {
        match value {
            UsbError::Comms(e) => Error::Command(UsbError::Comms(e)),
            UsbError::Endpoint(never) => match never {},
        }
    }
}

/// Combine the outcome of an operation with that of the cleanup that
/// followed it. The operation's error wins; a cleanup failure after it is
/// only logged.
pub fn keep_first<E: Into<Error>>(
    result: Result<()>,
    cleanup: std::result::Result<(), E>,
) -> Result<()> {
    match (result, cleanup) {
        (Err(e), Err(cleanup)) => {
            let cleanup: Error = cleanup.into();
            tracing::warn!(%cleanup, "cleanup failed after an earlier error");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), cleanup) => cleanup.map_err(Into::into),
    }
}
