pub mod clients;
pub mod error;
pub mod frames;

pub use clients::{UsbClient, UsbError};
pub use error::{Error, Result};
pub use taxi_icd as icd;
