#![no_std]
//! Capture-session control for the TAXI logic-analyzer front-end.
//!
//! Arbitrates the front-end's GPIO control lines through a shared pin
//! reservation registry, binds the SGPIO capture engine to the TAXI data
//! lines, and aligns the start of capture to the gaps in the DSTRB strobe.
//! Hardware access goes through the traits in [`hal`]; the wiring itself is
//! static data in [`board`].

mod fmt;

pub mod board;
pub mod capture;
mod error;
pub mod hal;
pub mod pins;
mod session;
pub mod sync;
mod transaction;

pub use error::Error;
pub use session::{Operation, Platform, SessionController, SessionState};
pub use sync::SyncConfig;
pub use transaction::{acquire, OwnedPinSet};
