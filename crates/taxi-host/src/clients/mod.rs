pub mod usb;

pub use usb::{UsbClient, UsbError};
