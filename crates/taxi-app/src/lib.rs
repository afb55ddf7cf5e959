#![no_std]
//! TAXI command class.
//!
//! Binds the verbs a host can send to a [`taxi_capture::SessionController`]
//! shared behind an async mutex. Board support supplies the
//! [`taxi_capture::Platform`] and routes decoded requests here.

mod fmt;

pub mod class;
mod service;

pub use class::{
    TaxiVerb, TaxiVerbError, CLASS_DOC, CLASS_NAME, CLASS_NUMBER, VERBS,
};
pub use service::TaxiService;
