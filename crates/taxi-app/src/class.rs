//! Command class registration for the TAXI front end.

use taxi_capture::board::TAXI_CLASS;

pub const CLASS_NUMBER: u16 = TAXI_CLASS.0;
pub const CLASS_NAME: &str = "taxi";
pub const CLASS_DOC: &str = "functionality for TAXIChip";

/// Verbs of the TAXI class, numbered as they are on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TaxiVerb {
    StartReceive = 0,
    Stop = 1,
}

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaxiVerbError {
    InvalidConversion(u8),
}

impl TryFrom<u8> for TaxiVerb {
    type Error = TaxiVerbError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TaxiVerb::StartReceive),
            1 => Ok(TaxiVerb::Stop),
            _ => Err(TaxiVerbError::InvalidConversion(value)),
        }
    }
}

impl From<TaxiVerb> for u8 {
    fn from(value: TaxiVerb) -> Self {
        value as u8
    }
}

/// Introspection record for one verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbInfo {
    pub verb: TaxiVerb,
    pub name: &'static str,
    pub doc: &'static str,
}

pub const VERBS: [VerbInfo; 2] = [
    VerbInfo {
        verb: TaxiVerb::StartReceive,
        name: "start_receive",
        doc: "Start receipt of TAXI data on the primary bulk comms pipe.",
    },
    VerbInfo {
        verb: TaxiVerb::Stop,
        name: "stop",
        doc: "Halt TAXI communications and release the control lines.",
    },
];

impl TaxiVerb {
    pub fn info(self) -> &'static VerbInfo {
        &VERBS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn doc(self) -> &'static str {
        self.info().doc
    }

    pub fn from_name(name: &str) -> Option<Self> {
        VERBS.iter().find(|v| v.name == name).map(|v| v.verb)
    }
}
