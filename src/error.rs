//! Error types
//!
//! Nothing in this firmware is fatal. Bus faults abort the open transaction and
//! the host retries, protocol rejections turn into a not-acknowledge on the
//! wire. The types exist so that the reason can be logged and tested.

use core::fmt;

/// Faults reported by the TWI client hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusFault {
    /// Illegal bus condition, e.g. a START or STOP in the middle of a byte.
    BusError,
    /// Another device drove the bus while this one was transmitting.
    ArbitrationLost,
}

impl fmt::Display for BusFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusFault::BusError => write!(f, "bus error"),
            BusFault::ArbitrationLost => write!(f, "arbitration lost"),
        }
    }
}

/// Reasons for a decode layer to not-acknowledge a byte or a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    /// The command byte does not select any register.
    UnsupportedRegister(u8),
    /// Only the command byte may be written, registers are read-only.
    UnsupportedWrite,
    /// The host asked for more bytes than there are.
    EndOfData,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnsupportedRegister(index) => write!(f, "unsupported register {}", index),
            Rejection::UnsupportedWrite => write!(f, "unsupported write"),
            Rejection::EndOfData => write!(f, "end of data"),
        }
    }
}
