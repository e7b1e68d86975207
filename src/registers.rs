//! The register store holding the published measurements.
//!
//! Registers are 16-bit signed words selected by a small index. The main loop
//! is the only writer. The bus side only ever sees a [snapshot], taken once at
//! the start of each transaction, so a multi-byte read can not observe a value
//! that is half old and half new.
//!
//! [snapshot]: Registers::snapshot

use crate::fraction::Measurement;

/// The registers exposed on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Measured value of the first LED.
    Led1 = 0,
    /// Measured value of the second LED.
    Led2 = 1,
}

impl Register {
    /// All registers in index order.
    pub const ALL: [Register; 2] = [Register::Led1, Register::Led2];

    pub const fn index(self) -> u8 {
        self as u8
    }

    /// The register measured after this one.
    pub const fn next(self) -> Self {
        match self {
            Register::Led1 => Register::Led2,
            Register::Led2 => Register::Led1,
        }
    }
}

impl TryFrom<u8> for Register {
    type Error = u8;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Register::Led1),
            1 => Ok(Register::Led2),
            unknown => Err(unknown),
        }
    }
}

/// Read access to word registers.
pub trait RegisterView {
    /// Read the register with the given index, if it exists.
    fn read_word(&self, index: u8) -> Option<i16>;

    fn has_register(&self, index: u8) -> bool {
        self.read_word(index).is_some()
    }
}

/// A register store that can hand out consistent point-in-time copies.
pub trait Registers: RegisterView {
    type Snapshot: RegisterView;

    /// Capture the current values. Called once per bus transaction.
    fn snapshot(&self) -> Self::Snapshot;
}

/// Gives the main loop access to the store owned by a decode layer.
pub trait RegisterAccess {
    type Store;

    fn registers(&self) -> &Self::Store;
    fn registers_mut(&mut self) -> &mut Self::Store;
}

/// The measured values of both LEDs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedRegisters {
    values: [Measurement; 2],
}

impl LedRegisters {
    pub const fn new() -> Self {
        Self {
            values: [Measurement::ZERO; 2],
        }
    }

    pub fn get(&self, register: Register) -> Measurement {
        self.values[usize::from(register.index())]
    }

    pub fn set(&mut self, register: Register, value: Measurement) {
        self.values[usize::from(register.index())] = value;
    }
}

impl RegisterView for LedRegisters {
    fn read_word(&self, index: u8) -> Option<i16> {
        let register = Register::try_from(index).ok()?;
        Some(self.get(register).bits())
    }
}

impl Registers for LedRegisters {
    type Snapshot = Self;

    fn snapshot(&self) -> Self {
        *self
    }
}
