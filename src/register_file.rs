//! A plain byte-addressed register file on top of [`TwiClient`](crate::twi::TwiClient).
//!
//! This is the protocol of many simple I2C sensors and EEPROMs: the first byte
//! written in a transaction sets the address pointer, reads return the bytes
//! from there on and advance the pointer. The pointer survives the end of the
//! transaction, so a plain read continues where the last one stopped.
//!
//! The word registers are mapped little-endian: register `n` occupies the byte
//! addresses `2n` (low byte) and `2n + 1` (high byte).

use crate::error::Rejection;
use crate::registers::{RegisterAccess, RegisterView, Registers};
use crate::twi::Io;

pub struct RegisterFile<R: Registers> {
    registers: R,
    snapshot: Option<R::Snapshot>,
    pointer: u8,
    pointer_written: bool,
}

impl<R: Registers> RegisterFile<R> {
    pub fn new(registers: R) -> Self {
        Self {
            registers,
            snapshot: None,
            pointer: 0,
            pointer_written: false,
        }
    }

    /// The byte address of the next read.
    pub fn pointer(&self) -> u8 {
        self.pointer
    }

    fn byte_at(&self, address: u8) -> Option<u8> {
        let word = self.snapshot.as_ref()?.read_word(address / 2)?;
        Some(word.to_le_bytes()[usize::from(address % 2)])
    }
}

impl<R: Registers> Io for RegisterFile<R> {
    fn transaction_start(&mut self) {
        self.snapshot = Some(self.registers.snapshot());
        self.pointer_written = false;
    }

    fn transaction_abort(&mut self) {
        self.transaction_stop();
    }

    fn transaction_stop(&mut self) {
        self.snapshot = None;
    }

    fn write_start(&mut self) -> Result<(), Rejection> {
        Ok(())
    }

    fn write(&mut self, data: u8) -> Result<(), Rejection> {
        if self.pointer_written {
            return Err(Rejection::UnsupportedWrite);
        }
        self.pointer_written = true;
        self.pointer = data;
        if self.byte_at(data).is_some() {
            Ok(())
        } else {
            Err(Rejection::UnsupportedRegister(data / 2))
        }
    }

    fn read_start(&mut self) -> Result<(), Rejection> {
        Ok(())
    }

    fn read(&mut self) -> Option<u8> {
        let data = self.byte_at(self.pointer)?;
        self.pointer = self.pointer.wrapping_add(1);
        Some(data)
    }
}

impl<R: Registers> RegisterAccess for RegisterFile<R> {
    type Store = R;

    fn registers(&self) -> &R {
        &self.registers
    }

    fn registers_mut(&mut self) -> &mut R {
        &mut self.registers
    }
}
