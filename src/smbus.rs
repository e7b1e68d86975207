//! A subset of the SMBus protocol on top of [`TwiClient`](crate::twi::TwiClient).
//!
//! At the moment it only supports reading word (2-byte) registers:
//! ```text
//! S Addr Wr [A] Comm [A] Sr Addr Rd [A] [DataLow] A [DataHigh] NA P
//! ```
//! A read without a preceding command byte is accepted as well, so that a
//! Quick command or a presence probe succeeds (the transaction is expected to
//! end straight away).
//!
//! See <https://docs.kernel.org/i2c/smbus-protocol.html> for details.

use crate::error::Rejection;
use crate::registers::{RegisterAccess, RegisterView, Registers};
use crate::twi::Io;

pub struct SmbusClient<R: Registers> {
    registers: R,
    snapshot: Option<R::Snapshot>,
    command: Option<u8>,
    buffer: [u8; 2],
    index: usize,
}

impl<R: Registers> SmbusClient<R> {
    pub fn new(registers: R) -> Self {
        Self {
            registers,
            snapshot: None,
            command: None,
            buffer: [0; 2],
            index: 2,
        }
    }

    /// The command (register index) of the current transaction.
    pub fn command(&self) -> Option<u8> {
        self.command
    }

    fn read_word(&self, index: u8) -> Option<i16> {
        self.snapshot.as_ref()?.read_word(index)
    }
}

impl<R: Registers> Io for SmbusClient<R> {
    fn transaction_start(&mut self) {
        self.snapshot = Some(self.registers.snapshot());
        self.command = None;
        self.index = self.buffer.len();
    }

    fn transaction_abort(&mut self) {
        self.transaction_stop();
    }

    fn transaction_stop(&mut self) {
        self.snapshot = None;
    }

    fn write_start(&mut self) -> Result<(), Rejection> {
        self.index = 0;
        Ok(())
    }

    fn write(&mut self, data: u8) -> Result<(), Rejection> {
        if self.command.is_some() {
            // No register writes supported.
            return Err(Rejection::UnsupportedWrite);
        }
        self.command = Some(data);
        self.index = 0;
        match self.snapshot.as_ref() {
            Some(snapshot) if snapshot.has_register(data) => Ok(()),
            _ => Err(Rejection::UnsupportedRegister(data)),
        }
    }

    fn read_start(&mut self) -> Result<(), Rejection> {
        let Some(command) = self.command else {
            // Quick command or probe: nothing to read.
            self.index = self.buffer.len();
            return Ok(());
        };
        self.index = 0;
        match self.read_word(command) {
            Some(value) => {
                self.buffer = value.to_le_bytes(); // Low byte first.
                Ok(())
            }
            None => {
                self.index = self.buffer.len();
                Err(Rejection::UnsupportedRegister(command))
            }
        }
    }

    fn read(&mut self) -> Option<u8> {
        let data = self.buffer.get(self.index).copied()?;
        self.index += 1;
        Some(data)
    }
}

impl<R: Registers> RegisterAccess for SmbusClient<R> {
    type Store = R;

    fn registers(&self) -> &R {
        &self.registers
    }

    fn registers_mut(&mut self) -> &mut R {
        &mut self.registers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraction::Measurement;
    use crate::registers::{LedRegisters, Register};
    use crate::twi::tests::MockBus;
    use crate::twi::{Ack, TwiClient};

    fn client_with(led1: i16, led2: i16) -> TwiClient<SmbusClient<LedRegisters>> {
        let mut registers = LedRegisters::new();
        registers.set(Register::Led1, Measurement::new(led1).unwrap());
        registers.set(Register::Led2, Measurement::new(led2).unwrap());
        TwiClient::new(SmbusClient::new(registers))
    }

    /// Host side of "read word": write the command, read two bytes.
    fn read_word(
        bus: &mut MockBus,
        client: &mut TwiClient<SmbusClient<LedRegisters>>,
        command: u8,
    ) -> Option<i16> {
        bus.address(client, false);
        let ack = bus.write(client, command).ack;
        bus.address(client, true);
        let low = bus.read(client);
        let high = bus.read(client);
        bus.stop(client);
        match (ack, low, high) {
            (Ack::Ack, Some(low), Some(high)) => Some(i16::from_le_bytes([low, high])),
            _ => None,
        }
    }

    #[test]
    fn test_read_word() {
        let mut client = client_with(-100, 0x1234);
        let mut bus = MockBus::default();

        bus.address(&mut client, false);
        assert_eq!(bus.write(&mut client, 0x00).ack, Ack::Ack);
        bus.address(&mut client, true);
        assert_eq!(bus.read(&mut client), Some(0x9c));
        assert_eq!(bus.read(&mut client), Some(0xff));
        // Reading past the end of the word is not acknowledged.
        assert_eq!(bus.read(&mut client), None);
        bus.stop(&mut client);

        assert_eq!(read_word(&mut bus, &mut client, 1), Some(0x1234));
    }

    #[test]
    fn test_unknown_register() {
        let mut client = client_with(-100, 0);
        let mut bus = MockBus::default();

        bus.address(&mut client, false);
        assert_eq!(bus.write(&mut client, 0x02).ack, Ack::Nack);
        assert_eq!(bus.address(&mut client, true).ack, Ack::Nack);
        assert_eq!(bus.read(&mut client), None);
        assert_eq!(bus.read(&mut client), None);
        bus.stop(&mut client);

        assert!(bus.data_out.is_empty());
    }

    #[test]
    fn test_second_write_is_rejected() {
        let mut client = client_with(0, 0);
        let mut bus = MockBus::default();

        bus.address(&mut client, false);
        assert_eq!(bus.write(&mut client, 0x01).ack, Ack::Ack);
        assert_eq!(bus.write(&mut client, 0x42).ack, Ack::Nack);
        assert_eq!(client.io().command(), Some(0x01));
        bus.stop(&mut client);
    }

    #[test]
    fn test_quick_read_without_command() {
        let mut client = client_with(5, 6);
        let mut bus = MockBus::default();

        assert_eq!(bus.address(&mut client, true).ack, Ack::Ack);
        assert_eq!(bus.read(&mut client), None);
        bus.stop(&mut client);
    }

    #[test]
    fn test_command_is_transaction_scoped() {
        let mut client = client_with(7, 8);
        let mut bus = MockBus::default();

        bus.address(&mut client, false);
        bus.write(&mut client, 0x01);
        bus.stop(&mut client);

        // A fresh transaction starts without a command.
        bus.address(&mut client, true);
        assert_eq!(client.io().command(), None);
        assert_eq!(bus.read(&mut client), None);
        bus.stop(&mut client);
    }

    #[test]
    fn test_snapshot_prevents_torn_reads() {
        let mut client = client_with(0x00ff, 0);
        let mut bus = MockBus::default();

        bus.address(&mut client, false);
        bus.write(&mut client, 0x00);
        bus.address(&mut client, true);
        let low = bus.read(&mut client).unwrap();

        // The main loop publishes a new value between the two bytes.
        client
            .io_mut()
            .registers_mut()
            .set(Register::Led1, Measurement::new(0x0100).unwrap());

        let high = bus.read(&mut client).unwrap();
        bus.stop(&mut client);
        assert_eq!(i16::from_le_bytes([low, high]), 0x00ff);

        // The next transaction sees the new value.
        assert_eq!(read_word(&mut bus, &mut client, 0), Some(0x0100));
    }

    #[test]
    fn test_every_value_round_trips() {
        let mut client = client_with(0, 0);
        let mut bus = MockBus::default();

        for value in i16::MIN..=i16::MAX {
            client
                .io_mut()
                .registers_mut()
                .set(Register::Led2, Measurement::new(value).unwrap());
            assert_eq!(read_word(&mut bus, &mut client, 1), Some(value));
            bus.data_out.clear();
            bus.replies.clear();
        }
    }
}
