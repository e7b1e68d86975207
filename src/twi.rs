//! TWI (I2C/SMBus) client-side transaction engine.
//!
//! The engine reacts to the status of the TWI client peripheral, one event at a
//! time, and decides how the hardware has to respond. It never looks at pin
//! levels and never waits: every event is answered synchronously. What the
//! bytes on the bus mean is left to an [`Io`] implementation (see
//! [`crate::smbus`] and [`crate::register_file`]).
//!
//! A transaction is everything from the first address match to the STOP
//! condition (or to a bus fault). Repeated STARTs within it do not start a new
//! one, which is what a "write command, then read" SMBus transfer relies on.
//!
//! See also the AVR application note "AVR TWI client" and
//! <https://www.nongnu.org/avr-libc/examples/twitest/twitest.c>.

use bitflags::bitflags;
use core::mem;

use crate::error::{BusFault, Rejection};

bitflags! {
    /// Status of the TWI client, laid out like the `SSTATUS` register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        /// A data byte was received or is requested.
        const DATA = 0x80;
        /// An address match or a STOP condition was detected.
        const ADDRESS_OR_STOP = 0x40;
        /// The clock is held low until the event is handled.
        const CLOCK_HOLD = 0x20;
        /// The host did not acknowledge the last transmitted byte.
        const RX_NACK = 0x10;
        /// Arbitration was lost while transmitting.
        const COLLISION = 0x08;
        /// An illegal bus condition was detected.
        const BUS_ERROR = 0x04;
        /// The host reads from this device (otherwise it writes).
        const HOST_READ = 0x02;
        /// The [`Status::ADDRESS_OR_STOP`] event was an address match.
        const ADDRESS = 0x01;
    }
}

impl Status {
    /// The flags that require an answer from [`TwiClient::on_interrupt`].
    ///
    /// [`Status::COLLISION`] is not one of them: it stays set until the next
    /// START and is only acted upon together with a data or address event.
    pub const EVENTS: Status = Status::DATA
        .union(Status::ADDRESS_OR_STOP)
        .union(Status::BUS_ERROR);

    pub fn is_host_read(self) -> bool {
        self.contains(Status::HOST_READ)
    }
}

/// Acknowledge action for the current byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ack {
    Ack,
    Nack,
}

impl From<bool> for Ack {
    fn from(ack: bool) -> Self {
        if ack {
            Ack::Ack
        } else {
            Ack::Nack
        }
    }
}

/// What the client hardware should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Leave the bus alone.
    NoAction,
    /// Release the bus and wait for the next START.
    CompleteTransaction,
    /// Continue the transfer (send the acknowledge or the next byte).
    Respond,
}

/// The answer to one bus event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    pub ack: Ack,
    pub command: Command,
}

impl Reply {
    pub const NO_ACTION: Reply = Reply::new(Ack::Ack, Command::NoAction);

    pub const fn new(ack: Ack, command: Command) -> Self {
        Self { ack, command }
    }

    /// Continue the transfer, acknowledging iff the decode layer accepted.
    fn respond(accepted: Result<(), Rejection>) -> Self {
        if let Err(reason) = accepted {
            crate::log_debug!("twi: nack ({})", reason);
        }
        Self::new(Ack::from(accepted.is_ok()), Command::Respond)
    }
}

/// Access to the TWI client peripheral.
pub trait TwiPeripheral {
    /// The current (sticky) status flags.
    fn status(&self) -> Status;
    /// The byte received from the host.
    fn read_data(&mut self) -> u8;
    /// The byte to transmit to the host.
    fn write_data(&mut self, data: u8);
    /// Clear [`Status::BUS_ERROR`], which is not cleared by a command.
    fn clear_bus_error(&mut self);
    /// Issue the reply. This clears the data and address/stop flags.
    fn reply(&mut self, reply: Reply);

    /// Whether an event is waiting for [`TwiClient::on_interrupt`].
    fn is_pending(&self) -> bool {
        self.status().intersects(Status::EVENTS)
    }
}

/// The meaning of the bytes on the bus.
///
/// Each transaction is demarcated by `transaction_start` and exactly one of
/// `transaction_stop` or `transaction_abort`. Everything else is only called
/// within a transaction. Accepting a byte (or a transfer) means acknowledging
/// it on the bus.
pub trait Io {
    fn transaction_start(&mut self);
    fn transaction_abort(&mut self);
    fn transaction_stop(&mut self);
    /// The host starts writing to this device.
    fn write_start(&mut self) -> Result<(), Rejection>;
    /// The host wrote a byte.
    fn write(&mut self, data: u8) -> Result<(), Rejection>;
    /// The host starts reading from this device.
    fn read_start(&mut self) -> Result<(), Rejection>;
    /// The next byte to send to the host, `None` if there is no more data.
    fn read(&mut self) -> Option<u8>;
}

/// The client-side transaction state machine.
pub struct TwiClient<IO> {
    io: IO,
    in_transaction: bool,
}

impl<IO: Io> TwiClient<IO> {
    pub const fn new(io: IO) -> Self {
        Self {
            io,
            in_transaction: false,
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// Handle the pending bus event (if any) and reply to the hardware.
    ///
    /// This is called from the main loop after waking up, never from the
    /// interrupt handler itself.
    pub fn on_interrupt<P: TwiPeripheral>(&mut self, bus: &mut P) {
        let reply = self.handle(bus);
        bus.reply(reply);
    }

    fn handle<P: TwiPeripheral>(&mut self, bus: &mut P) -> Reply {
        let status = bus.status();
        // The order of the checks matters: more than one flag may be set.
        if status.contains(Status::BUS_ERROR) {
            self.abort(BusFault::BusError);
            bus.clear_bus_error();
            Reply::NO_ACTION
        } else if status.contains(Status::COLLISION) {
            // The flag is cleared by the hardware on the next START.
            self.abort(BusFault::ArbitrationLost);
            Reply::NO_ACTION
        } else if status.contains(Status::ADDRESS_OR_STOP) {
            if status.contains(Status::ADDRESS) {
                if !mem::replace(&mut self.in_transaction, true) {
                    self.io.transaction_start();
                }
                if status.is_host_read() {
                    Reply::respond(self.io.read_start())
                } else {
                    Reply::respond(self.io.write_start())
                }
            } else {
                if mem::replace(&mut self.in_transaction, false) {
                    self.io.transaction_stop();
                }
                Reply::new(Ack::Ack, Command::CompleteTransaction)
            }
        } else if status.contains(Status::DATA) {
            if !self.in_transaction {
                crate::log_warn!("twi: data outside of a transaction");
                Reply::new(Ack::Nack, Command::CompleteTransaction)
            } else if status.is_host_read() {
                match self.io.read() {
                    Some(data) => {
                        bus.write_data(data);
                        Reply::new(Ack::Ack, Command::Respond)
                    }
                    None => Reply::respond(Err(Rejection::EndOfData)),
                }
            } else {
                let data = bus.read_data();
                Reply::respond(self.io.write(data))
            }
        } else {
            Reply::NO_ACTION
        }
    }

    fn abort(&mut self, fault: BusFault) {
        if mem::replace(&mut self.in_transaction, false) {
            crate::log_warn!("twi: transaction aborted ({})", fault);
            self.io.transaction_abort();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A TWI peripheral fed with one status at a time.
    #[derive(Debug, Default)]
    pub(crate) struct MockBus {
        pub status: Option<Status>,
        pub data_in: u8,
        pub data_out: Vec<u8>,
        pub replies: Vec<Reply>,
        pub bus_errors_cleared: usize,
    }

    impl MockBus {
        /// Deliver one event, returning the reply to it.
        pub fn event<IO: Io>(&mut self, client: &mut TwiClient<IO>, status: Status) -> Reply {
            self.status = Some(status);
            client.on_interrupt(self);
            *self.replies.last().unwrap()
        }

        pub fn address(&mut self, client: &mut TwiClient<impl Io>, host_read: bool) -> Reply {
            let mut status = Status::ADDRESS_OR_STOP | Status::ADDRESS;
            status.set(Status::HOST_READ, host_read);
            self.event(client, status)
        }

        pub fn stop(&mut self, client: &mut TwiClient<impl Io>) -> Reply {
            self.event(client, Status::ADDRESS_OR_STOP)
        }

        pub fn write(&mut self, client: &mut TwiClient<impl Io>, data: u8) -> Reply {
            self.data_in = data;
            self.event(client, Status::DATA)
        }

        /// Request a byte, returning it if it was acknowledged by the client.
        pub fn read(&mut self, client: &mut TwiClient<impl Io>) -> Option<u8> {
            let sent = self.data_out.len();
            let reply = self.event(client, Status::DATA | Status::HOST_READ);
            match reply.ack {
                Ack::Ack => {
                    assert_eq!(self.data_out.len(), sent + 1);
                    self.data_out.last().copied()
                }
                Ack::Nack => None,
            }
        }
    }

    impl TwiPeripheral for MockBus {
        fn status(&self) -> Status {
            self.status.unwrap_or(Status::empty())
        }

        fn read_data(&mut self) -> u8 {
            self.data_in
        }

        fn write_data(&mut self, data: u8) {
            self.data_out.push(data);
        }

        fn clear_bus_error(&mut self) {
            self.bus_errors_cleared += 1;
            if let Some(status) = &mut self.status {
                status.remove(Status::BUS_ERROR);
            }
        }

        fn reply(&mut self, reply: Reply) {
            self.replies.push(reply);
            self.status = None;
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Start,
        Abort,
        Stop,
        WriteStart,
        Write(u8),
        ReadStart,
        Read,
    }

    /// An `Io` recording every call and checking the bracketing rules.
    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<Call>,
        open: bool,
        accept: bool,
        bytes: Option<u8>,
    }

    impl Recorder {
        fn accepting() -> Self {
            Self {
                accept: true,
                bytes: Some(0x5a),
                ..Default::default()
            }
        }

        fn count(&self, call: Call) -> usize {
            self.calls.iter().filter(|c| **c == call).count()
        }

        fn record(&mut self, call: Call) -> Result<(), Rejection> {
            assert!(self.open, "{:?} outside of a transaction", call);
            self.calls.push(call);
            if self.accept {
                Ok(())
            } else {
                Err(Rejection::UnsupportedWrite)
            }
        }
    }

    impl Io for Recorder {
        fn transaction_start(&mut self) {
            assert!(!self.open, "nested transaction");
            self.open = true;
            self.calls.push(Call::Start);
        }

        fn transaction_abort(&mut self) {
            assert!(self.open);
            self.open = false;
            self.calls.push(Call::Abort);
        }

        fn transaction_stop(&mut self) {
            assert!(self.open);
            self.open = false;
            self.calls.push(Call::Stop);
        }

        fn write_start(&mut self) -> Result<(), Rejection> {
            self.record(Call::WriteStart)
        }

        fn write(&mut self, data: u8) -> Result<(), Rejection> {
            self.record(Call::Write(data))
        }

        fn read_start(&mut self) -> Result<(), Rejection> {
            self.record(Call::ReadStart)
        }

        fn read(&mut self) -> Option<u8> {
            self.record(Call::Read).ok()?;
            self.bytes
        }
    }

    #[test]
    fn test_write_then_read_transaction() {
        let mut client = TwiClient::new(Recorder::accepting());
        let mut bus = MockBus::default();

        let reply = bus.address(&mut client, false);
        assert_eq!(reply, Reply::new(Ack::Ack, Command::Respond));
        assert!(client.in_transaction());
        assert_eq!(bus.write(&mut client, 0x01).ack, Ack::Ack);
        // Repeated START: still the same transaction.
        assert_eq!(bus.address(&mut client, true).ack, Ack::Ack);
        assert_eq!(bus.read(&mut client), Some(0x5a));
        let reply = bus.stop(&mut client);
        assert_eq!(reply, Reply::new(Ack::Ack, Command::CompleteTransaction));
        assert!(!client.in_transaction());

        assert_eq!(
            client.io().calls,
            [
                Call::Start,
                Call::WriteStart,
                Call::Write(0x01),
                Call::ReadStart,
                Call::Read,
                Call::Stop
            ]
        );
    }

    #[test]
    fn test_rejections_are_nacked() {
        let mut client = TwiClient::new(Recorder::default());
        let mut bus = MockBus::default();

        assert_eq!(
            bus.address(&mut client, false),
            Reply::new(Ack::Nack, Command::Respond)
        );
        assert_eq!(
            bus.write(&mut client, 0x02),
            Reply::new(Ack::Nack, Command::Respond)
        );
        // No data left: not-acknowledge, but keep responding.
        assert_eq!(bus.read(&mut client), None);
        assert_eq!(bus.replies.last().unwrap().command, Command::Respond);
        assert!(bus.data_out.is_empty());
    }

    #[test]
    fn test_bus_error_aborts() {
        let mut client = TwiClient::new(Recorder::accepting());
        let mut bus = MockBus::default();

        bus.address(&mut client, false);
        // A bus error takes precedence over everything else reported with it.
        let reply = bus.event(&mut client, Status::BUS_ERROR | Status::COLLISION | Status::DATA);
        assert_eq!(reply, Reply::NO_ACTION);
        assert_eq!(bus.bus_errors_cleared, 1);
        assert!(!client.in_transaction());

        // Outside of a transaction nothing is aborted, but the flag is cleared.
        bus.event(&mut client, Status::BUS_ERROR);
        assert_eq!(bus.bus_errors_cleared, 2);
        assert_eq!(client.io().count(Call::Abort), 1);
    }

    #[test]
    fn test_collision_aborts() {
        let mut client = TwiClient::new(Recorder::accepting());
        let mut bus = MockBus::default();

        bus.address(&mut client, true);
        let reply = bus.event(&mut client, Status::COLLISION | Status::ADDRESS_OR_STOP);
        assert_eq!(reply, Reply::NO_ACTION);
        assert_eq!(bus.bus_errors_cleared, 0);
        assert!(!client.in_transaction());
        assert_eq!(client.io().calls, [Call::Start, Call::ReadStart, Call::Abort]);

        // A STOP after the abort does not close anything.
        bus.stop(&mut client);
        assert_eq!(client.io().count(Call::Stop), 0);
    }

    #[test]
    fn test_handled_collision_is_not_pending() {
        let mut client = TwiClient::new(Recorder::accepting());
        let mut bus = MockBus::default();

        bus.address(&mut client, false);
        bus.event(&mut client, Status::COLLISION | Status::DATA);
        assert!(!client.in_transaction());

        // The hardware keeps the flag until the next START.
        bus.status = Some(Status::COLLISION);
        assert!(!bus.is_pending());
        bus.status = Some(Status::COLLISION | Status::ADDRESS_OR_STOP);
        assert!(bus.is_pending());
    }

    #[test]
    fn test_data_outside_of_transaction() {
        let mut client = TwiClient::new(Recorder::accepting());
        let mut bus = MockBus::default();

        let reply = bus.write(&mut client, 0x00);
        assert_eq!(reply, Reply::new(Ack::Nack, Command::CompleteTransaction));
        assert!(client.io().calls.is_empty());
    }

    #[test]
    fn test_no_event() {
        let mut client = TwiClient::new(Recorder::accepting());
        let mut bus = MockBus::default();

        assert!(!bus.is_pending());
        assert_eq!(bus.event(&mut client, Status::CLOCK_HOLD), Reply::NO_ACTION);
        assert!(client.io().calls.is_empty());
    }

    #[test]
    fn test_transaction_bracketing_for_arbitrary_events() {
        const EVENTS: [Status; 8] = [
            Status::BUS_ERROR,
            Status::COLLISION,
            Status::ADDRESS_OR_STOP,
            Status::ADDRESS_OR_STOP.union(Status::ADDRESS),
            Status::ADDRESS_OR_STOP
                .union(Status::ADDRESS)
                .union(Status::HOST_READ),
            Status::DATA,
            Status::DATA.union(Status::HOST_READ),
            Status::empty(),
        ];

        let mut seed: u32 = 0x1234_5678;
        for _ in 0..200 {
            let mut client = TwiClient::new(Recorder::accepting());
            let mut bus = MockBus::default();
            for _ in 0..64 {
                // xorshift32
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                let mut status = EVENTS[(seed % 8) as usize];
                // Occasionally report several conditions at once.
                if seed & 0x100 != 0 {
                    status |= EVENTS[((seed >> 9) % 8) as usize];
                }
                bus.event(&mut client, status);
            }
            // Close whatever is still open.
            bus.stop(&mut client);

            let io = client.io();
            assert_eq!(
                io.count(Call::Start),
                io.count(Call::Stop) + io.count(Call::Abort)
            );
            assert!(!io.open);
        }
    }
}
