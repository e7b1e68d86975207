//! The TWI0 peripheral in client mode.
//!
//! The pins are left at their reset routing: SDA on PA2, SCL on PA3.
use avr_device::atmega4809::TWI0;
use led_light_sensor::config::{SdaHold, SdaSetup, TwiConfig};
use led_light_sensor::twi::{Ack, Command, Reply, Status, TwiPeripheral};

/// Access to the TWI0 client. Each event raises `TWI0_TWIS`, which only
/// wakes the CPU: the event is handled by the main loop.
pub struct Twi0Client(TWI0);

impl Twi0Client {
    pub fn new(registers: TWI0, config: TwiConfig) -> Self {
        registers.ctrla.write(|w| {
            let w = match config.sda_setup {
                SdaSetup::Cycles4 => w.sdasetup()._4cyc(),
                SdaSetup::Cycles8 => w.sdasetup()._8cyc(),
            };
            match config.sda_hold {
                SdaHold::Off => w.sdahold().off(),
                SdaHold::Ns50 => w.sdahold()._50ns(),
                SdaHold::Ns300 => w.sdahold()._300ns(),
                SdaHold::Ns500 => w.sdahold()._500ns(),
            }
        });
        // SAFETY: `TwiConfig` only holds valid 7-bit addresses
        registers.saddr.write(|w| unsafe { w.bits(config.saddr()) });
        registers.saddrmask.reset();
        // Enable last.
        registers.sctrla.write(|w| {
            w.dien()
                .set_bit()
                .apien()
                .set_bit()
                .pien()
                .set_bit()
                .enable()
                .set_bit()
        });
        Self(registers)
    }
}

impl TwiPeripheral for Twi0Client {
    fn status(&self) -> Status {
        Status::from_bits_retain(self.0.sstatus.read().bits())
    }

    fn read_data(&mut self) -> u8 {
        self.0.sdata.read().bits()
    }

    fn write_data(&mut self, data: u8) {
        // SAFETY: any byte can be transmitted
        self.0.sdata.write(|w| unsafe { w.bits(data) });
    }

    fn clear_bus_error(&mut self) {
        self.0.sstatus.write(|w| w.buserr().set_bit());
    }

    fn reply(&mut self, reply: Reply) {
        self.0.sctrlb.write(|w| {
            let w = match reply.ack {
                Ack::Ack => w.ackact().ack(),
                Ack::Nack => w.ackact().nack(),
            };
            match reply.command {
                Command::NoAction => w.scmd().noact(),
                Command::CompleteTransaction => w.scmd().comptrans(),
                Command::Respond => w.scmd().response(),
            }
        });
    }
}

impl Drop for Twi0Client {
    fn drop(&mut self) {
        self.0.sctrla.reset();
    }
}

#[allow(clippy::missing_const_for_fn)]
#[avr_device::interrupt(atmega4809)]
fn TWI0_TWIS() {
    // deliberately empty, just used for waking up the device.
}
