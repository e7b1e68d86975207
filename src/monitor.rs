//! The main loop: measure the LEDs one after another, publish the results and
//! serve the bus host in between.
//!
//! This is the only place that sleeps and the only place that drives the TWI
//! client and the calibration. Each wake-up handles at most one bus event and
//! one calibration step, in that order. The two never share state except
//! through the register store, which is only written between two calibration
//! passes and only read through per-transaction snapshots.

use crate::calibration::BinarySearch;
use crate::config::PRECISION_BITS;
use crate::fraction::{DutyCycle, Fraction};
use crate::hal::{DigitalInput, LedBank, SettleDelay};
use crate::registers::{LedRegisters, Register, RegisterAccess};
use crate::sleep::{Cpu, Sleep};
use crate::twi::{Io, TwiClient, TwiPeripheral};

/// A measured value as produced by one calibration pass.
pub type Sample = Fraction<PRECISION_BITS>;

pub struct Monitor<B, IO, L, D, I, C> {
    bus: B,
    twi: TwiClient<IO>,
    leds: L,
    delay: D,
    sensor: I,
    sleep: Sleep<C>,
}

impl<B, IO, L, D, I, C> Monitor<B, IO, L, D, I, C>
where
    B: TwiPeripheral,
    IO: Io + RegisterAccess<Store = LedRegisters>,
    L: LedBank,
    D: SettleDelay,
    I: DigitalInput,
    C: Cpu,
{
    pub fn new(bus: B, io: IO, leds: L, delay: D, sensor: I, cpu: C) -> Self {
        Self {
            bus,
            twi: TwiClient::new(io),
            leds,
            delay,
            sensor,
            sleep: Sleep::new(cpu),
        }
    }

    pub fn registers(&self) -> &LedRegisters {
        self.twi.io().registers()
    }

    pub fn registers_mut(&mut self) -> &mut LedRegisters {
        self.twi.io_mut().registers_mut()
    }

    /// Measure and publish both LEDs, alternating forever.
    pub fn run(&mut self) -> ! {
        let mut led = Register::Led1;
        loop {
            let sample = self.measure(led);
            self.publish(led, sample);
            led = led.next();
        }
    }

    /// Run one calibration pass for `led`, with all other LEDs dark.
    ///
    /// The bus is served while waiting for the sensor to settle.
    pub fn measure(&mut self, led: Register) -> Sample {
        for other in Register::ALL {
            if other != led {
                self.leds.set_duty_cycle(other, DutyCycle::ZERO);
            }
        }

        let Self {
            bus,
            twi,
            leds,
            delay,
            sensor,
            sleep,
        } = self;
        let mut search =
            BinarySearch::<_, _, _, PRECISION_BITS>::new(leds.output(led), delay, sensor);
        loop {
            sleep.start(|| bus.is_pending() || search.is_pending());

            if bus.is_pending() {
                twi.on_interrupt(bus);
            }
            if let Some(sample) = search.poll() {
                return sample;
            }
        }
    }

    /// Store a measurement in the register of `led`.
    pub fn publish(&mut self, led: Register, sample: Sample) {
        match sample.to_signed() {
            Some(value) => {
                crate::log_info!("{:?}: {}", led, value.bits());
                self.registers_mut().set(led, value);
            }
            // A search never yields 1.0, there is one candidate less.
            None => crate::log_error!("{:?}: measurement out of range", led),
        }
    }
}
