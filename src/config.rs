//! Compile-time configuration of the device.
//!
//! Everything is computed by `const fn`s, so the floating point arithmetic
//! never reaches the target and invalid settings fail the build.

use crate::fraction::{DutyCycle, DUTY_CYCLE_BITS};

/// The CPU clock: the 20MHz oscillator with the default prescaler of 6.
pub const CPU_FREQUENCY_HZ: f32 = 20_000_000.0 / 6.0;

/// The TWI client settings.
pub const TWI: TwiConfig = TwiConfig::new(18);

/// Frequency of the LED PWM.
pub const PWM_FREQUENCY_HZ: f32 = 1_000.0;

/// Timing of the PWM timer for [`PWM_FREQUENCY_HZ`].
pub const PWM: PwmTiming = PwmTiming::for_frequency(CPU_FREQUENCY_HZ, PWM_FREQUENCY_HZ);

/// Bits of precision of a measurement, i.e. number of samples per pass.
pub const PRECISION_BITS: u8 = 8;

/// Number of PWM periods to wait after a duty cycle change before sampling.
///
/// This covers the filter in front of the comparator and the response time of
/// the photodiode.
pub const SETTLE_PERIODS: u16 = 16;

/// Compare value for the settle delay timer.
pub const SETTLE_COMPARE: u16 = PWM.delay_compare(SETTLE_PERIODS);

/// SDA setup time selection of the TWI client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdaSetup {
    Cycles4,
    Cycles8,
}

/// SDA hold time selection of the TWI client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdaHold {
    Off,
    Ns50,
    Ns300,
    Ns500,
}

/// Settings of the TWI client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwiConfig {
    pub address: u8,
    pub sda_setup: SdaSetup,
    pub sda_hold: SdaHold,
}

impl TwiConfig {
    /// Settings for the given 7-bit address, other values at their defaults.
    pub const fn new(address: u8) -> Self {
        assert!(
            address >= 0x08 && address < 0x78,
            "reserved or out-of-range 7-bit I2C address"
        );
        Self {
            address,
            sda_setup: SdaSetup::Cycles4,
            sda_hold: SdaHold::Ns500,
        }
    }

    /// The value of the `SADDR` register, general call recognition disabled.
    pub const fn saddr(self) -> u8 {
        self.address << 1
    }
}

/// Clock selection and period of a 16-bit PWM timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmTiming {
    /// The clock prescaler selection 0-7.
    pub clock_select: u8,
    /// The TOP counter value.
    pub period: u16,
}

impl PwmTiming {
    const PRESCALERS: [u16; 8] = [1, 2, 4, 8, 16, 64, 256, 1024];

    /// Find the prescaler with maximum precision, whose period still fits the
    /// 16-bit counter.
    pub const fn for_frequency(cpu_hz: f32, pwm_hz: f32) -> Self {
        let mut clock_select = 0;
        while clock_select < Self::PRESCALERS.len() {
            let clock = cpu_hz / Self::PRESCALERS[clock_select] as f32;
            if clock / 65536.0 < pwm_hz {
                break;
            }
            clock_select += 1;
        }
        assert!(
            clock_select < Self::PRESCALERS.len(),
            "PWM frequency too low for a 16-bit timer"
        );

        let clock = cpu_hz / Self::PRESCALERS[clock_select] as f32;
        let period = clock / pwm_hz - 1.0;
        assert!(period >= 1.0, "PWM frequency too high");
        Self {
            clock_select: clock_select as u8,
            period: period as u16,
        }
    }

    /// The compare value producing `duty_cycle`.
    ///
    /// A duty cycle of `1.0` yields `period + 1`, i.e. a constantly high output.
    pub const fn compare(self, duty_cycle: DutyCycle) -> u16 {
        let ticks = (self.period as u32 + 1) * duty_cycle.bits() as u32;
        (ticks >> DUTY_CYCLE_BITS) as u16
    }

    /// The compare value for a delay of `periods` PWM periods on a 16-bit
    /// timer running from the same prescaled clock.
    pub const fn delay_compare(self, periods: u16) -> u16 {
        let ticks = periods as u32 * (self.period as u32 + 1);
        assert!(ticks >= 1 && ticks <= 65536, "delay does not fit a 16-bit timer");
        (ticks - 1) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pwm_timing() {
        let timing = PwmTiming::for_frequency(CPU_FREQUENCY_HZ, 1_000.0);
        assert_eq!(timing, PwmTiming { clock_select: 0, period: 3332 });

        let slow = PwmTiming::for_frequency(CPU_FREQUENCY_HZ, 10.0);
        assert_eq!(slow, PwmTiming { clock_select: 3, period: 41665 });
    }

    #[test]
    fn test_compare() {
        assert_eq!(PWM.compare(DutyCycle::ZERO), 0);
        assert_eq!(PWM.compare(DutyCycle::from_f32(0.5)), 1666);
        assert_eq!(PWM.compare(DutyCycle::ONE), PWM.period + 1);
    }

    #[test]
    fn test_settle_delay() {
        assert_eq!(SETTLE_COMPARE, 16 * 3333 - 1);
        assert_eq!(PWM.delay_compare(1), PWM.period);
    }

    #[test]
    fn test_twi_registers() {
        assert_eq!(TWI.address, 18);
        assert_eq!(TWI.saddr(), 36);
        assert_eq!(TWI.sda_hold, SdaHold::Ns500);
    }
}
