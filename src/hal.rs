//! Interfaces to the peripherals used by the calibration.
//!
//! These are implemented by thin drivers in the firmware binary (TCA0 for the
//! PWM, TCB0 for the settle delay, a port pin for the sensor) and by mocks in
//! the tests. Each driver is owned by exactly one user at a time, borrowing is
//! done through the blanket implementations for `&mut T`.

use crate::fraction::DutyCycle;
use crate::registers::Register;

/// A single PWM output.
pub trait PwmOutput {
    /// Change the duty cycle, taking effect within one PWM period.
    fn set_duty_cycle(&mut self, duty_cycle: DutyCycle);
}

/// The PWM outputs of all LEDs, one per [`Register`].
pub trait LedBank {
    fn set_duty_cycle(&mut self, led: Register, duty_cycle: DutyCycle);

    /// Borrow the output of a single LED.
    fn output(&mut self, led: Register) -> LedOutput<'_, Self>
    where
        Self: Sized,
    {
        LedOutput { bank: self, led }
    }
}

/// The PWM output of one LED of a [`LedBank`].
pub struct LedOutput<'a, B> {
    bank: &'a mut B,
    led: Register,
}

impl<B: LedBank> PwmOutput for LedOutput<'_, B> {
    fn set_duty_cycle(&mut self, duty_cycle: DutyCycle) {
        self.bank.set_duty_cycle(self.led, duty_cycle);
    }
}

/// A delay of a fixed number of PWM periods, signalled by a sticky flag.
pub trait SettleDelay {
    /// (Re)start the delay.
    fn start(&mut self);
    /// Whether the delay has elapsed. Clears the flag.
    fn has_triggered(&mut self) -> bool;
    /// Whether the delay is still counting.
    fn is_running(&self) -> bool;
}

/// A digital input, here the output of the light sensor's comparator.
pub trait DigitalInput {
    fn is_high(&mut self) -> bool;
}

impl<T: PwmOutput + ?Sized> PwmOutput for &mut T {
    fn set_duty_cycle(&mut self, duty_cycle: DutyCycle) {
        (**self).set_duty_cycle(duty_cycle);
    }
}

impl<T: SettleDelay + ?Sized> SettleDelay for &mut T {
    fn start(&mut self) {
        (**self).start();
    }

    fn has_triggered(&mut self) -> bool {
        (**self).has_triggered()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }
}

impl<T: DigitalInput + ?Sized> DigitalInput for &mut T {
    fn is_high(&mut self) -> bool {
        (**self).is_high()
    }
}
