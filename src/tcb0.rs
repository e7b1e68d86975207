//! The settle delay: Timer/counter B0 in single-shot mode.
//!
//! TCB0 runs from the prescaled clock of TCA0, so the compare value of
//! [`config::SETTLE_COMPARE`](led_light_sensor::config::SETTLE_COMPARE) is an
//! exact multiple of the PWM period. A shot is started by a software event on
//! an otherwise unused event channel.
use avr_device::atmega4809::{EVSYS, TCB0};
use led_light_sensor::hal::SettleDelay;

/// The event channel used to start the delay.
const CHANNEL: u8 = 5;

/// Access to the 16bit timer/counter B0, started by an event channel.
pub struct Tcb0Delay {
    registers: TCB0,
    evsys: EVSYS,
}

impl Tcb0Delay {
    /// Set up the delay and start it right away.
    pub fn new(registers: TCB0, evsys: EVSYS, compare: u16) -> Self {
        // SAFETY: user values start at 1 for channel 0
        evsys.usertcb0.write(|w| unsafe { w.bits(CHANNEL + 1) });
        registers.evctrl.write(|w| w.captei().set_bit());
        registers.ctrlb.write(|w| w.cntmode().single());
        // SAFETY: any compare value is valid
        registers.ccmp.write(|w| unsafe { w.bits(compare) });

        let mut delay = Self { registers, evsys };
        delay.has_triggered(); // Clear any pending interrupts.
        delay.registers.intctrl.write(|w| w.capt().set_bit());
        // Enable last.
        delay
            .registers
            .ctrla
            .write(|w| w.clksel().clktca().enable().set_bit());
        delay.start();
        delay
    }
}

impl SettleDelay for Tcb0Delay {
    fn start(&mut self) {
        // SAFETY: any counter value is valid; strobing the channel only
        // affects its single user
        unsafe {
            self.registers.cnt.write(|w| w.bits(0));
            self.evsys.strobe.write(|w| w.bits(1 << CHANNEL));
        }
    }

    fn has_triggered(&mut self) -> bool {
        let triggered = self.registers.intflags.read().capt().bit_is_set();
        if triggered {
            self.registers.intflags.write(|w| w.capt().set_bit());
        }
        triggered
    }

    fn is_running(&self) -> bool {
        self.registers.status.read().run().bit_is_set()
    }
}

impl Drop for Tcb0Delay {
    fn drop(&mut self) {
        self.registers.intctrl.reset();
        self.registers.ctrla.write(|w| w.enable().clear_bit());
    }
}

#[allow(clippy::missing_const_for_fn)]
#[avr_device::interrupt(atmega4809)]
fn TCB0_INT() {
    // deliberately empty, just used for waking up the device.
}
