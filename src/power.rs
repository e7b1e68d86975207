//! Sleep control of the CPU core.
//!
//! The CPU only ever sleeps in idle mode: the TWI client, TCA0 and TCB0 all
//! need their clocks to run, and each of them can wake the core up.
use avr_device::atmega4809::SLPCTRL;
use led_light_sensor::sleep::Cpu;

/// The CPU core with its sleep controller.
pub struct Core(SLPCTRL);

impl Core {
    pub fn new(slpctrl: SLPCTRL) -> Self {
        slpctrl.ctrla.write(|w| w.smode().idle());
        Self(slpctrl)
    }
}

impl Cpu for Core {
    type State = u8;

    fn suspend_interrupts(&mut self) -> u8 {
        avr_device::interrupt::disable_save()
    }

    fn restore_interrupts(&mut self, sreg: u8) {
        // SAFETY: `sreg` was returned by `disable_save()` and the callers do
        // not run inside of an `interrupt::free` section
        unsafe { avr_device::interrupt::restore(sreg) };
    }

    fn enable_interrupts_and_sleep(&mut self) {
        self.0.ctrla.modify(|_, w| w.sen().set_bit());
        // SAFETY: the instruction after `sei` is executed before any pending
        // interrupt is served, so an interrupt latched while they were
        // disabled ends the `sleep` right away. The two instructions must not
        // be separated, hence the single `asm!` block.
        unsafe { core::arch::asm!("sei", "sleep") };
        self.0.ctrla.modify(|_, w| w.sen().clear_bit());
    }
}
