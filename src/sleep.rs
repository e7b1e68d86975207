//! Sleeping until there is something to do.
//!
//! All events (TWI client, settle delay) are signalled by sticky flags in the
//! peripherals. Their interrupts only wake the CPU, the handlers are empty and
//! the flags are drained later by explicit polls from the main loop.
//!
//! Checking the flags and going to sleep must happen atomically: an event in
//! between would be lost and the CPU would sleep until the next, unrelated,
//! interrupt (possibly forever). Therefore interrupts are suspended across the
//! check. The CPU must guarantee, that enabling interrupts and entering sleep
//! can not be interleaved with an interrupt, so that an interrupt latched in
//! the meantime ends the sleep right away. On AVR, the instruction following a
//! `sei` is always executed before any pending interrupt is served.

/// The interrupt and sleep control of the CPU core.
pub trait Cpu {
    /// The interrupt-enable state saved by [`Cpu::suspend_interrupts`].
    type State: Copy;

    /// Disable interrupts, returning the previous state.
    fn suspend_interrupts(&mut self) -> Self::State;
    /// Restore the state returned by [`Cpu::suspend_interrupts`].
    fn restore_interrupts(&mut self, state: Self::State);
    /// Enable interrupts and sleep until the next one, atomically.
    fn enable_interrupts_and_sleep(&mut self);
}

/// Why [`Sleep::start`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wake {
    /// There was pending work, the CPU did not sleep.
    Pending,
    /// The CPU slept and was woken up by an interrupt.
    Interrupted,
}

/// The only place that puts the CPU to sleep.
pub struct Sleep<C> {
    cpu: C,
}

impl<C: Cpu> Sleep<C> {
    pub const fn new(cpu: C) -> Self {
        Self { cpu }
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    /// Sleep, unless `pending()` reports work to be done.
    ///
    /// `pending()` is evaluated with interrupts suspended and must only peek
    /// at the event flags, not clear them. The interrupt-enable state is
    /// restored on every way out of this function.
    pub fn start<F: FnOnce() -> bool>(&mut self, pending: F) -> Wake {
        let mut guard = Suspended::new(&mut self.cpu);
        if pending() {
            return Wake::Pending;
        }
        guard.cpu.enable_interrupts_and_sleep();
        Wake::Interrupted
    }
}

/// Interrupts are suspended as long as this lives.
struct Suspended<'a, C: Cpu> {
    cpu: &'a mut C,
    state: C::State,
}

impl<'a, C: Cpu> Suspended<'a, C> {
    fn new(cpu: &'a mut C) -> Self {
        let state = cpu.suspend_interrupts();
        Self { cpu, state }
    }
}

impl<C: Cpu> Drop for Suspended<'_, C> {
    fn drop(&mut self) {
        self.cpu.restore_interrupts(self.state);
    }
}
