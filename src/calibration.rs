//! Measuring a brightness threshold by successive approximation.
//!
//! The light sensor only tells whether the light is above its threshold. The
//! duty cycle at which its output flips is found by a binary search over the
//! duty cycle: set a candidate, wait until the LED and the sensor have
//! settled, take a single sample and halve the interval. This is driven
//! entirely by [`BinarySearch::poll`] calls after each wake-up, the CPU sleeps
//! while the settle delay runs.
//!
//! The candidates span `[0, 0.5)` of the PWM rather than `[0, 1)`: at 50% the
//! fundamental of the PWM signal is the strongest, a higher duty cycle only
//! makes the LED look more like a DC light source.

use crate::fraction::{Fraction, DUTY_CYCLE_BITS};
use crate::hal::{DigitalInput, PwmOutput, SettleDelay};

/// The interval `[lower, upper]` known to contain the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Interval {
    lower: u16,
    upper: u16,
}

impl Interval {
    /// The interval of all values with `bits` bits of precision.
    pub const fn full(bits: u8) -> Self {
        Self {
            lower: 0,
            upper: (1 << bits) - 1,
        }
    }

    pub const fn lower(self) -> u16 {
        self.lower
    }

    pub const fn upper(self) -> u16 {
        self.upper
    }

    /// The candidate to sample next.
    ///
    /// Rounded down, so that it is always below `upper` until the interval
    /// has converged and both halves shrink the interval.
    pub const fn middle(self) -> u16 {
        (self.lower + self.upper) / 2
    }

    /// The result, once the interval has shrunk to a single value.
    pub const fn result(self) -> Option<u16> {
        if self.lower == self.upper {
            Some(self.lower)
        } else {
            None
        }
    }

    /// Narrow down the interval after sampling [`Interval::middle()`].
    ///
    /// A high sample means that the crossing point is at or below the
    /// candidate, a low sample that it lies above.
    fn narrow(&mut self, high: bool) {
        let middle = self.middle();
        if high {
            self.upper = middle;
        } else {
            self.lower = middle + 1;
        }
    }
}

/// A running binary search for the smallest duty cycle at which the input
/// reads high, with `BITS` bits of precision.
///
/// If the input never reads high, the search saturates at the largest
/// candidate. If it always reads high, the result is zero.
pub struct BinarySearch<P, D, I, const BITS: u8> {
    pwm: P,
    delay: D,
    input: I,
    interval: Interval,
}

impl<P, D, I, const BITS: u8> BinarySearch<P, D, I, BITS>
where
    P: PwmOutput,
    D: SettleDelay,
    I: DigitalInput,
{
    /// Start a new search: applies the first candidate and starts the delay.
    pub fn new(pwm: P, delay: D, input: I) -> Self {
        const {
            assert!(BITS > 0, "a search needs at least one bit");
            assert!(BITS < DUTY_CYCLE_BITS, "the PWM can not represent the candidates");
        }
        let mut search = Self {
            pwm,
            delay,
            input,
            interval: Interval::full(BITS),
        };
        search.apply();
        search
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Whether a call to [`BinarySearch::poll`] can make progress.
    ///
    /// This must not consume the delay flag, it is evaluated right before
    /// going to sleep.
    pub fn is_pending(&self) -> bool {
        self.interval.result().is_some() || !self.delay.is_running()
    }

    /// Advance the search, if the settle delay has elapsed.
    ///
    /// A delay that has stopped counting counts as elapsed, even if its flag
    /// was lost. Otherwise [`BinarySearch::is_pending`] would stay true while
    /// nothing restarts the delay.
    ///
    /// Returns the result once the search has converged. Polling a converged
    /// search is fine and returns the same result again.
    pub fn poll(&mut self) -> Option<Fraction<BITS>> {
        if let Some(result) = self.interval.result() {
            return Fraction::new(result);
        }
        if !self.delay.has_triggered() && self.delay.is_running() {
            return None;
        }

        let high = self.input.is_high();
        self.interval.narrow(high);
        crate::log_trace!(
            "calibration: sample {} -> [{}, {}]",
            high,
            self.interval.lower,
            self.interval.upper
        );

        match self.interval.result() {
            Some(result) => Fraction::new(result),
            None => {
                self.apply();
                None
            }
        }
    }

    /// Stop the search and hand back the peripherals.
    pub fn release(self) -> (P, D, I) {
        (self.pwm, self.delay, self.input)
    }

    fn apply(&mut self) {
        // `middle()` is always below 2^BITS.
        let candidate = Fraction::<BITS>::new(self.interval.middle()).unwrap_or(Fraction::ZERO);
        self.pwm.set_duty_cycle(candidate.halve_into());
        self.delay.start();
    }
}
