//! Configuration of the Timer/counter A0 as the LED PWM.
use avr_device::atmega4809::{PORTA, PORTMUX, TCA0};
use led_light_sensor::config::PwmTiming;
use led_light_sensor::fraction::DutyCycle;
use led_light_sensor::hal::LedBank;
use led_light_sensor::registers::Register;

/// `PORTA`: WO0 (LED 1) on PA0, WO1 (LED 2) on PA1.
const LED_PINS: u8 = 0b0000_0011;

/// Access to the 16bit timer/counter A0 peripheral, driving both LEDs.
pub struct Tca0Pwm {
    registers: TCA0,
    timing: PwmTiming,
}

impl Tca0Pwm {
    /// Set up the PWM with both LEDs off. This sets the PWM pins as outputs.
    pub fn new(
        registers: TCA0,
        porta: &mut PORTA,
        portmux: &mut PORTMUX,
        timing: PwmTiming,
    ) -> Self {
        use avr_device::atmega4809::tca0::single::ctrla::CLKSEL_A;
        let clock = match timing.clock_select {
            0 => CLKSEL_A::DIV1,
            1 => CLKSEL_A::DIV2,
            2 => CLKSEL_A::DIV4,
            3 => CLKSEL_A::DIV8,
            4 => CLKSEL_A::DIV16,
            5 => CLKSEL_A::DIV64,
            6 => CLKSEL_A::DIV256,
            _ => CLKSEL_A::DIV1024,
        };

        portmux.tcaroutea.write(|w| w.tca0().porta());
        // SAFETY: only the LED pins are affected
        porta.dirset.write(|w| unsafe { w.bits(LED_PINS) });

        let single = &registers.single;
        // SAFETY: any period and compare value is valid
        unsafe {
            single.per.write(|w| w.bits(timing.period));
            single.cmp0.write(|w| w.bits(0));
            single.cmp1.write(|w| w.bits(0));
        }
        single.ctrlb.write(|w| {
            w.wgmode()
                .singleslope()
                .cmp0en()
                .set_bit()
                .cmp1en()
                .set_bit()
        });
        single.ctrld.reset();
        single.evctrl.reset();
        single.intctrl.reset();
        // Enable last.
        single
            .ctrla
            .write(|w| w.clksel().variant(clock).enable().set_bit());
        Self { registers, timing }
    }
}

impl LedBank for Tca0Pwm {
    fn set_duty_cycle(&mut self, led: Register, duty_cycle: DutyCycle) {
        let compare = self.timing.compare(duty_cycle);
        let single = &self.registers.single;
        // SAFETY: any compare value is valid, above `PER` the output stays high
        unsafe {
            match led {
                Register::Led1 => single.cmp0.write(|w| w.bits(compare)),
                Register::Led2 => single.cmp1.write(|w| w.bits(compare)),
            }
        }
        single.ctrleset.write(|w| w.cmd().restart());
    }
}

impl Drop for Tca0Pwm {
    fn drop(&mut self) {
        self.registers.single.ctrla.write(|w| w.enable().clear_bit());
    }
}
