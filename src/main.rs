//! Dual-LED light meter with an I2C interface
//!
//! This firmware drives two LEDs with a PWM and measures, for each LED in
//! turn, the smallest brightness at which a light sensor detects it. The
//! sensor is a simple comparator with a digital output, so the brightness is
//! found by a binary search over the duty cycle of the LED: after each step
//! the firmware waits a few PWM periods for the light level to settle before
//! sampling the comparator. The results are published as SMBus word registers
//! (`0x00` for LED 1, `0x01` for LED 2) at the I2C address `0x12`.
//!
//! # MCU used
//! The firmware runs on an ATmega4809, clocked from the internal 20MHz
//! oscillator with the default prescaler of 6. All work happens in the main
//! loop. Interrupts are only used to wake up the CPU from idle sleep.
//! ```ascii-drawing
//!                  ┌─────────────┐
//!  LED 1 (WO0) ━━━━┥ PA0         │
//!  LED 2 (WO1) ━━━━┥ PA1         │
//!          SDA ━━━━┥ PA2         │
//!          SCL ━━━━┥ PA3     PD2 ┝━━━━ sensor (comparator output)
//!                  └─────────────┘
//! ```
//!
//! # Peripherals
//! - TCA0 generates the PWM of both LEDs at 1kHz.
//! - TCB0 runs from the clock of TCA0 and times the settle delay of 16 PWM
//!   periods. It is started by a software event on the event system.
//! - TWI0 acts as an I2C client. Clock stretching keeps the host waiting
//!   until the main loop has handled an event.
#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]
#![feature(asm_experimental_arch)]

use led_light_sensor::config;
use led_light_sensor::monitor::Monitor;
use led_light_sensor::registers::LedRegisters;
use led_light_sensor::smbus::SmbusClient;

mod power;
mod sensor;
mod tca0;
mod tcb0;
mod twi0;

#[avr_device::entry]
fn main() -> ! {
    // SAFETY: the peripherals are taken exactly once, here. `take()` would add
    // a reachable panic.
    let mut peripherals = unsafe { avr_device::atmega4809::Peripherals::steal() };

    let portmux = &mut peripherals.PORTMUX;
    let porta = &mut peripherals.PORTA;
    let leds = tca0::Tca0Pwm::new(peripherals.TCA0, porta, portmux, config::PWM);
    let compare = config::SETTLE_COMPARE;
    let delay = tcb0::Tcb0Delay::new(peripherals.TCB0, peripherals.EVSYS, compare);
    let sensor = sensor::Sensor::new(peripherals.PORTD);
    let bus = twi0::Twi0Client::new(peripherals.TWI0, config::TWI);
    let core = power::Core::new(peripherals.SLPCTRL);

    let registers = SmbusClient::new(LedRegisters::new());
    Monitor::new(bus, registers, leds, delay, sensor, core).run()
}

/// The panic handler of the application.
///
/// There is no sensible recovery from a panic on this device, so the firmware
/// is written to contain none. The body references a symbol that does not
/// exist: if the optimizer could not remove every panicking path, linking
/// fails with an error like
/// ```console
/// src/smbus.rs:97:(.text.rust_begin_unwind+0x0): undefined reference to `a_panic_is_reachable'
/// ```
/// pointing at the offending call.
#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    extern "C" {
        fn a_panic_is_reachable() -> !;
    }
    // SAFETY: if this would be reachable, the code would not compile
    unsafe { a_panic_is_reachable() };
}
