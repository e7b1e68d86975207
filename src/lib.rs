//! Measuring the light output of LEDs with nothing but a PWM and a comparator
//!
//! The device drives (up to) two LEDs through PWM outputs. A light sensor with
//! a digital threshold output looks at them. Instead of an ADC, the brightness
//! is measured by successive approximation: the duty cycle of one LED is
//! varied until the sensor output flips, one sample per settling interval.
//! The resulting duty cycle is published to a bus host as an SMBus-style word
//! register.
//!
//! Everything in this library is hardware-agnostic: the peripherals are hidden
//! behind the small traits in [`hal`], [`twi::TwiPeripheral`] and
//! [`sleep::Cpu`], so the protocol engines and the search can be tested on the
//! host. The AVR specific parts live in the firmware binary.
//!
//! # Execution model
//! There is a single thread of control. Interrupts are only used to wake the
//! CPU from sleep, their handlers are empty. After each wake-up the
//! [`monitor::Monitor`] polls the sticky hardware event flags and drives the
//! state machines synchronously:
//! ```ascii-drawing
//!   ┌──────────────► sleep (until TWI or TCB0 event) ──┐
//!   │                                                  │
//!   └── calibration: sample/narrow ◄── TWI: on event ◄─┘
//! ```
#![cfg_attr(not(test), no_std)]

pub mod logging;

pub mod calibration;
pub mod config;
pub mod error;
pub mod fraction;
pub mod hal;
pub mod monitor;
pub mod register_file;
pub mod registers;
pub mod sleep;
pub mod smbus;
pub mod twi;
