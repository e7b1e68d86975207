//! The comparator output of the light sensor.
use avr_device::atmega4809::PORTD;
use led_light_sensor::hal::DigitalInput;

/// `PORTD`: the sensor output is connected to PD2.
const SENSOR_PIN: u8 = 1 << 2;

pub struct Sensor(PORTD);

impl Sensor {
    /// Configure the sensor pin as an input.
    pub fn new(portd: PORTD) -> Self {
        // SAFETY: only the sensor pin is affected
        portd.dirclr.write(|w| unsafe { w.bits(SENSOR_PIN) });
        Self(portd)
    }
}

impl DigitalInput for Sensor {
    fn is_high(&mut self) -> bool {
        self.0.in_.read().bits() & SENSOR_PIN != 0
    }
}
