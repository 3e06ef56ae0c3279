//! Push-button input

use crate::error::Result;
use crate::hal::{Gpio, Level, Pin, PinMode, RegisterBlock};

/// A source of button state
pub trait Button {
    /// Whether the button is currently held down
    fn is_pressed(&mut self) -> Result<bool>;
}

/// Button wired to a GPIO input
///
/// With the default wiring the button pulls the line high when pressed.
pub struct GpioButton<'a, R: RegisterBlock> {
    gpio: &'a Gpio<R>,
    pin: Pin,
    active: Level,
}

impl<'a, R: RegisterBlock> GpioButton<'a, R> {
    /// Configure `pin` as an input
    pub fn new(gpio: &'a Gpio<R>, pin: Pin, active: Level) -> Result<Self> {
        gpio.set_mode(pin, PinMode::Input)?;
        Ok(Self { gpio, pin, active })
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }
}

impl<R: RegisterBlock> Button for GpioButton<'_, R> {
    fn is_pressed(&mut self) -> Result<bool> {
        Ok(self.gpio.read(self.pin)? == self.active)
    }
}
