//! Status LEDs
//!
//! A green and a red LED on plain GPIO outputs. The game reports press
//! counts and scores by blinking them.

use std::time::Duration;

use crate::error::Result;
use crate::hal::{Clock, Gpio, Level, Pin, PinMode, RegisterBlock};

/// Which LED to drive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Led {
    Green,
    Red,
}

/// Driver for the two status LEDs
pub struct Indicators<'a, R: RegisterBlock, C: Clock> {
    gpio: &'a Gpio<R>,
    clock: &'a C,
    green: Pin,
    red: Pin,
    half_period: Duration,
}

impl<'a, R: RegisterBlock, C: Clock> Indicators<'a, R, C> {
    /// Configure both pins as outputs and switch the LEDs off
    ///
    /// `half_period` is the on time and the off time of one blink.
    pub fn new(
        gpio: &'a Gpio<R>,
        clock: &'a C,
        green: Pin,
        red: Pin,
        half_period: Duration,
    ) -> Result<Self> {
        for pin in [green, red] {
            gpio.set_mode(pin, PinMode::Output)?;
            gpio.set_low(pin)?;
        }
        Ok(Self {
            gpio,
            clock,
            green,
            red,
            half_period,
        })
    }

    fn pin(&self, led: Led) -> Pin {
        match led {
            Led::Green => self.green,
            Led::Red => self.red,
        }
    }

    pub fn set(&self, led: Led, on: bool) -> Result<()> {
        self.gpio.write(self.pin(led), Level::from(on))
    }

    pub fn all_off(&self) -> Result<()> {
        self.set(Led::Green, false)?;
        self.set(Led::Red, false)
    }

    /// Blink `led` `count` times; the LED ends off
    pub fn blink(&self, led: Led, count: u8) -> Result<()> {
        let pin = self.pin(led);
        for _ in 0..count {
            self.gpio.set_high(pin)?;
            self.clock.sleep(self.half_period);
            self.gpio.set_low(pin)?;
            self.clock.sleep(self.half_period);
        }
        Ok(())
    }

    /// Hold `led` on for `duration`, then switch it off
    pub fn pulse(&self, led: Led, duration: Duration) -> Result<()> {
        let pin = self.pin(led);
        self.gpio.set_high(pin)?;
        self.clock.sleep(duration);
        self.gpio.set_low(pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::gpio::regs;
    use crate::hal::{FakeClock, MemoryRegisters};

    const GREEN: u8 = 13;
    const RED: u8 = 5;

    fn setup<'a>(
        gpio: &'a Gpio<MemoryRegisters>,
        clock: &'a FakeClock,
    ) -> Indicators<'a, MemoryRegisters, FakeClock> {
        let leds = Indicators::new(
            gpio,
            clock,
            Pin::new(GREEN).unwrap(),
            Pin::new(RED).unwrap(),
            Duration::from_millis(500),
        )
        .unwrap();
        gpio.registers().clear_writes();
        leds
    }

    #[test]
    fn test_new_drives_outputs_low() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let _leds = Indicators::new(
            &gpio,
            &clock,
            Pin::new(GREEN).unwrap(),
            Pin::new(RED).unwrap(),
            Duration::from_millis(500),
        )
        .unwrap();

        assert_eq!(gpio.mode(Pin::new(GREEN).unwrap()).unwrap(), PinMode::Output);
        assert_eq!(gpio.mode(Pin::new(RED).unwrap()).unwrap(), PinMode::Output);
        let writes = gpio.registers().writes();
        assert!(writes.contains(&(regs::GPCLR0, 1 << GREEN)));
        assert!(writes.contains(&(regs::GPCLR0, 1 << RED)));
    }

    #[test]
    fn test_blink_count_and_timing() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let leds = setup(&gpio, &clock);

        leds.blink(Led::Green, 3).unwrap();

        let writes = gpio.registers().writes();
        let sets = writes.iter().filter(|w| **w == (regs::GPSET0, 1 << GREEN)).count();
        let clears = writes.iter().filter(|w| **w == (regs::GPCLR0, 1 << GREEN)).count();
        assert_eq!((sets, clears), (3, 3));
        assert_eq!(writes.last(), Some(&(regs::GPCLR0, 1 << GREEN)));
        assert_eq!(clock.now(), Duration::from_secs(3));
    }

    #[test]
    fn test_blink_zero_is_silent() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let leds = setup(&gpio, &clock);

        leds.blink(Led::Red, 0).unwrap();
        assert!(gpio.registers().writes().is_empty());
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_pulse_and_set() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let leds = setup(&gpio, &clock);

        leds.pulse(Led::Red, Duration::from_secs(2)).unwrap();
        assert_eq!(
            gpio.registers().writes(),
            vec![(regs::GPSET0, 1 << RED), (regs::GPCLR0, 1 << RED)]
        );
        assert_eq!(clock.now(), Duration::from_secs(2));

        gpio.registers().clear_writes();
        leds.set(Led::Green, true).unwrap();
        leds.all_off().unwrap();
        assert_eq!(
            gpio.registers().writes(),
            vec![
                (regs::GPSET0, 1 << GREEN),
                (regs::GPCLR0, 1 << GREEN),
                (regs::GPCLR0, 1 << RED)
            ]
        );
    }
}
