//! 4-bit parallel bus to the LCD controller
//!
//! Four data lines, a register-select line and a strobe ("E") line, all
//! driven through GPIO. A nibble is latched by pulsing the strobe.
//!
//! # Default Wiring (BCM numbering)
//!
//! | GPIO | Function        |
//! |------|-----------------|
//! | 24   | Strobe (E)      |
//! | 25   | Register select |
//! | 23   | D4              |
//! | 26   | D5              |
//! | 27   | D6              |
//! | 22   | D7              |

use std::time::Duration;

use crate::error::Result;
use crate::hal::{Clock, Gpio, Level, Pin, PinMode, RegisterBlock};

/// Strobe settle time on each edge, in microseconds
pub const STROBE_SETTLE_US: u64 = 50;

/// Register-select line state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterSelect {
    /// Instruction register (RS low)
    Command,
    /// Data register (RS high)
    Data,
}

/// Transport used by the display driver
pub trait LcdBus {
    /// Present the low 4 bits of `nibble` on the data lines and latch them
    fn write_nibble(&mut self, rs: RegisterSelect, nibble: u8) -> Result<()>;

    /// Wait for the controller to settle
    fn delay(&mut self, duration: Duration);
}

/// Pins wired to the LCD
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LcdPins {
    pub strobe: Pin,
    pub register_select: Pin,
    /// D4..D7, least significant first
    pub data: [Pin; 4],
}

/// [`LcdBus`] implemented over GPIO
pub struct GpioLcdBus<'a, R: RegisterBlock, C: Clock> {
    gpio: &'a Gpio<R>,
    clock: &'a C,
    pins: LcdPins,
}

impl<'a, R: RegisterBlock, C: Clock> GpioLcdBus<'a, R, C> {
    /// Configure every bus pin as an output driven low
    pub fn new(gpio: &'a Gpio<R>, clock: &'a C, pins: LcdPins) -> Result<Self> {
        let all = [pins.register_select, pins.strobe]
            .into_iter()
            .chain(pins.data);
        for pin in all {
            gpio.set_mode(pin, PinMode::Output)?;
            gpio.set_low(pin)?;
        }
        Ok(Self { gpio, clock, pins })
    }

    pub fn pins(&self) -> &LcdPins {
        &self.pins
    }

    /// Pulse the strobe low -> high -> low
    fn strobe(&mut self) -> Result<()> {
        self.gpio.set_high(self.pins.strobe)?;
        self.clock.sleep_us(STROBE_SETTLE_US);
        self.gpio.set_low(self.pins.strobe)?;
        self.clock.sleep_us(STROBE_SETTLE_US);
        Ok(())
    }
}

impl<R: RegisterBlock, C: Clock> LcdBus for GpioLcdBus<'_, R, C> {
    fn write_nibble(&mut self, rs: RegisterSelect, nibble: u8) -> Result<()> {
        let rs_level = Level::from(rs == RegisterSelect::Data);
        self.gpio.write(self.pins.register_select, rs_level)?;

        for (bit, pin) in self.pins.data.iter().enumerate() {
            self.gpio.write(*pin, Level::from(nibble >> bit & 1 != 0))?;
        }
        self.strobe()
    }

    fn delay(&mut self, duration: Duration) {
        self.clock.sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::gpio::regs::{GPCLR0 as CLR, GPSET0 as SET};
    use crate::hal::{FakeClock, MemoryRegisters};

    fn pins() -> LcdPins {
        LcdPins {
            strobe: Pin::new(24).unwrap(),
            register_select: Pin::new(25).unwrap(),
            data: [23, 26, 27, 22].map(|n| Pin::new(n).unwrap()),
        }
    }

    #[test]
    fn test_new_configures_outputs_low() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        GpioLcdBus::new(&gpio, &clock, pins()).unwrap();

        for n in [22, 23, 24, 25, 26, 27] {
            let pin = Pin::new(n).unwrap();
            assert_eq!(gpio.mode(pin).unwrap(), PinMode::Output);
        }
        // each pin configured before its first level write
        let writes = gpio.registers().writes();
        assert_eq!(writes[0].0, 0x08);
        assert_eq!(writes[1], (CLR, 1 << 25));
    }

    #[test]
    fn test_write_nibble_sequence() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let mut bus = GpioLcdBus::new(&gpio, &clock, pins()).unwrap();
        gpio.registers().clear_writes();

        bus.write_nibble(RegisterSelect::Data, 0b1010).unwrap();

        assert_eq!(
            gpio.registers().writes(),
            vec![
                (SET, 1 << 25), // RS high
                (CLR, 1 << 23), // D4 = 0
                (SET, 1 << 26), // D5 = 1
                (CLR, 1 << 27), // D6 = 0
                (SET, 1 << 22), // D7 = 1
                (SET, 1 << 24), // strobe high
                (CLR, 1 << 24), // strobe low
            ]
        );
        assert_eq!(clock.now(), Duration::from_micros(2 * STROBE_SETTLE_US));
    }

    #[test]
    fn test_command_drives_rs_low() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let mut bus = GpioLcdBus::new(&gpio, &clock, pins()).unwrap();
        gpio.registers().clear_writes();

        bus.write_nibble(RegisterSelect::Command, 0x3).unwrap();
        assert_eq!(gpio.registers().writes()[0], (CLR, 1 << 25));
    }
}
