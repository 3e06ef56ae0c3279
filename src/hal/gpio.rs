//! BCM283x GPIO Driver
//!
//! Pin mode configuration and level get/set on top of a [`RegisterBlock`].
//!
//! # Register Layout
//!
//! | Offset | Register | Purpose                                   |
//! |--------|----------|-------------------------------------------|
//! | 0x00   | GPFSEL0  | Function select, pins 0-9 (3 bits/pin)    |
//! | 0x1C   | GPSET0   | Output set, pins 0-31 (write 1 to set)    |
//! | 0x28   | GPCLR0   | Output clear, pins 0-31 (write 1 to clear)|
//! | 0x34   | GPLEV0   | Pin level, pins 0-31                      |
//!
//! Each register repeats for higher pins at the next word.

use core::fmt;

use crate::error::{Error, Result};
use crate::hal::registers::{Field, RegisterBlock};

/// BCM2837 (Raspberry Pi 3) GPIO physical base address
pub const GPIO_BASE_BCM2837: u64 = 0x3F20_0000;

/// BCM2711 (Raspberry Pi 4) GPIO physical base address
pub const GPIO_BASE_BCM2711: u64 = 0xFE20_0000;

/// Number of GPIO lines on the block
pub const PIN_COUNT: u8 = 54;

/// GPIO register offsets
pub mod regs {
    pub const GPFSEL0: usize = 0x00;
    pub const GPSET0: usize = 0x1C;
    pub const GPCLR0: usize = 0x28;
    pub const GPLEV0: usize = 0x34;
}

/// Pins per GPFSEL word
const FSEL_PINS_PER_WORD: u8 = 10;
/// Bits per pin in a GPFSEL word
const FSEL_BITS_PER_PIN: u32 = 3;

/// A validated BCM GPIO number
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pin(u8);

impl Pin {
    /// Validate a BCM pin number
    pub fn new(number: u8) -> Result<Self> {
        if number >= PIN_COUNT {
            return Err(Error::PinOutOfRange(number));
        }
        Ok(Self(number))
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    /// GPFSEL word offset and field governing this pin's function
    fn fsel(self) -> (usize, Field) {
        let word = (self.0 / FSEL_PINS_PER_WORD) as usize;
        let slot = (self.0 % FSEL_PINS_PER_WORD) as u32;
        (
            regs::GPFSEL0 + word * 4,
            Field::new(slot * FSEL_BITS_PER_PIN, FSEL_BITS_PER_PIN),
        )
    }

    /// Word offset from a bank-0 register and the pin's bit mask in that word
    fn bank(self, reg0: usize) -> (usize, u32) {
        let word = (self.0 / 32) as usize;
        (reg0 + word * 4, 1u32 << (self.0 % 32))
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Pin function
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinMode {
    Input = 0,
    Output = 1,
    Alt0 = 4,
    Alt1 = 5,
    Alt2 = 6,
    Alt3 = 7,
    Alt4 = 3,
    Alt5 = 2,
}

impl PinMode {
    fn from_bits(bits: u32) -> Self {
        match bits & 0b111 {
            0 => PinMode::Input,
            1 => PinMode::Output,
            4 => PinMode::Alt0,
            5 => PinMode::Alt1,
            6 => PinMode::Alt2,
            7 => PinMode::Alt3,
            3 => PinMode::Alt4,
            _ => PinMode::Alt5,
        }
    }
}

/// Digital pin level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// GPIO driver over a register block
pub struct Gpio<R: RegisterBlock> {
    regs: R,
}

impl<R: RegisterBlock> Gpio<R> {
    /// Wrap an already mapped register block
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Access the underlying register block
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Configure a pin's function
    ///
    /// Only the pin's 3-bit field in its GPFSEL word is rewritten; the other
    /// nine pins sharing the word keep their configuration.
    pub fn set_mode(&self, pin: Pin, mode: PinMode) -> Result<()> {
        let (offset, field) = pin.fsel();
        log::debug!("{} -> {:?} (GPFSEL @ {:#04x}, bits {})", pin, mode, offset, field.shift);
        self.regs.modify_field(offset, field, mode as u32)
    }

    /// Current function of a pin
    pub fn mode(&self, pin: Pin) -> Result<PinMode> {
        let (offset, field) = pin.fsel();
        Ok(PinMode::from_bits(field.extract(self.regs.read(offset)?)))
    }

    /// Drive an output pin
    ///
    /// Uses the write-1-to-set / write-1-to-clear registers, so no other pin
    /// is read or rewritten.
    pub fn write(&self, pin: Pin, level: Level) -> Result<()> {
        let reg0 = match level {
            Level::High => regs::GPSET0,
            Level::Low => regs::GPCLR0,
        };
        let (offset, mask) = pin.bank(reg0);
        self.regs.write(offset, mask)
    }

    pub fn set_high(&self, pin: Pin) -> Result<()> {
        self.write(pin, Level::High)
    }

    pub fn set_low(&self, pin: Pin) -> Result<()> {
        self.write(pin, Level::Low)
    }

    /// Read a pin's live level
    pub fn read(&self, pin: Pin) -> Result<Level> {
        let (offset, mask) = pin.bank(regs::GPLEV0);
        Ok(Level::from(self.regs.read(offset)? & mask != 0))
    }
}
