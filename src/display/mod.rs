//! Character display
//!
//! An HD44780 16x2 LCD driven over a 4-bit GPIO bus.

pub mod bus;
pub mod hd44780;

pub use bus::{GpioLcdBus, LcdBus, LcdPins, RegisterSelect};
pub use hd44780::{DisplayState, Hd44780, InitPhase};
