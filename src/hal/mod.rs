//! Hardware Abstraction Layer for BCM283x
//!
//! Provides drivers for:
//! - Memory-mapped register access
//! - GPIO pin control
//! - Monotonic time and deadlines

pub mod clock;
pub mod gpio;
pub mod registers;

pub use clock::{Clock, Deadline, FakeClock, SystemClock};
pub use gpio::{Gpio, Level, Pin, PinMode};
pub use registers::{Field, MemoryRegisters, RegisterBlock};

#[cfg(unix)]
pub use registers::MmapRegisters;
