//! Error types for the MasterMind driver stack

use thiserror::Error;

/// Errors raised by the hardware layers and the game logic
#[derive(Debug, Error)]
pub enum Error {
    /// `/dev/mem` could not be opened or mapped
    #[error("unable to map GPIO registers at {base:#010x}: {source}")]
    MapFailed {
        base: u64,
        #[source]
        source: std::io::Error,
    },

    /// Register access outside the mapped block
    #[error("register offset {offset:#x} outside mapped block of {len} bytes")]
    RegisterOutOfBounds { offset: usize, len: usize },

    /// Pin id not present on the GPIO block
    #[error("GPIO pin {0} out of range (0..{max})", max = crate::hal::gpio::PIN_COUNT)]
    PinOutOfRange(u8),

    /// LCD used before its initialisation sequence completed
    #[error("display is not initialised")]
    DisplayNotReady,

    /// Sequence has the wrong number of positions
    #[error("sequence must have {expected} digits, got {actual}")]
    SequenceLength { expected: usize, actual: usize },

    /// Sequence entry outside the allowed colour range
    #[error("sequence value {value} at position {position} outside 1..={colors}")]
    InvalidColor {
        position: usize,
        value: u8,
        colors: u8,
    },

    /// Rejected configuration value
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias used across the crate
pub type Result<T> = core::result::Result<T, Error>;
