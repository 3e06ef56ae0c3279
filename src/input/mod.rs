//! Button input
//!
//! The player enters each guess digit by pressing a single button a number
//! of times inside a fixed window.

pub mod button;
pub mod sampler;

pub use button::{Button, GpioButton};
pub use sampler::{PressSampler, SamplerTiming};

use crate::error::Result;

/// Something that yields one press count per turn
pub trait PressSource {
    /// Collect presses for one turn, returning at most `cap`
    fn collect(&mut self, cap: u8) -> Result<u8>;
}
