//! Timed press counting
//!
//! Polls a [`Button`] inside a fixed window and counts presses. After each
//! counted press a refractory delay is enforced so contact bounce and slow
//! releases are not counted again. There is no further debouncing.

use std::time::Duration;

use crate::error::Result;
use crate::hal::{Clock, Deadline};
use crate::input::{Button, PressSource};

/// Timing of one sampling window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerTiming {
    /// Length of the input window
    pub window: Duration,
    /// Minimum gap between two counted presses
    pub refractory: Duration,
    /// Delay between polls while the button is idle
    pub poll_interval: Duration,
}

impl Default for SamplerTiming {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(5),
            refractory: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// Counts button presses inside a time window
pub struct PressSampler<B: Button, C: Clock> {
    button: B,
    clock: C,
    timing: SamplerTiming,
}

impl<B: Button, C: Clock> PressSampler<B, C> {
    pub fn new(button: B, clock: C, timing: SamplerTiming) -> Self {
        Self {
            button,
            clock,
            timing,
        }
    }

    pub fn timing(&self) -> &SamplerTiming {
        &self.timing
    }

    /// Count presses until `cap` is reached or the window elapses
    ///
    /// A press is a transition from released to pressed; holding the button
    /// counts once. The result never exceeds `cap`.
    pub fn sample(&mut self, cap: u8) -> Result<u8> {
        if cap == 0 {
            return Ok(0);
        }

        let deadline = Deadline::after(&self.clock, self.timing.window);
        let mut presses: u8 = 0;
        let mut was_pressed = false;

        while !deadline.expired(&self.clock) {
            let pressed = self.button.is_pressed()?;
            if pressed && !was_pressed {
                presses += 1;
                log::debug!("button press {} of at most {}", presses, cap);
                if presses >= cap {
                    break;
                }
                self.clock.sleep(self.timing.refractory);
            } else {
                self.clock.sleep(self.timing.poll_interval);
            }
            was_pressed = pressed;
        }

        Ok(presses.min(cap))
    }
}

impl<B: Button, C: Clock> PressSource for PressSampler<B, C> {
    fn collect(&mut self, cap: u8) -> Result<u8> {
        self.sample(cap)
    }
}
