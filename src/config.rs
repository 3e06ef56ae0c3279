//! Board wiring, rules and timing
//!
//! Every field has a default matching the stock board, so a config file
//! only needs the values it changes:
//!
//! ```toml
//! [gpio]
//! base = 0xFE200000   # Raspberry Pi 4
//!
//! [rules]
//! colors = 4
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::display::LcdPins;
use crate::error::{Error, Result};
use crate::game::{GameTiming, Rules};
use crate::hal::gpio::{GPIO_BASE_BCM2837, PIN_COUNT};
use crate::hal::registers::BLOCK_SIZE;
use crate::hal::{Level, Pin};
use crate::input::SamplerTiming;

/// GPIO register block location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    /// Physical base address of the GPIO registers
    pub base: u64,
    /// Bytes to map
    pub block_size: usize,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            base: GPIO_BASE_BCM2837,
            block_size: BLOCK_SIZE,
        }
    }
}

/// BCM pin numbers of the attached parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wiring {
    pub green_led: u8,
    pub red_led: u8,
    pub button: u8,
    /// Whether a pressed button reads high
    pub button_active_high: bool,
    pub lcd_strobe: u8,
    pub lcd_register_select: u8,
    /// LCD D4..D7
    pub lcd_data: [u8; 4],
}

impl Default for Wiring {
    fn default() -> Self {
        Self {
            green_led: 13,
            red_led: 5,
            button: 19,
            button_active_high: true,
            lcd_strobe: 24,
            lcd_register_select: 25,
            lcd_data: [23, 26, 27, 22],
        }
    }
}

impl Wiring {
    fn all_pins(&self) -> Vec<(&'static str, u8)> {
        let mut pins = vec![
            ("green_led", self.green_led),
            ("red_led", self.red_led),
            ("button", self.button),
            ("lcd_strobe", self.lcd_strobe),
            ("lcd_register_select", self.lcd_register_select),
        ];
        pins.extend(self.lcd_data.iter().map(|&p| ("lcd_data", p)));
        pins
    }

    pub fn lcd_pins(&self) -> Result<LcdPins> {
        Ok(LcdPins {
            strobe: Pin::new(self.lcd_strobe)?,
            register_select: Pin::new(self.lcd_register_select)?,
            data: [
                Pin::new(self.lcd_data[0])?,
                Pin::new(self.lcd_data[1])?,
                Pin::new(self.lcd_data[2])?,
                Pin::new(self.lcd_data[3])?,
            ],
        })
    }

    pub fn button_active_level(&self) -> Level {
        Level::from(self.button_active_high)
    }
}

/// Puzzle size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub colors: u8,
    pub length: u8,
    pub max_rounds: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        let rules = Rules::default();
        Self {
            colors: rules.colors,
            length: rules.length,
            max_rounds: rules.max_rounds,
        }
    }
}

/// Delays in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Input window per turn
    pub turn_window_ms: u64,
    /// Minimum gap between counted presses
    pub refractory_ms: u64,
    /// Button poll interval
    pub poll_interval_ms: u64,
    /// LED on and off time within one blink
    pub blink_ms: u64,
    /// Red LED pulse after each input window
    pub window_end_pulse_ms: u64,
    pub between_turns_ms: u64,
    pub score_pause_ms: u64,
    pub between_rounds_ms: u64,
    pub welcome_ms: u64,
    pub success_hold_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let sampler = SamplerTiming::default();
        let game = GameTiming::default();
        let ms = |d: Duration| d.as_millis() as u64;
        Self {
            turn_window_ms: ms(sampler.window),
            refractory_ms: ms(sampler.refractory),
            poll_interval_ms: ms(sampler.poll_interval),
            blink_ms: 500,
            window_end_pulse_ms: ms(game.window_end_pulse),
            between_turns_ms: ms(game.between_turns),
            score_pause_ms: ms(game.score_pause),
            between_rounds_ms: ms(game.between_rounds),
            welcome_ms: ms(game.welcome),
            success_hold_ms: ms(game.success_hold),
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub gpio: GpioConfig,
    pub wiring: Wiring,
    pub rules: RulesConfig,
    pub timing: TimingConfig,
}

impl GameConfig {
    /// Read and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&text)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (role, pin) in self.wiring.all_pins() {
            if pin >= PIN_COUNT {
                return Err(Error::Config(format!(
                    "{} pin {} out of range (0..{})",
                    role, pin, PIN_COUNT
                )));
            }
            if !seen.insert(pin) {
                return Err(Error::Config(format!("pin {} assigned twice ({})", pin, role)));
            }
        }

        if self.gpio.block_size == 0 || self.gpio.block_size % 4 != 0 {
            return Err(Error::Config(format!(
                "block_size {} must be a non-zero multiple of 4",
                self.gpio.block_size
            )));
        }

        self.rules().validate()?;

        if self.timing.turn_window_ms == 0 {
            return Err(Error::Config("turn_window_ms must be non-zero".into()));
        }
        Ok(())
    }

    pub fn rules(&self) -> Rules {
        Rules {
            colors: self.rules.colors,
            length: self.rules.length,
            max_rounds: self.rules.max_rounds,
        }
    }

    pub fn sampler_timing(&self) -> SamplerTiming {
        SamplerTiming {
            window: Duration::from_millis(self.timing.turn_window_ms),
            refractory: Duration::from_millis(self.timing.refractory_ms),
            poll_interval: Duration::from_millis(self.timing.poll_interval_ms),
        }
    }

    pub fn game_timing(&self) -> GameTiming {
        let t = &self.timing;
        GameTiming {
            welcome: Duration::from_millis(t.welcome_ms),
            window_end_pulse: Duration::from_millis(t.window_end_pulse_ms),
            between_turns: Duration::from_millis(t.between_turns_ms),
            score_pause: Duration::from_millis(t.score_pause_ms),
            between_rounds: Duration::from_millis(t.between_rounds_ms),
            success_hold: Duration::from_millis(t.success_hold_ms),
        }
    }

    pub fn blink_half_period(&self) -> Duration {
        Duration::from_millis(self.timing.blink_ms)
    }
}
