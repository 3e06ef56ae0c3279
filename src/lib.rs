//! MasterMind for Raspberry Pi
//!
//! A code-breaking game played with one push button, a green and a red LED
//! and a 16x2 HD44780 character LCD, all wired to BCM283x GPIO lines that
//! are driven through memory-mapped registers.
//!
//! # Architecture
//!
//! ```text
//!            ┌──────────────────┐
//!            │  Game Controller │
//!            └──┬──────┬─────┬──┘
//!               │      │     │
//!               ▼      ▼     ▼
//! ┌─────────────┐ ┌──────┐ ┌─────────────┐
//! │ HD44780 LCD │ │ LEDs │ │ Press       │
//! │ (4-bit bus) │ │      │ │ Sampler     │
//! └──────┬──────┘ └──┬───┘ └──────┬──────┘
//!        └───────────┼────────────┘
//!                    ▼
//!             ┌─────────────┐
//!             │ GPIO Driver │
//!             └──────┬──────┘
//!                    ▼
//!          Register Block (/dev/mem)
//! ```
//!
//! Every layer sits on a trait ([`hal::RegisterBlock`], [`hal::Clock`],
//! [`display::LcdBus`], [`input::PressSource`]) so the game runs unchanged
//! against in-memory registers and a virtual clock in tests.
//!
//! # Usage
//!
//! ```no_run
//! use mastermind_pi::game::{count_matches, Sequence};
//!
//! let secret = Sequence::from_decimal(123, 3)?;
//! let guess = Sequence::from_decimal(321, 3)?;
//! let result = count_matches(&secret, &guess);
//! assert_eq!((result.exact, result.approximate), (1, 2));
//! # Ok::<(), mastermind_pi::Error>(())
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod game;
pub mod hal;
pub mod input;

pub use config::GameConfig;
pub use error::{Error, Result};
pub use game::{count_matches, Game, MatchResult, Outcome, Sequence};
