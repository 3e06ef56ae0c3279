//! MasterMind rules and game flow

pub mod controller;
pub mod indicator;
pub mod matching;
pub mod sequence;

pub use controller::{Game, GameTiming, Outcome, Phase, RoundState, Rules, Secret};
pub use indicator::{Indicators, Led};
pub use matching::{count_matches, MatchResult};
pub use sequence::Sequence;
