//! Game controller
//!
//! Drives one game from start to finish:
//!
//! ```text
//! AwaitingSecret ──► Playing{1} ──► Scored{1} ──► Playing{2} ──► ... ──► Scored{n}
//!                                       │                                   │
//!                                       └──► Won{1}          Won{n} ◄───────┤
//!                                                        Exhausted{n} ◄─────┘
//! ```
//!
//! Each round collects one press count per position, scores the guess and
//! reports the result on the LEDs and the LCD. The game ends when a guess
//! matches exactly or when the round limit is reached.

use std::time::Duration;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::display::{Hd44780, InitPhase, LcdBus};
use crate::error::{Error, Result};
use crate::game::indicator::{Indicators, Led};
use crate::game::matching::{count_matches, MatchResult};
use crate::game::sequence::{Sequence, MAX_LENGTH};
use crate::hal::{Clock, RegisterBlock};
use crate::input::PressSource;

/// Size of the puzzle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rules {
    /// Number of colours; colours are `1..=colors`
    pub colors: u8,
    /// Positions per sequence
    pub length: u8,
    /// Rounds before the game is lost
    pub max_rounds: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            colors: 3,
            length: 3,
            max_rounds: 5,
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_LENGTH).contains(&self.colors) {
            return Err(Error::Config(format!(
                "colors must be in 1..={}, got {}",
                MAX_LENGTH, self.colors
            )));
        }
        if !(1..=MAX_LENGTH).contains(&self.length) {
            return Err(Error::Config(format!(
                "length must be in 1..={}, got {}",
                MAX_LENGTH, self.length
            )));
        }
        if self.max_rounds == 0 {
            return Err(Error::Config("max_rounds must be at least 1".into()));
        }
        Ok(())
    }
}

/// Pauses between game events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameTiming {
    /// How long the welcome message stays up
    pub welcome: Duration,
    /// Red LED on time after each input window closes
    pub window_end_pulse: Duration,
    /// Gap after echoing one turn's input
    pub between_turns: Duration,
    /// Gap before the score is reported
    pub score_pause: Duration,
    /// Gap before the next round starts
    pub between_rounds: Duration,
    /// How long `SUCCESS!` is shown before the attempt count
    pub success_hold: Duration,
}

impl Default for GameTiming {
    fn default() -> Self {
        Self {
            welcome: Duration::from_secs(2),
            window_end_pulse: Duration::from_secs(2),
            between_turns: Duration::from_millis(500),
            score_pause: Duration::from_millis(500),
            between_rounds: Duration::from_secs(2),
            success_hold: Duration::from_secs(3),
        }
    }
}

/// Where the secret comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Secret {
    /// Supplied up front, e.g. on the command line
    Fixed(Sequence),
    /// Drawn uniformly from `1..=colors`; a seed makes it reproducible
    Random { seed: Option<u64> },
}

impl Secret {
    fn resolve(&self, rules: &Rules) -> Sequence {
        match self {
            Secret::Fixed(sequence) => sequence.clone(),
            Secret::Random { seed } => {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(*seed),
                    None => StdRng::from_entropy(),
                };
                Sequence::random(&mut rng, rules.colors, rules.length)
            }
        }
    }
}

/// Controller phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitingSecret,
    Playing { round: u32 },
    Scored { round: u32, result: MatchResult },
    Won { rounds: u32 },
    Exhausted { rounds: u32 },
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Won { .. } | Phase::Exhausted { .. })
    }
}

/// Progress through the current round
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundState {
    pub round_number: u32,
    pub turns_completed: u8,
    pub guess: Vec<u8>,
    pub last_result: Option<MatchResult>,
}

impl RoundState {
    fn new(round_number: u32) -> Self {
        Self {
            round_number,
            ..Self::default()
        }
    }

    fn record(&mut self, presses: u8) {
        self.guess.push(presses);
        self.turns_completed += 1;
    }
}

/// How a finished game ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Won { rounds: u32 },
    Exhausted { rounds: u32 },
}

/// A single MasterMind game on the board
pub struct Game<'a, B, S, R, C>
where
    B: LcdBus,
    S: PressSource,
    R: RegisterBlock,
    C: Clock,
{
    lcd: Hd44780<B>,
    leds: Indicators<'a, R, C>,
    input: S,
    clock: &'a C,
    rules: Rules,
    timing: GameTiming,
    source: Secret,
    secret: Option<Sequence>,
    phase: Phase,
    round: RoundState,
}

impl<'a, B, S, R, C> Game<'a, B, S, R, C>
where
    B: LcdBus,
    S: PressSource,
    R: RegisterBlock,
    C: Clock,
{
    /// Assemble a game; the LCD is initialised on the first step if needed
    ///
    /// A fixed secret must match the rules.
    pub fn new(
        lcd: Hd44780<B>,
        leds: Indicators<'a, R, C>,
        input: S,
        clock: &'a C,
        rules: Rules,
        timing: GameTiming,
        source: Secret,
    ) -> Result<Self> {
        rules.validate()?;
        if let Secret::Fixed(sequence) = &source {
            sequence.validate(rules.colors, rules.length as usize, false)?;
        }
        Ok(Self {
            lcd,
            leds,
            input,
            clock,
            rules,
            timing,
            source,
            secret: None,
            phase: Phase::AwaitingSecret,
            round: RoundState::default(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// State of the round in progress, or the last one played
    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn lcd(&self) -> &Hd44780<B> {
        &self.lcd
    }

    /// The secret, drawn on first use and fixed for the rest of the game
    pub fn secret(&mut self) -> &Sequence {
        let source = &self.source;
        let rules = &self.rules;
        self.secret.get_or_insert_with(|| source.resolve(rules))
    }

    /// Play until the game is won or the round limit is reached
    pub fn run(&mut self) -> Result<Outcome> {
        loop {
            match self.step()? {
                Phase::Won { rounds } => return Ok(Outcome::Won { rounds }),
                Phase::Exhausted { rounds } => return Ok(Outcome::Exhausted { rounds }),
                _ => {}
            }
        }
    }

    /// Advance by one phase; terminal phases stay put
    pub fn step(&mut self) -> Result<Phase> {
        let next = match self.phase {
            Phase::AwaitingSecret => {
                self.start()?;
                Phase::Playing { round: 1 }
            }
            Phase::Playing { round } => {
                let result = self.play_round(round)?;
                Phase::Scored { round, result }
            }
            Phase::Scored { round, result } => self.report(round, result)?,
            done @ (Phase::Won { .. } | Phase::Exhausted { .. }) => done,
        };
        if next != self.phase {
            debug!("game phase {:?} -> {:?}", self.phase, next);
        }
        self.phase = next;
        Ok(next)
    }

    fn start(&mut self) -> Result<()> {
        if self.lcd.phase() != InitPhase::Ready {
            self.lcd.init()?;
        }
        self.leds.all_off()?;

        let rules = self.rules;
        let secret = self.secret().clone();
        info!(
            "MasterMind: {} colours, {} positions, {} rounds",
            rules.colors, rules.length, rules.max_rounds
        );
        info!("secret: {}", secret);

        self.lcd.clear()?;
        self.lcd.put_str("Welcome!")?;
        self.clock.sleep(self.timing.welcome);
        self.lcd.clear()
    }

    fn play_round(&mut self, round: u32) -> Result<MatchResult> {
        info!("round {}", round);
        self.round = RoundState::new(round);
        self.lcd.clear()?;
        self.lcd.put_str(&format!("Round: {}", round))?;

        for turn in 1..=self.rules.length {
            info!("turn {}: press the button up to {} times", turn, self.rules.colors);
            let presses = self.input.collect(self.rules.colors)?;
            if presses == 0 {
                warn!("turn {}: no presses, recording a blank", turn);
            } else {
                info!("turn {}: {} presses", turn, presses);
            }

            self.leds.pulse(Led::Red, self.timing.window_end_pulse)?;
            self.leds.blink(Led::Green, presses)?;
            self.round.record(presses);
            self.clock.sleep(self.timing.between_turns);
        }
        self.leds.blink(Led::Red, 2)?;

        let guess = Sequence::new(self.round.guess.clone());
        let result = count_matches(self.secret(), &guess);
        self.round.last_result = Some(result);
        info!("guess {}: {}", guess, result);
        Ok(result)
    }

    fn report(&mut self, round: u32, result: MatchResult) -> Result<Phase> {
        self.clock.sleep(self.timing.score_pause);
        let solved = result.is_solved(self.rules.length as usize);

        if solved {
            self.leds.set(Led::Red, true)?;
        }
        self.lcd.clear()?;
        self.leds.blink(Led::Green, result.exact)?;
        self.lcd.put_str(&format!("Exact: {}", result.exact))?;

        if solved {
            self.leds.set(Led::Red, false)?;
        } else {
            self.leds.blink(Led::Red, 1)?;
        }

        self.leds.blink(Led::Green, result.approximate)?;
        self.lcd.set_position(0, 1)?;
        self.lcd.put_str(&format!("Approx: {}", result.approximate))?;

        if solved {
            info!("solved in {} rounds", round);
            self.lcd.clear()?;
            self.lcd.put_str("SUCCESS!")?;
            self.clock.sleep(self.timing.success_hold);
            self.lcd.set_position(0, 1)?;
            self.lcd.put_str(&format!("Attempts: {}", round))?;
            return Ok(Phase::Won { rounds: round });
        }

        self.leds.blink(Led::Red, 3)?;
        if round >= self.rules.max_rounds {
            info!("no rounds left after {}", round);
            self.lcd.clear()?;
            self.lcd.put_str("YOU LOSE!")?;
            return Ok(Phase::Exhausted { rounds: round });
        }

        info!("starting round {}", round + 1);
        self.clock.sleep(self.timing.between_rounds);
        Ok(Phase::Playing { round: round + 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::hd44780::tests::RecordingBus;
    use crate::hal::gpio::regs;
    use crate::hal::{FakeClock, Gpio, MemoryRegisters, Pin};
    use std::collections::VecDeque;

    const GREEN: u8 = 13;
    const RED: u8 = 5;

    /// Press source that replays fixed counts and records each cap
    #[derive(Default)]
    struct ScriptedPresses {
        counts: VecDeque<u8>,
        caps: Vec<u8>,
    }

    impl ScriptedPresses {
        fn new(counts: &[u8]) -> Self {
            Self {
                counts: counts.iter().copied().collect(),
                caps: Vec::new(),
            }
        }
    }

    impl PressSource for ScriptedPresses {
        fn collect(&mut self, cap: u8) -> Result<u8> {
            self.caps.push(cap);
            Ok(self.counts.pop_front().unwrap_or(0).min(cap))
        }
    }

    type TestGame<'a> = Game<'a, RecordingBus, ScriptedPresses, MemoryRegisters, FakeClock>;

    fn game<'a>(
        gpio: &'a Gpio<MemoryRegisters>,
        clock: &'a FakeClock,
        rules: Rules,
        secret: Secret,
        presses: &[u8],
    ) -> TestGame<'a> {
        let leds = Indicators::new(
            gpio,
            clock,
            Pin::new(GREEN).unwrap(),
            Pin::new(RED).unwrap(),
            Duration::from_millis(500),
        )
        .unwrap();
        Game::new(
            Hd44780::new(RecordingBus::default()),
            leds,
            ScriptedPresses::new(presses),
            clock,
            rules,
            GameTiming::default(),
            secret,
        )
        .unwrap()
    }

    fn fixed(values: &[u8]) -> Secret {
        Secret::Fixed(Sequence::new(values.to_vec()))
    }

    fn shown(game: &TestGame<'_>) -> String {
        String::from_utf8_lossy(&game.lcd().bus().data()).into_owned()
    }

    #[test]
    fn test_win_in_first_round() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let mut g = game(&gpio, &clock, Rules::default(), fixed(&[2, 2, 2]), &[2, 2, 2]);

        assert_eq!(g.run().unwrap(), Outcome::Won { rounds: 1 });
        assert_eq!(g.phase(), Phase::Won { rounds: 1 });
        assert_eq!(g.round().guess, vec![2, 2, 2]);
        assert_eq!(g.round().turns_completed, 3);
        assert_eq!(
            g.round().last_result,
            Some(MatchResult {
                exact: 3,
                approximate: 0
            })
        );
        assert_eq!(g.input.caps, vec![3, 3, 3]);

        let text = shown(&g);
        for expected in ["Welcome!", "Round: 1", "Exact: 3", "Approx: 0", "SUCCESS!", "Attempts: 1"] {
            assert!(text.contains(expected), "missing {:?} in {:?}", expected, text);
        }
    }

    #[test]
    fn test_exhausted_after_max_rounds() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let rules = Rules {
            max_rounds: 2,
            ..Rules::default()
        };
        let mut g = game(&gpio, &clock, rules, fixed(&[2, 2, 2]), &[1, 1, 1, 3, 3, 3]);

        assert_eq!(g.run().unwrap(), Outcome::Exhausted { rounds: 2 });
        assert_eq!(g.input.caps.len(), 6);

        let text = shown(&g);
        assert!(text.contains("Round: 2"));
        assert!(text.contains("YOU LOSE!"));
        assert!(!text.contains("SUCCESS!"));
        assert!(!text.contains("Round: 3"));
    }

    #[test]
    fn test_phase_transitions() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let mut g = game(&gpio, &clock, Rules::default(), fixed(&[1, 2, 3]), &[3, 2, 1, 1, 2, 3]);

        assert_eq!(g.phase(), Phase::AwaitingSecret);
        assert_eq!(g.step().unwrap(), Phase::Playing { round: 1 });
        assert_eq!(g.lcd().phase(), InitPhase::Ready);
        assert_eq!(
            g.step().unwrap(),
            Phase::Scored {
                round: 1,
                result: MatchResult {
                    exact: 1,
                    approximate: 2
                }
            }
        );
        assert_eq!(g.step().unwrap(), Phase::Playing { round: 2 });
        g.step().unwrap();
        assert_eq!(g.step().unwrap(), Phase::Won { rounds: 2 });
        assert_eq!(g.step().unwrap(), Phase::Won { rounds: 2 });
        assert!(g.phase().is_terminal());
    }

    #[test]
    fn test_blank_turns_score_as_misses() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let rules = Rules {
            max_rounds: 1,
            ..Rules::default()
        };
        let mut g = game(&gpio, &clock, rules, fixed(&[1, 2, 3]), &[0, 0, 0]);

        assert_eq!(g.run().unwrap(), Outcome::Exhausted { rounds: 1 });
        assert_eq!(g.round().guess, vec![0, 0, 0]);
        assert_eq!(g.round().last_result, Some(MatchResult::default()));
    }

    #[test]
    fn test_leds_start_low_and_feedback_blinks() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let rules = Rules {
            max_rounds: 1,
            ..Rules::default()
        };
        let mut g = game(&gpio, &clock, rules, fixed(&[1, 2, 3]), &[3, 2, 1]);
        gpio.registers().clear_writes();

        g.step().unwrap();
        let writes = gpio.registers().writes();
        assert!(writes.contains(&(regs::GPCLR0, 1 << GREEN)));
        assert!(writes.contains(&(regs::GPCLR0, 1 << RED)));

        gpio.registers().clear_writes();
        g.step().unwrap();
        let green_on = |w: &Vec<(usize, u32)>| w.iter().filter(|x| **x == (regs::GPSET0, 1 << GREEN)).count();
        let red_on = |w: &Vec<(usize, u32)>| w.iter().filter(|x| **x == (regs::GPSET0, 1 << RED)).count();
        // echo of 3 + 2 + 1 presses; one pulse per turn plus two closing blinks
        let writes = gpio.registers().writes();
        assert_eq!(green_on(&writes), 6);
        assert_eq!(red_on(&writes), 5);

        gpio.registers().clear_writes();
        assert_eq!(g.step().unwrap(), Phase::Exhausted { rounds: 1 });
        // exact 1 + approximate 2; separator plus three failure blinks
        let writes = gpio.registers().writes();
        assert_eq!(green_on(&writes), 3);
        assert_eq!(red_on(&writes), 4);
    }

    #[test]
    fn test_seeded_random_secret_is_stable() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let secret = Secret::Random { seed: Some(42) };
        let mut a = game(&gpio, &clock, Rules::default(), secret.clone(), &[]);
        let mut b = game(&gpio, &clock, Rules::default(), secret, &[]);

        let first = a.secret().clone();
        assert_eq!(&first, b.secret());
        assert_eq!(&first, a.secret());
        assert!(first.validate(3, 3, false).is_ok());
    }

    #[test]
    fn test_rejects_bad_setup() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let leds = || {
            Indicators::new(
                &gpio,
                &clock,
                Pin::new(GREEN).unwrap(),
                Pin::new(RED).unwrap(),
                Duration::from_millis(500),
            )
            .unwrap()
        };
        let build = |rules: Rules, secret: Secret| {
            Game::new(
                Hd44780::new(RecordingBus::default()),
                leds(),
                ScriptedPresses::default(),
                &clock,
                rules,
                GameTiming::default(),
                secret,
            )
        };

        assert!(matches!(
            build(Rules::default(), fixed(&[1, 4, 1])),
            Err(Error::InvalidColor { value: 4, .. })
        ));
        assert!(matches!(
            build(Rules::default(), fixed(&[1, 2])),
            Err(Error::SequenceLength { .. })
        ));
        assert!(build(
            Rules {
                max_rounds: 0,
                ..Rules::default()
            },
            Secret::Random { seed: None }
        )
        .is_err());
    }

    #[test]
    fn test_round_timing_on_fake_clock() {
        let gpio = Gpio::new(MemoryRegisters::default());
        let clock = FakeClock::new();
        let mut g = game(&gpio, &clock, Rules::default(), fixed(&[1, 1, 1]), &[1, 1, 1]);

        g.step().unwrap();
        let after_start = clock.now();
        g.step().unwrap();
        // per turn: 2 s pulse, one 1 s blink, 0.5 s gap; then two red blinks
        let expected = Duration::from_millis(3 * (2_000 + 1_000 + 500) + 2_000);
        assert_eq!(clock.now() - after_start, expected);
    }
}
