//! MasterMind on a Raspberry Pi
//!
//! # Usage
//!
//! ```bash
//! # Play with a random secret (needs root for /dev/mem)
//! sudo master-mind play
//!
//! # Play against a known secret, with debug logging
//! sudo master-mind -v play --secret 123
//!
//! # Score two sequences without touching the hardware
//! master-mind check 123 321
//!
//! # Write the default configuration, edit it, then use it
//! master-mind config -o mastermind.toml
//! sudo master-mind --config mastermind.toml play
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use mastermind_pi::game::{count_matches, Secret, Sequence};
use mastermind_pi::GameConfig;

/// MasterMind
///
/// Code-breaking game with button input, LEDs and an LCD
#[derive(Parser)]
#[command(name = "master-mind")]
#[command(author = "Prasanna Gautam")]
#[command(version = "0.1.0")]
#[command(about = "MasterMind for Raspberry Pi GPIO hardware")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a game on the attached hardware
    Play {
        /// Secret as decimal digits, e.g. 123 (random if omitted)
        #[arg(short, long)]
        secret: Option<u32>,

        /// Seed for the random secret
        #[arg(long, conflicts_with = "secret")]
        seed: Option<u64>,
    },

    /// Score a guess against a secret and exit
    Check {
        /// Secret as decimal digits
        secret: u32,

        /// Guess as decimal digits
        guess: u32,
    },

    /// Print the default configuration as TOML
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let config = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => GameConfig::default(),
    };

    match cli.command {
        Commands::Play { secret, seed } => handle_play(&config, secret, seed),
        Commands::Check { secret, guess } => handle_check(&config, secret, guess),
        Commands::Config { output } => handle_config(output),
    }
}

fn handle_check(config: &GameConfig, secret: u32, guess: u32) -> Result<()> {
    let length = config.rules().length as usize;
    let secret = Sequence::from_decimal(secret, length).context("Invalid secret")?;
    let guess = Sequence::from_decimal(guess, length).context("Invalid guess")?;

    let result = count_matches(&secret, &guess);
    println!(
        "{} Secret: {}  Guess: {}",
        "[*]".cyan().bold(),
        secret.to_string().white(),
        guess.to_string().white()
    );
    println!("{} exact", result.exact.to_string().green().bold());
    println!("{} approximate", result.approximate.to_string().yellow().bold());
    log::debug!("packed result {:#04x}", result.code());
    Ok(())
}

fn handle_config(output: Option<PathBuf>) -> Result<()> {
    let text = GameConfig::default().to_toml()?;
    match output {
        Some(path) => {
            std::fs::write(&path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Configuration written to: {}",
                "[OK]".green().bold(),
                path.display()
            );
        }
        None => print!("{}", text),
    }
    Ok(())
}

#[cfg(unix)]
fn handle_play(config: &GameConfig, secret: Option<u32>, seed: Option<u64>) -> Result<()> {
    use mastermind_pi::display::{GpioLcdBus, Hd44780};
    use mastermind_pi::game::{Game, Indicators, Outcome};
    use mastermind_pi::hal::{Gpio, MmapRegisters, Pin, SystemClock};
    use mastermind_pi::input::{GpioButton, PressSampler};

    // SAFETY: geteuid has no preconditions
    if unsafe { libc::geteuid() } != 0 {
        eprintln!(
            "{} Not running as root; mapping /dev/mem will probably fail",
            "[WARN]".yellow().bold()
        );
    }

    let rules = config.rules();
    let source = match secret {
        Some(value) => Secret::Fixed(
            Sequence::from_decimal(value, rules.length as usize).context("Invalid --secret")?,
        ),
        None => Secret::Random { seed },
    };

    println!(
        "{} Mapping GPIO registers at {:#010x}",
        "[*]".cyan().bold(),
        config.gpio.base
    );
    let regs = MmapRegisters::map(config.gpio.base, config.gpio.block_size)
        .context("Failed to map GPIO registers (try sudo)")?;
    let gpio = Gpio::new(regs);
    let clock = SystemClock::new();
    let wiring = &config.wiring;

    let bus = GpioLcdBus::new(&gpio, &clock, wiring.lcd_pins()?)
        .context("Failed to configure LCD pins")?;
    let leds = Indicators::new(
        &gpio,
        &clock,
        Pin::new(wiring.green_led)?,
        Pin::new(wiring.red_led)?,
        config.blink_half_period(),
    )
    .context("Failed to configure LED pins")?;
    let button = GpioButton::new(&gpio, Pin::new(wiring.button)?, wiring.button_active_level())
        .context("Failed to configure button pin")?;
    let sampler = PressSampler::new(button, &clock, config.sampler_timing());

    let mut game = Game::new(
        Hd44780::new(bus),
        leds,
        sampler,
        &clock,
        rules,
        config.game_timing(),
        source,
    )?;

    println!(
        "{} {} colours, {} positions, {} rounds. Press the button once per colour value.",
        "[*]".cyan().bold(),
        rules.colors,
        rules.length,
        rules.max_rounds
    );

    match game.run()? {
        Outcome::Won { rounds } => {
            println!("{} Solved in {} rounds", "[OK]".green().bold(), rounds);
        }
        Outcome::Exhausted { rounds } => {
            let secret = game.secret().to_string();
            println!(
                "{} No match after {} rounds; the secret was {}",
                "[FAIL]".red().bold(),
                rounds,
                secret.white()
            );
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn handle_play(_config: &GameConfig, _secret: Option<u32>, _seed: Option<u64>) -> Result<()> {
    anyhow::bail!("GPIO access through /dev/mem is only available on unix")
}
