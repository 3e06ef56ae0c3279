//! HD44780 Character LCD Driver
//!
//! Driver for the Hitachi HD44780U controller found on 16x2 character
//! modules, wired in 4-bit mode.
//!
//! # Initialisation
//!
//! After power-up the controller may be in 8-bit mode or halfway through a
//! 4-bit transfer. The function-set command is therefore forced three times
//! as a single 8-bit nibble before switching to 4-bit mode:
//!
//! ```text
//! Uninitialized -> Forcing8Bit (x3) -> Switching4Bit -> Configured -> Ready
//! ```
//!
//! Every phase is followed by [`timing::PHASE_SETTLE`].

use std::time::Duration;

use crate::display::bus::{LcdBus, RegisterSelect};
use crate::error::{Error, Result};

/// HD44780 instructions (datasheet Table 6)
#[allow(dead_code)]
mod cmd {
    pub const CLEAR: u8 = 0x01;
    pub const HOME: u8 = 0x02;
    pub const ENTRY: u8 = 0x04;
    pub const CTRL: u8 = 0x08;
    pub const CDSHIFT: u8 = 0x10;
    pub const FUNC: u8 = 0x20;
    pub const CGRAM: u8 = 0x40;
    pub const DDRAM: u8 = 0x80;
}

/// Entry mode bits
#[allow(dead_code)]
mod entry {
    pub const SHIFT: u8 = 0x01;
    pub const INCREMENT: u8 = 0x02;
}

/// Display control bits
mod ctrl {
    pub const BLINK: u8 = 0x01;
    pub const CURSOR: u8 = 0x02;
    pub const DISPLAY: u8 = 0x04;
}

/// Function set bits
#[allow(dead_code)]
mod func {
    pub const FONT_5X10: u8 = 0x04;
    pub const TWO_LINES: u8 = 0x08;
    pub const DATA_8BIT: u8 = 0x10;
}

/// Cursor/display shift: move right
const CDSHIFT_RIGHT: u8 = 0x04;

/// DDRAM address of the first cell of each row
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Display dimensions
pub const COLUMNS: u8 = 16;
pub const ROWS: u8 = 2;

/// Settle times required by the controller
pub mod timing {
    use std::time::Duration;

    /// Wait after power-up / pin setup and after each init phase
    pub const PHASE_SETTLE: Duration = Duration::from_millis(35);
    /// Wait after an ordinary instruction
    pub const COMMAND: Duration = Duration::from_millis(2);
    /// Extra wait after clear and home
    pub const CLEAR_HOME: Duration = Duration::from_millis(5);
}

/// Initialisation phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitPhase {
    Uninitialized,
    /// 8-bit function set sent `sent` times so far
    Forcing8Bit { sent: u8 },
    Switching4Bit,
    Configured,
    Ready,
}

/// Geometry and cursor of the display
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayState {
    pub columns: u8,
    pub rows: u8,
    pub cursor_x: u8,
    pub cursor_y: u8,
    pub bus_width: u8,
}

impl DisplayState {
    fn new() -> Self {
        Self {
            columns: COLUMNS,
            rows: ROWS,
            cursor_x: 0,
            cursor_y: 0,
            bus_width: 4,
        }
    }
}

/// HD44780 driver
pub struct Hd44780<B: LcdBus> {
    bus: B,
    state: DisplayState,
    /// Shadow of the display-control register
    control: u8,
    phase: InitPhase,
}

impl<B: LcdBus> Hd44780<B> {
    /// Create an uninitialised driver; call [`Hd44780::init`] before use
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            state: DisplayState::new(),
            control: 0,
            phase: InitPhase::Uninitialized,
        }
    }

    /// Run the power-up sequence through to `Ready`
    pub fn init(&mut self) -> Result<()> {
        while self.phase != InitPhase::Ready {
            self.step()?;
        }
        log::debug!("LCD ready ({}x{}, 4-bit)", self.state.columns, self.state.rows);
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        self.phase = match self.phase {
            InitPhase::Uninitialized => {
                self.bus.delay(timing::PHASE_SETTLE);
                InitPhase::Forcing8Bit { sent: 0 }
            }
            InitPhase::Forcing8Bit { sent } => {
                self.bus
                    .write_nibble(RegisterSelect::Command, (cmd::FUNC | func::DATA_8BIT) >> 4)?;
                self.bus.delay(timing::PHASE_SETTLE);
                if sent + 1 == 3 {
                    InitPhase::Switching4Bit
                } else {
                    InitPhase::Forcing8Bit { sent: sent + 1 }
                }
            }
            InitPhase::Switching4Bit => {
                self.bus.write_nibble(RegisterSelect::Command, cmd::FUNC >> 4)?;
                self.bus.delay(timing::PHASE_SETTLE);

                let mut function = cmd::FUNC;
                if self.state.rows > 1 {
                    function |= func::TWO_LINES;
                }
                self.command(function)?;
                self.bus.delay(timing::PHASE_SETTLE);
                InitPhase::Configured
            }
            InitPhase::Configured => {
                self.control = ctrl::DISPLAY;
                self.command(cmd::CTRL | self.control)?;
                self.clear_unchecked()?;
                self.command(cmd::ENTRY | entry::INCREMENT)?;
                self.command(cmd::CDSHIFT | CDSHIFT_RIGHT)?;
                InitPhase::Ready
            }
            InitPhase::Ready => InitPhase::Ready,
        };
        log::debug!("LCD init phase -> {:?}", self.phase);
        Ok(())
    }

    pub fn phase(&self) -> InitPhase {
        self.phase
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Cursor position as (column, row)
    pub fn cursor(&self) -> (u8, u8) {
        (self.state.cursor_x, self.state.cursor_y)
    }

    /// Shadow value of the display-control register bits
    pub fn control(&self) -> u8 {
        self.control
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.phase != InitPhase::Ready {
            return Err(Error::DisplayNotReady);
        }
        Ok(())
    }

    /// Send a full byte as two nibbles, high nibble first
    fn send_byte(&mut self, rs: RegisterSelect, byte: u8) -> Result<()> {
        self.bus.write_nibble(rs, byte >> 4)?;
        self.bus.write_nibble(rs, byte & 0x0F)
    }

    fn command(&mut self, command: u8) -> Result<()> {
        log::trace!("LCD command {:#04x}", command);
        self.send_byte(RegisterSelect::Command, command)?;
        self.bus.delay(timing::COMMAND);
        Ok(())
    }

    fn address(&self, x: u8, y: u8) -> u8 {
        cmd::DDRAM | (ROW_OFFSETS[y as usize] + x)
    }

    fn clear_unchecked(&mut self) -> Result<()> {
        self.command(cmd::CLEAR)?;
        self.command(cmd::HOME)?;
        self.state.cursor_x = 0;
        self.state.cursor_y = 0;
        self.bus.delay(timing::CLEAR_HOME);
        Ok(())
    }

    /// Blank every cell and move the cursor to (0, 0)
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.clear_unchecked()
    }

    /// Move the cursor to (0, 0) without blanking
    pub fn home(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.command(cmd::HOME)?;
        self.state.cursor_x = 0;
        self.state.cursor_y = 0;
        self.bus.delay(timing::CLEAR_HOME);
        Ok(())
    }

    /// Move the cursor; positions outside the grid are ignored
    pub fn set_position(&mut self, x: u8, y: u8) -> Result<()> {
        self.ensure_ready()?;
        if x >= self.state.columns || y >= self.state.rows {
            return Ok(());
        }
        self.command(self.address(x, y))?;
        self.state.cursor_x = x;
        self.state.cursor_y = y;
        Ok(())
    }

    /// Write one glyph at the cursor and advance it
    ///
    /// Wraps to the start of the next row after the last column, and back
    /// to the top row after the last row. There is no scrolling.
    pub fn put_char(&mut self, byte: u8) -> Result<()> {
        self.ensure_ready()?;
        self.send_byte(RegisterSelect::Data, byte)?;

        self.state.cursor_x += 1;
        if self.state.cursor_x == self.state.columns {
            self.state.cursor_x = 0;
            self.state.cursor_y += 1;
            if self.state.cursor_y == self.state.rows {
                self.state.cursor_y = 0;
            }
            self.command(self.address(self.state.cursor_x, self.state.cursor_y))?;
        }
        Ok(())
    }

    /// Write each byte of `text` in turn
    pub fn put_str(&mut self, text: &str) -> Result<()> {
        text.bytes().try_for_each(|byte| self.put_char(byte))
    }

    fn update_control(&mut self, bit: u8, on: bool) -> Result<()> {
        self.ensure_ready()?;
        if on {
            self.control |= bit;
        } else {
            self.control &= !bit;
        }
        self.command(cmd::CTRL | self.control)
    }

    pub fn set_display(&mut self, on: bool) -> Result<()> {
        self.update_control(ctrl::DISPLAY, on)
    }

    pub fn set_cursor_visible(&mut self, on: bool) -> Result<()> {
        self.update_control(ctrl::CURSOR, on)
    }

    pub fn set_cursor_blink(&mut self, on: bool) -> Result<()> {
        self.update_control(ctrl::BLINK, on)
    }
}
