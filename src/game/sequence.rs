//! Colour sequences
//!
//! Colours are numbered `1..=colors`. A guess may also contain `0`, the
//! value recorded for a turn with no button presses; it never matches a
//! secret colour.

use core::fmt;

use rand::Rng;

use crate::error::{Error, Result};

/// Longest sequence that fits the decimal encoding and the packed result
pub const MAX_LENGTH: u8 = 9;

/// Value recorded for a turn without input
pub const BLANK: u8 = 0;

/// An ordered list of colour values
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sequence(Vec<u8>);

impl Sequence {
    pub fn new(values: Vec<u8>) -> Self {
        Self(values)
    }

    /// Decode a decimal number whose digits are the colours, most
    /// significant digit first; missing leading digits are zero
    ///
    /// `123` with length 3 is `[1, 2, 3]`.
    pub fn from_decimal(value: u32, length: usize) -> Result<Self> {
        let digits = if value == 0 {
            1
        } else {
            value.ilog10() as usize + 1
        };
        if digits > length {
            return Err(Error::SequenceLength {
                expected: length,
                actual: digits,
            });
        }

        let mut values = vec![0u8; length];
        let mut rest = value;
        for slot in values.iter_mut().rev() {
            *slot = (rest % 10) as u8;
            rest /= 10;
        }
        Ok(Self(values))
    }

    /// Random secret with every entry in `1..=colors`
    pub fn random<R: Rng>(rng: &mut R, colors: u8, length: u8) -> Self {
        Self((0..length).map(|_| rng.gen_range(1..=colors)).collect())
    }

    /// Check the length and that every entry is a colour in `1..=colors`
    ///
    /// With `allow_blank`, [`BLANK`] entries are accepted too.
    pub fn validate(&self, colors: u8, length: usize, allow_blank: bool) -> Result<()> {
        if self.0.len() != length {
            return Err(Error::SequenceLength {
                expected: length,
                actual: self.0.len(),
            });
        }
        for (position, &value) in self.0.iter().enumerate() {
            let blank_ok = allow_blank && value == BLANK;
            if !blank_ok && !(1..=colors).contains(&value) {
                return Err(Error::InvalidColor {
                    position,
                    value,
                    colors,
                });
            }
        }
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

impl From<Vec<u8>> for Sequence {
    fn from(values: Vec<u8>) -> Self {
        Self(values)
    }
}
