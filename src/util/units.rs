//! Byte quantities with unit suffixes
//!
//! Sizes on the command line are written as a decimal number with an optional
//! binary unit suffix (`4K`, `100M`, `2G`, `1T`). [`ByteUnits`] parses those
//! strings without silently truncating values that would overflow 64 bits, and
//! formats byte counts back into the largest unit that loses no precision.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Ordered unit table: suffix letter and the left shift it applies.
const UNIT_SHIFTS: [(char, u32); 4] = [('k', 10), ('m', 20), ('g', 30), ('t', 40)];

/// Unit names for formatting, one per 1024 step.
const UNIT_NAMES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Error parsing a size string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SizeParseError {
    #[error("empty size string")]
    Empty,

    #[error("size must start with a decimal number")]
    MissingDigits,

    #[error("invalid numeric value: {0}")]
    Number(#[from] std::num::ParseIntError),

    #[error("unknown unit suffix {0:?}")]
    UnknownUnit(char),

    #[error("trailing characters after unit: {0:?}")]
    Trailing(String),

    #[error("{value}{unit} does not fit in 64 bits")]
    Overflow { value: u64, unit: char },
}

/// A non-negative byte count
///
/// The wrapped value is always the fully expanded number of bytes; unit
/// suffixes exist only at the parse/format boundary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ByteUnits(pub u64);

impl ByteUnits {
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ByteUnits {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl From<ByteUnits> for u64 {
    fn from(units: ByteUnits) -> Self {
        units.0
    }
}

impl FromStr for ByteUnits {
    type Err = SizeParseError;

    /// Parse a decimal byte count with an optional K/M/G/T suffix
    /// (case-insensitive, each a factor of 1024). A trailing `B` and a single
    /// space before the unit are tolerated, so formatter output (`"4 KB"`)
    /// parses back to the same value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SizeParseError::Empty);
        }

        let digits_end = s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len());
        if digits_end == 0 {
            return Err(SizeParseError::MissingDigits);
        }
        let value: u64 = s[..digits_end].parse()?;

        let suffix = s[digits_end..].trim_start();
        let mut chars = suffix.chars();
        let shift = match chars.next() {
            None => 0,
            Some(c) => {
                let rest = chars.as_str();
                if let Some(&(_, shift)) = UNIT_SHIFTS
                    .iter()
                    .find(|(letter, _)| c.eq_ignore_ascii_case(letter))
                {
                    if !(rest.is_empty() || rest.eq_ignore_ascii_case("b")) {
                        return Err(SizeParseError::Trailing(rest.to_string()));
                    }
                    shift
                } else if c.eq_ignore_ascii_case(&'b') && rest.is_empty() {
                    0
                } else {
                    return Err(SizeParseError::UnknownUnit(c));
                }
            }
        };

        // Overflow is a precondition of the shift, not something detected
        // after the high bits are already gone.
        if shift > 0 && value >> (64 - shift) != 0 {
            let unit = suffix.chars().next().unwrap_or('?');
            return Err(SizeParseError::Overflow { value, unit });
        }

        Ok(ByteUnits(value << shift))
    }
}

impl fmt::Display for ByteUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut v = self.0;
        let mut unit = 0;
        while v >= 1024 && unit + 1 < UNIT_NAMES.len() {
            // preserve significant bytes
            if v < (1 << 20) && v % 1024 != 0 {
                break;
            }
            v >>= 10;
            unit += 1;
        }
        write!(f, "{} {}", v, UNIT_NAMES[unit])
    }
}
