//! Multipart chunk size, as typed on the command line.
//!
//! A size is a decimal byte count with an optional binary unit suffix:
//! `KB` (2^10), `MB` (2^20), `GB` (2^30) or `TB` (2^40). Formatting picks
//! the largest unit that divides the value evenly.
//!
//! ```
//! use chunketag::ChunkSize;
//!
//! let size: ChunkSize = "16MB".parse().unwrap();
//! assert_eq!(size.get(), 16 * 1024 * 1024);
//! assert_eq!(size.to_string(), "16MB");
//! assert_eq!("1536".parse::<ChunkSize>().unwrap().to_string(), "1536");
//! ```

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use crate::error::ChunkSizeError;

/// Suffixes with their shift, largest first.
const UNITS: [(&str, u32); 4] = [("TB", 40), ("GB", 30), ("MB", 20), ("KB", 10)];

/// Exclusive upper bound: sizes must fit a signed 64-bit byte count.
const LIMIT: u64 = 1 << 63;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ChunkSize(NonZeroU64);

impl ChunkSize {
    /// 8 MiB, the usual multipart threshold and part size of S3 clients.
    pub const DEFAULT: ChunkSize = match NonZeroU64::new(8 * 1024 * 1024) {
        Some(size) => ChunkSize(size),
        None => unreachable!(),
    };

    /// Returns `None` for zero or for values that do not fit in an `i64`.
    #[inline]
    pub fn new(bytes: u64) -> Option<Self> {
        if bytes >= LIMIT {
            return None;
        }
        NonZeroU64::new(bytes).map(ChunkSize)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl Default for ChunkSize {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<ChunkSize> for u64 {
    #[inline]
    fn from(size: ChunkSize) -> Self {
        size.get()
    }
}

impl TryFrom<u64> for ChunkSize {
    type Error = ChunkSizeError;

    fn try_from(bytes: u64) -> Result<Self, Self::Error> {
        if bytes == 0 {
            return Err(ChunkSizeError::NonPositive);
        }
        Self::new(bytes).ok_or_else(|| ChunkSizeError::OutOfRange(bytes.to_string()))
    }
}

impl FromStr for ChunkSize {
    type Err = ChunkSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, scale) = UNITS
            .iter()
            .find_map(|&(suffix, scale)| s.strip_suffix(suffix).map(|rest| (rest, scale)))
            .unwrap_or((s, 0));

        // `u64::from_str` would also take a leading `+`.
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ChunkSizeError::Invalid(s.to_owned()));
        }

        // Only overflow is left once the text is all digits.
        let mantissa: u64 = digits
            .parse()
            .map_err(|_| ChunkSizeError::OutOfRange(s.to_owned()))?;
        if mantissa >> (63 - scale) != 0 {
            return Err(ChunkSizeError::OutOfRange(s.to_owned()));
        }

        Self::new(mantissa << scale).ok_or(ChunkSizeError::NonPositive)
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.get();
        for (suffix, scale) in UNITS {
            if bytes % (1 << scale) == 0 {
                return write!(f, "{}{}", bytes >> scale, suffix);
            }
        }
        write!(f, "{bytes}")
    }
}
