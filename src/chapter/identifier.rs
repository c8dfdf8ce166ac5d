//! Chapter identifiers: exact decimal numbers or free-form slugs.
//!
//! Sources number sub-chapters fractionally (`85.1`, `85.5`), so numbers are
//! stored as a scaled integer rather than a float. `85.1` parses, prints,
//! steps and pads without ever becoming `85.09999`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Most fractional digits accepted in a chapter number.
const MAX_SCALE: u32 = 9;

/// Most numbers a single range may expand to.
pub const MAX_RANGE_LEN: u64 = 100_000;

/// Errors raised while parsing identifiers or expanding a selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Not a non-negative decimal number.
    #[error("invalid chapter number '{input}': expected a non-negative decimal like 12 or 85.5")]
    InvalidNumber {
        /// The rejected text.
        input: String,
    },

    /// The number does not fit the internal representation.
    #[error("chapter number '{input}' is out of range")]
    Overflow {
        /// The rejected text.
        input: String,
    },

    /// A range step of zero would never terminate.
    #[error("chapter step must be greater than zero")]
    ZeroStep,

    /// The range start lies after its end.
    #[error("chapter range start {start} is after end {end}")]
    StartAfterEnd {
        /// Configured start.
        start: ChapterNumber,
        /// Configured end.
        end: ChapterNumber,
    },

    /// The range expands to more chapters than [`MAX_RANGE_LEN`].
    #[error("chapter range {start}..={end} step {step} expands to {count} chapters (at most {max} allowed)")]
    RangeTooLarge {
        /// Configured start.
        start: ChapterNumber,
        /// Configured end.
        end: ChapterNumber,
        /// Configured step.
        step: ChapterNumber,
        /// Numbers the range would produce.
        count: u64,
        /// The limit.
        max: u64,
    },

    /// Slug mode was selected with an empty or blank slug.
    #[error("chapter slug list contains a blank entry")]
    BlankSlug,
}

/// Exact non-negative decimal: `units / 10^scale`, kept with no trailing
/// fractional zeros so equal values compare equal structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawChapterNumber")]
pub struct ChapterNumber {
    units: u64,
    scale: u32,
}

impl ChapterNumber {
    /// Builds a whole chapter number.
    #[must_use]
    pub fn whole(n: u64) -> Self {
        Self { units: n, scale: 0 }
    }

    fn normalized(mut units: u64, mut scale: u32) -> Self {
        while scale > 0 && units % 10 == 0 {
            units /= 10;
            scale -= 1;
        }
        Self { units, scale }
    }

    /// Integer part (`85` for `85.1`).
    #[must_use]
    pub fn integer_part(&self) -> u64 {
        self.units / 10u64.pow(self.scale)
    }

    /// Fractional digits without the dot (`"1"` for `85.1`), empty for whole numbers.
    #[must_use]
    pub fn fraction_digits(&self) -> String {
        if self.scale == 0 {
            return String::new();
        }
        let frac = self.units % 10u64.pow(self.scale);
        format!("{frac:0width$}", width = self.scale as usize)
    }

    /// True when there is no fractional part.
    #[must_use]
    pub fn is_whole(&self) -> bool {
        self.scale == 0
    }

    /// Renders with the integer part zero-padded to `width` (`5.5` at
    /// width 3 is `005.5`). Width 0 means no padding.
    #[must_use]
    pub fn padded(&self, width: usize) -> String {
        let int = format!("{:0width$}", self.integer_part());
        if self.scale == 0 {
            int
        } else {
            format!("{int}.{}", self.fraction_digits())
        }
    }

    fn units_at(&self, scale: u32) -> Option<u64> {
        self.units.checked_mul(10u64.checked_pow(scale - self.scale)?)
    }

    /// Every number `start, start + step, ...` not exceeding `end`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::ZeroStep`] or
    /// [`IdentifierError::StartAfterEnd`] for unusable ranges,
    /// [`IdentifierError::RangeTooLarge`] past [`MAX_RANGE_LEN`] numbers, and
    /// [`IdentifierError::Overflow`] if the aligned values don't fit.
    pub fn range_inclusive(
        start: Self,
        end: Self,
        step: Self,
    ) -> Result<Vec<Self>, IdentifierError> {
        if step.units == 0 {
            return Err(IdentifierError::ZeroStep);
        }
        if start > end {
            return Err(IdentifierError::StartAfterEnd { start, end });
        }

        let scale = start.scale.max(end.scale).max(step.scale);
        let overflow = || IdentifierError::Overflow {
            input: format!("{start}..={end} step {step}"),
        };
        let first = start.units_at(scale).ok_or_else(overflow)?;
        let last = end.units_at(scale).ok_or_else(overflow)?;
        let stride = step.units_at(scale).ok_or_else(overflow)?;

        let count = (last - first) / stride + 1;
        if count > MAX_RANGE_LEN {
            return Err(IdentifierError::RangeTooLarge {
                start,
                end,
                step,
                count,
                max: MAX_RANGE_LEN,
            });
        }

        let mut numbers = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
        let mut current = first;
        while current <= last {
            numbers.push(Self::normalized(current, scale));
            match current.checked_add(stride) {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(numbers)
    }
}

impl Ord for ChapterNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        let lhs = u128::from(self.units) * 10u128.pow(scale - self.scale);
        let rhs = u128::from(other.units) * 10u128.pow(scale - other.scale);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for ChapterNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ChapterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.padded(0))
    }
}

impl FromStr for ChapterNumber {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = || IdentifierError::InvalidNumber {
            input: s.to_string(),
        };
        let overflow = || IdentifierError::Overflow {
            input: s.to_string(),
        };

        let (int, frac) = match input.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (input, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if int.is_empty() || !all_digits(int) || !all_digits(frac) {
            return Err(invalid());
        }
        if input.ends_with('.') {
            return Err(invalid());
        }

        let scale = u32::try_from(frac.len()).map_err(|_| overflow())?;
        if scale > MAX_SCALE {
            return Err(overflow());
        }

        let mut units: u64 = 0;
        for digit in int.bytes().chain(frac.bytes()) {
            units = units
                .checked_mul(10)
                .and_then(|u| u.checked_add(u64::from(digit - b'0')))
                .ok_or_else(overflow)?;
        }
        Ok(Self::normalized(units, scale))
    }
}

/// Profile values may be written as `12`, `85.5` or `"85.5"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawChapterNumber {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl TryFrom<RawChapterNumber> for ChapterNumber {
    type Error = IdentifierError;

    fn try_from(raw: RawChapterNumber) -> Result<Self, Self::Error> {
        match raw {
            RawChapterNumber::Integer(n) => Ok(Self::whole(n)),
            // Shortest round-trip formatting: 85.1 prints as "85.1".
            RawChapterNumber::Float(f) => f.to_string().parse(),
            RawChapterNumber::Text(s) => s.parse(),
        }
    }
}

/// What a chapter is addressed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChapterIdentifier {
    /// Ordinal, possibly fractional.
    Number(ChapterNumber),
    /// Free-form path segment.
    Slug(String),
}

impl ChapterIdentifier {
    /// True for slug identifiers.
    #[must_use]
    pub fn is_slug(&self) -> bool {
        matches!(self, Self::Slug(_))
    }
}

impl fmt::Display for ChapterIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => n.fmt(f),
            Self::Slug(s) => f.write_str(s),
        }
    }
}

/// The set of chapters a run visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterSelection {
    /// Inclusive numeric range.
    Range {
        /// First chapter.
        start: ChapterNumber,
        /// Last chapter (inclusive).
        end: ChapterNumber,
        /// Distance between consecutive chapters.
        step: ChapterNumber,
    },
    /// Explicit slugs in visiting order.
    Slugs(Vec<String>),
}

impl ChapterSelection {
    /// Expands the selection into identifiers in visiting order.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentifierError`] for an unusable range or a blank slug.
    pub fn identifiers(&self) -> Result<Vec<ChapterIdentifier>, IdentifierError> {
        match self {
            Self::Range { start, end, step } => Ok(ChapterNumber::range_inclusive(
                *start, *end, *step,
            )?
            .into_iter()
            .map(ChapterIdentifier::Number)
            .collect()),
            Self::Slugs(slugs) => slugs
                .iter()
                .map(|slug| {
                    let slug = slug.trim();
                    if slug.is_empty() {
                        Err(IdentifierError::BlankSlug)
                    } else {
                        Ok(ChapterIdentifier::Slug(slug.to_string()))
                    }
                })
                .collect(),
        }
    }

    /// True in slug-list mode.
    #[must_use]
    pub fn is_slug_mode(&self) -> bool {
        matches!(self, Self::Slugs(_))
    }
}
