//! Month pointers and inclusive month ranges.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ValidationError};

/// A (year, 0-based month) pair.
///
/// Ordering follows the linear index `year * 12 + month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthPointer {
    pub year: i32,
    /// 0-based: January is 0, December is 11.
    pub month: i32,
}

impl MonthPointer {
    /// Build a pointer, rejecting months outside `0..=11`.
    pub fn new(year: i32, month: i32) -> Result<Self, ValidationError> {
        let pointer = Self { year, month };
        if pointer.is_valid() {
            Ok(pointer)
        } else {
            Err(ValidationError::MonthOutOfRange { year, month })
        }
    }

    pub fn is_valid(&self) -> bool {
        (0..=11).contains(&self.month)
    }

    pub fn linear_index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month)
    }

    /// The following month, rolling December over into January.
    ///
    /// `None` past December of `i32::MAX`.
    pub fn next(self) -> Option<Self> {
        if self.month >= 11 {
            Some(Self {
                year: self.year.checked_add(1)?,
                month: 0,
            })
        } else {
            Some(Self {
                year: self.year,
                month: self.month + 1,
            })
        }
    }

    pub fn first_day(&self) -> Result<NaiveDate, ValidationError> {
        let month = u32::try_from(self.month + 1).map_err(|_| ValidationError::MonthOutOfRange {
            year: self.year,
            month: self.month,
        })?;
        NaiveDate::from_ymd_opt(self.year, month, 1).ok_or(ValidationError::YearOutOfRange(self.year))
    }

    pub fn last_day(&self) -> Result<NaiveDate, ValidationError> {
        let next = self
            .next()
            .ok_or(ValidationError::YearOutOfRange(self.year))?
            .first_day()?;
        next.pred_opt().ok_or(ValidationError::YearOutOfRange(self.year))
    }

    /// The pointer containing `date`.
    pub fn of_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0() as i32,
        }
    }
}

impl Ord for MonthPointer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.linear_index().cmp(&other.linear_index())
    }
}

impl PartialOrd for MonthPointer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Token form `"{year}-{month}"`, used for picker option values.
impl fmt::Display for MonthPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

impl FromStr for MonthPointer {
    type Err = ParseError;

    /// Parses a `"{year}-{month}"` token. Only the numeric shape is checked;
    /// month bounds are left to `is_valid`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseError::MonthToken(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(malformed)?;
        let year = year.trim().parse::<i32>().map_err(|_| malformed())?;
        let month = month.trim().parse::<i32>().map_err(|_| malformed())?;
        Ok(Self { year, month })
    }
}

/// Inclusive interval of months defining the visible calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthRange {
    pub start: MonthPointer,
    pub end: MonthPointer,
}

impl MonthRange {
    pub fn new(start: MonthPointer, end: MonthPointer) -> Self {
        Self { start, end }
    }

    /// January through December of `year`.
    pub fn whole_year(year: i32) -> Self {
        Self {
            start: MonthPointer { year, month: 0 },
            end: MonthPointer { year, month: 11 },
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_valid() && self.end.is_valid()
    }

    /// Swaps the ends when `start` is strictly after `end`.
    pub fn normalize(&self) -> Self {
        if self.start > self.end {
            Self {
                start: self.end,
                end: self.start,
            }
        } else {
            *self
        }
    }

    /// Number of months covered after normalization.
    pub fn len(&self) -> usize {
        let range = self.normalize();
        (range.end.linear_index() - range.start.linear_index() + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, pointer: MonthPointer) -> bool {
        let range = self.normalize();
        range.start <= pointer && pointer <= range.end
    }

    /// Every month of the normalized range, in order. Each call starts over.
    pub fn months(&self) -> Months {
        let range = self.normalize();
        Months {
            next: range.start,
            remaining: self.len(),
        }
    }

    /// Day-level `[first day of start month, last day of end month]`.
    pub fn to_date_interval(&self) -> Result<DateInterval, ValidationError> {
        let range = self.normalize();
        Ok(DateInterval {
            start: range.start.first_day()?,
            end: range.end.last_day()?,
        })
    }

    /// Picker shortcut for a new start month.
    ///
    /// A January start selects the whole year. A start after the current end
    /// pulls the end along.
    pub fn with_start(&self, start: MonthPointer) -> Self {
        if start.month == 0 {
            return Self {
                start,
                end: MonthPointer {
                    year: start.year,
                    month: 11,
                },
            };
        }
        let end = if start > self.end { start } else { self.end };
        Self { start, end }
    }

    /// Picker shortcut for a new end month; an end before the current start
    /// pulls the start along.
    pub fn with_end(&self, end: MonthPointer) -> Self {
        let start = if end < self.start { end } else { self.start };
        Self { start, end }
    }
}

/// Iterator returned by [`MonthRange::months`].
#[derive(Debug, Clone)]
pub struct Months {
    next: MonthPointer,
    remaining: usize,
}

impl Iterator for Months {
    type Item = MonthPointer;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.remaining -= 1;
        if self.remaining > 0 {
            // current is still below the range end
            self.next = current.next()?;
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Months {}

/// Concrete day interval, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateInterval {
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |day| *day <= self.end)
    }

    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}
