//! Timeframe expressions — `YYYY`, `YYYY/MM`, `YYYY/MM/DD`, or the `-`
//! wildcard that matches any date.
//!
//! Matching is monotone: a full-date timeframe's match set is a subset of the
//! year/month timeframe built from its leading components, which is in turn a
//! subset of the bare year's.

use super::error::Error;
use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Years outside this range are almost certainly typos, not data.
const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2200;

/// The wildcard token accepted by `parse`.
pub const WILDCARD: &str = "-";

/// A parsed timeframe expression. Immutable once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    /// Any date whatsoever.
    Any,
    /// Any date in the given year.
    Year(i32),
    /// Any date in the given year and month.
    Month(i32, u32),
    /// Exactly one date.
    Day(NaiveDate),
}

impl Timeframe {
    /// Parse an expression. `-` separators inside a dated expression are
    /// normalized to `/`, so `2026-02-20` and `2026/02/20` are equivalent.
    pub fn parse(value: &str) -> Result<Timeframe, Error> {
        let cleaned = value.trim();
        if cleaned.is_empty() {
            return Err(Error::InvalidTimeframe {
                segment: String::new(),
                reason: "timeframe must be non-empty".to_string(),
            });
        }
        if cleaned == WILDCARD {
            return Ok(Timeframe::Any);
        }

        let normalized = cleaned.replace('-', "/");
        let parts: Vec<&str> = normalized.split('/').collect();
        if parts.len() > 3 {
            return Err(Error::InvalidTimeframe {
                segment: cleaned.to_string(),
                reason: "must be YYYY, YYYY/MM, or YYYY/MM/DD".to_string(),
            });
        }

        let year: i32 = parts[0].parse().map_err(|_| Error::InvalidTimeframe {
            segment: parts[0].to_string(),
            reason: "year must be numeric".to_string(),
        })?;
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(Error::InvalidTimeframe {
                segment: parts[0].to_string(),
                reason: format!("year must be in range {}-{}", MIN_YEAR, MAX_YEAR),
            });
        }
        if parts.len() == 1 {
            return Ok(Timeframe::Year(year));
        }

        let month: u32 = parts[1].parse().map_err(|_| Error::InvalidTimeframe {
            segment: parts[1].to_string(),
            reason: "month must be numeric".to_string(),
        })?;
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidTimeframe {
                segment: parts[1].to_string(),
                reason: "month must be in range 01-12".to_string(),
            });
        }
        if parts.len() == 2 {
            return Ok(Timeframe::Month(year, month));
        }

        let day: u32 = parts[2].parse().map_err(|_| Error::InvalidTimeframe {
            segment: parts[2].to_string(),
            reason: "day must be numeric".to_string(),
        })?;
        match NaiveDate::from_ymd_opt(year, month, day) {
            Some(date) => Ok(Timeframe::Day(date)),
            None => Err(Error::InvalidTimeframe {
                segment: parts[2].to_string(),
                reason: format!("not a valid day for {:04}/{:02}", year, month),
            }),
        }
    }

    /// Does `date` fall inside this timeframe?
    pub fn matches(&self, date: NaiveDate) -> bool {
        match *self {
            Timeframe::Any => true,
            Timeframe::Year(y) => date.year() == y,
            Timeframe::Month(y, m) => date.year() == y && date.month() == m,
            Timeframe::Day(d) => date == d,
        }
    }

    /// The earliest date this timeframe could match. `None` for the
    /// wildcard (unbounded below).
    pub fn earliest(&self) -> Option<NaiveDate> {
        match *self {
            Timeframe::Any => None,
            Timeframe::Year(y) => NaiveDate::from_ymd_opt(y, 1, 1),
            Timeframe::Month(y, m) => NaiveDate::from_ymd_opt(y, m, 1),
            Timeframe::Day(d) => Some(d),
        }
    }

    /// The latest date this timeframe could match. `None` for the wildcard
    /// (unbounded above).
    pub fn latest(&self) -> Option<NaiveDate> {
        match *self {
            Timeframe::Any => None,
            Timeframe::Year(y) => NaiveDate::from_ymd_opt(y, 12, 31),
            Timeframe::Month(y, m) => {
                // Last day of month: day before the first of the next month.
                let first_of_next = if m == 12 {
                    NaiveDate::from_ymd_opt(y + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(y, m + 1, 1)
                };
                first_of_next.and_then(|d| d.pred_opt())
            }
            Timeframe::Day(d) => Some(d),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Timeframe::Any => write!(f, "{}", WILDCARD),
            Timeframe::Year(y) => write!(f, "{:04}", y),
            Timeframe::Month(y, m) => write!(f, "{:04}/{:02}", y, m),
            Timeframe::Day(d) => write!(f, "{:04}/{:02}/{:02}", d.year(), d.month(), d.day()),
        }
    }
}
