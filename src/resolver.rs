//! Date-range expression parsing and series resolution
//!
//! Turns a user-supplied date expression plus a series listing into the ordered
//! list of [`ResolutionTuple`]s to download.
//!
//! # Grammar
//!
//! | Expression            | Selects                                          |
//! |-----------------------|--------------------------------------------------|
//! | *(absent or empty)*   | the most recent member                           |
//! | `latest`              | the most recent member                           |
//! | `sample`              | the dataset's sample export (no listing needed)  |
//! | `2020-01-03` / `20200103` | the member for that date                     |
//! | `start:end`           | all members in the closed interval               |
//! | `start:` / `:end` / `:` | open-ended intervals                           |
//!
//! # Examples
//!
//! ```
//! use catalog_data_downloader::resolver::{resolve, DateExpr};
//! use catalog_data_downloader::{DistributionFormat, SeriesMember};
//!
//! let members: Vec<SeriesMember> = ["2020-01-01", "2020-01-02", "2020-01-03"]
//!     .iter()
//!     .map(|d| SeriesMember::new(*d, "FX", "common"))
//!     .collect();
//!
//! let expr = DateExpr::parse(Some("20200102:")).unwrap();
//! let tuples = resolve(&members, &expr, "common", "FX", &DistributionFormat::Csv).unwrap();
//! assert_eq!(tuples.len(), 2);
//! assert_eq!(tuples[0].series_id(), "2020-01-02");
//! ```

use crate::{DistributionFormat, ResolutionTuple, SeriesMember, SeriesRef, SAMPLE_SERIES_ID};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const LATEST_KEYWORD: &str = "latest";
const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised while resolving a date expression
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Input could not be interpreted as a date
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Range bounds are reversed
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange {
        /// Normalized start bound
        start: String,
        /// Normalized end bound
        end: String,
    },

    /// The listing is empty but the expression needs at least one member
    #[error("no series members available for {catalog}/{dataset}")]
    EmptySeries {
        /// Catalog identifier
        catalog: String,
        /// Dataset identifier
        dataset: String,
    },

    /// The listing is non-empty but nothing matches the expression
    #[error("no series members match '{0}'")]
    NoMatchingSeries(String),
}

/// Parsed date-range expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateExpr {
    /// Most recent member
    Latest,
    /// Sample export of the dataset
    Sample,
    /// Exactly one date (normalized)
    Single(String),
    /// Closed interval; `None` bounds are open
    Range {
        /// Normalized inclusive lower bound
        start: Option<String>,
        /// Normalized inclusive upper bound
        end: Option<String>,
    },
}

impl DateExpr {
    /// Parse an optional expression; `None` and blank input mean [`DateExpr::Latest`]
    pub fn parse(expr: Option<&str>) -> Result<Self, ResolveError> {
        let expr = match expr.map(str::trim) {
            None | Some("") => return Ok(DateExpr::Latest),
            Some(s) => s,
        };

        if expr.eq_ignore_ascii_case(LATEST_KEYWORD) {
            return Ok(DateExpr::Latest);
        }
        if expr.eq_ignore_ascii_case(SAMPLE_SERIES_ID) {
            return Ok(DateExpr::Sample);
        }

        // A bare ISO datetime contains colons, so try the whole token first
        if let Ok(date) = normalize_date(expr) {
            return Ok(DateExpr::Single(date));
        }

        match expr.split_once(':') {
            Some((start, end)) => {
                let start = normalize_bound(start)?;
                let end = normalize_bound(end)?;
                if let (Some(s), Some(e)) = (&start, &end) {
                    if s > e {
                        return Err(ResolveError::InvalidRange {
                            start: s.clone(),
                            end: e.clone(),
                        });
                    }
                }
                Ok(DateExpr::Range { start, end })
            }
            None => Err(ResolveError::InvalidDate(expr.to_string())),
        }
    }

    /// Whether resolving this expression needs a series listing
    pub fn needs_listing(&self) -> bool {
        !matches!(self, DateExpr::Sample)
    }

    fn matches(&self, key: &str) -> bool {
        match self {
            DateExpr::Latest | DateExpr::Sample => false,
            DateExpr::Single(date) => key == date,
            DateExpr::Range { start, end } => {
                start.as_deref().map_or(true, |s| key >= s)
                    && end.as_deref().map_or(true, |e| key <= e)
            }
        }
    }
}

impl FromStr for DateExpr {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateExpr::parse(Some(s))
    }
}

impl fmt::Display for DateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateExpr::Latest => f.write_str(LATEST_KEYWORD),
            DateExpr::Sample => f.write_str(SAMPLE_SERIES_ID),
            DateExpr::Single(date) => f.write_str(date),
            DateExpr::Range { start, end } => write!(
                f,
                "{}:{}",
                start.as_deref().unwrap_or(""),
                end.as_deref().unwrap_or("")
            ),
        }
    }
}

fn normalize_bound(bound: &str) -> Result<Option<String>, ResolveError> {
    let bound = bound.trim();
    if bound.is_empty() {
        Ok(None)
    } else {
        normalize_date(bound).map(Some)
    }
}

/// Values that can be canonicalized to a `YYYY-MM-DD` date string
pub trait DateLike {
    /// Convert to a calendar date
    fn to_naive_date(&self) -> Result<NaiveDate, ResolveError>;
}

impl DateLike for str {
    fn to_naive_date(&self) -> Result<NaiveDate, ResolveError> {
        let input = self.trim();
        let invalid = || ResolveError::InvalidDate(input.to_string());

        if input.len() == 8 && input.bytes().all(|b| b.is_ascii_digit()) {
            return NaiveDate::parse_from_str(input, "%Y%m%d").map_err(|_| invalid());
        }

        if let Ok(date) = NaiveDate::parse_from_str(input, CANONICAL_DATE_FORMAT) {
            return Ok(date);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(dt.date_naive());
        }

        for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(input, pattern) {
                return Ok(dt.date());
            }
        }

        Err(invalid())
    }
}

impl DateLike for String {
    fn to_naive_date(&self) -> Result<NaiveDate, ResolveError> {
        self.as_str().to_naive_date()
    }
}

impl DateLike for i64 {
    fn to_naive_date(&self) -> Result<NaiveDate, ResolveError> {
        if !(10_000_101..=99_991_231).contains(self) {
            return Err(ResolveError::InvalidDate(self.to_string()));
        }
        self.to_string().to_naive_date()
    }
}

impl DateLike for u32 {
    fn to_naive_date(&self) -> Result<NaiveDate, ResolveError> {
        i64::from(*self).to_naive_date()
    }
}

impl DateLike for NaiveDate {
    fn to_naive_date(&self) -> Result<NaiveDate, ResolveError> {
        Ok(*self)
    }
}

impl DateLike for NaiveDateTime {
    fn to_naive_date(&self) -> Result<NaiveDate, ResolveError> {
        Ok(self.date())
    }
}

impl<Tz: TimeZone> DateLike for DateTime<Tz> {
    fn to_naive_date(&self) -> Result<NaiveDate, ResolveError> {
        Ok(self.date_naive())
    }
}

/// Canonicalize a date-like value to `YYYY-MM-DD`
///
/// Accepts 8-digit numbers (`20201212`), 8-digit or hyphenated strings, ISO
/// datetime strings and chrono date/datetime values.
pub fn normalize_date<D: DateLike + ?Sized>(value: &D) -> Result<String, ResolveError> {
    value
        .to_naive_date()
        .map(|date| date.format(CANONICAL_DATE_FORMAT).to_string())
}

/// Sort key of a member: its normalized date, or the raw identifier if it is not a date
fn member_key(member: &SeriesMember) -> String {
    normalize_date(member.identifier.as_str()).unwrap_or_else(|_| member.identifier.clone())
}

/// Resolve an expression against a series listing
///
/// Returns one tuple per selected member in ascending identifier order. The
/// sample expression never consults `members`.
///
/// # Errors
///
/// [`ResolveError::EmptySeries`] when `members` is empty and the expression is
/// not `sample`; [`ResolveError::NoMatchingSeries`] when nothing matches.
pub fn resolve(
    members: &[SeriesMember],
    expr: &DateExpr,
    catalog: &str,
    dataset: &str,
    format: &DistributionFormat,
) -> Result<Vec<ResolutionTuple>, ResolveError> {
    if let DateExpr::Sample = expr {
        return Ok(vec![ResolutionTuple::sample(catalog, dataset)]);
    }

    if members.is_empty() {
        return Err(ResolveError::EmptySeries {
            catalog: catalog.to_string(),
            dataset: dataset.to_string(),
        });
    }

    let mut keyed: Vec<(String, &SeriesMember)> =
        members.iter().map(|m| (member_key(m), m)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    // A repeated identifier would map two tuples onto one destination
    let mut seen = HashSet::new();
    keyed.retain(|(_, member)| seen.insert(member.identifier.clone()));

    let selected: Vec<&SeriesMember> = match expr {
        DateExpr::Latest => keyed.last().map(|(_, m)| *m).into_iter().collect(),
        _ => keyed
            .iter()
            .filter(|(key, _)| expr.matches(key))
            .map(|(_, m)| *m)
            .collect(),
    };

    if selected.is_empty() {
        return Err(ResolveError::NoMatchingSeries(expr.to_string()));
    }

    Ok(selected
        .into_iter()
        .map(|member| ResolutionTuple {
            catalog: catalog.to_string(),
            dataset: dataset.to_string(),
            series: SeriesRef::Member(member.identifier.clone()),
            format: format.clone(),
        })
        .collect())
}
