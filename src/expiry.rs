//! Expiry and start date parsing and calendar rules.
//!
//! Card dates are entered as `MM/YY` (or the 4 raw digits). Parsing is
//! strict: a malformed value is invalid, never clamped to a nearby valid
//! date. The calendar checks are evaluated against an explicit `today`
//! passed in by the caller, so the same snapshot always validates the same
//! way and tests can pin the clock.
//!
//! The cutover for expiry is the first day of the month following the
//! entered month: a card expiring 12/20 is accepted through 2020-12-31 and
//! rejected from 2021-01-01.

use chrono::{Months, NaiveDate};
use std::fmt;

/// How far an expiry may reach into the future, and a start date into the
/// past, in months.
const HORIZON_MONTHS: u32 = 120;

/// A month/year pair as printed on a payment card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardDate {
    month: u32,
    year: i32,
}

impl CardDate {
    /// Creates a card date from a month (1-12) and a full year.
    ///
    /// Returns `None` if the month is out of range.
    pub fn new(month: u32, year: i32) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { month, year })
    }

    /// The month, 1-12.
    #[inline]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// The full four-digit year.
    #[inline]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// First day of this month.
    fn month_start(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// First day of the month after this one; the moment the card stops
    /// being usable.
    fn cutover(&self) -> Option<NaiveDate> {
        self.month_start()
            .and_then(|d| d.checked_add_months(Months::new(1)))
    }

    /// Whether this date is acceptable as an expiry when evaluated at
    /// `today`: the month has not ended yet and lies no more than ten
    /// years ahead.
    ///
    /// # Example
    ///
    /// ```
    /// use cardform::expiry::CardDate;
    /// use chrono::NaiveDate;
    ///
    /// let expiry = CardDate::new(12, 2020).unwrap();
    /// let before = NaiveDate::from_ymd_opt(2020, 11, 1).unwrap();
    /// let after = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    /// assert!(expiry.is_valid_expiry(before));
    /// assert!(!expiry.is_valid_expiry(after));
    /// ```
    pub fn is_valid_expiry(&self, today: NaiveDate) -> bool {
        let (Some(start), Some(cutover)) = (self.month_start(), self.cutover()) else {
            return false;
        };
        let Some(horizon) = today.checked_add_months(Months::new(HORIZON_MONTHS)) else {
            return false;
        };

        today < cutover && start <= horizon
    }

    /// Whether this date is acceptable as a Maestro start date when
    /// evaluated at `today`: the month has started and lies no more than
    /// ten years back.
    pub fn is_valid_start(&self, today: NaiveDate) -> bool {
        let Some(start) = self.month_start() else {
            return false;
        };
        let Some(horizon) = today.checked_sub_months(Months::new(HORIZON_MONTHS)) else {
            return false;
        };

        start <= today && start >= horizon
    }
}

impl fmt::Display for CardDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.year.rem_euclid(100))
    }
}

/// Why a card date string failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateParseError {
    /// The input is empty.
    Empty,
    /// The input is not `MM/YY` or four digits.
    InvalidFormat,
    /// The month is outside 1-12.
    InvalidMonth,
}

/// Parses a card date entered as `MM/YY` or `MMYY`.
///
/// Two-digit years are taken as 2000-based, matching the embossed format.
///
/// # Example
///
/// ```
/// use cardform::expiry::parse_card_date;
///
/// let date = parse_card_date("12/25").unwrap();
/// assert_eq!(date.month(), 12);
/// assert_eq!(date.year(), 2025);
///
/// assert!(parse_card_date("13/25").is_err());
/// assert!(parse_card_date("1/25").is_err());
/// ```
pub fn parse_card_date(input: &str) -> Result<CardDate, DateParseError> {
    let input = input.trim();

    if input.is_empty() {
        return Err(DateParseError::Empty);
    }

    let (month_str, year_str) = match input.split_once('/') {
        Some(parts) => parts,
        None if input.len() == 4 && input.is_ascii() => input.split_at(2),
        None => return Err(DateParseError::InvalidFormat),
    };

    if month_str.len() != 2 || year_str.len() != 2 {
        return Err(DateParseError::InvalidFormat);
    }
    if !month_str.chars().chain(year_str.chars()).all(|c| c.is_ascii_digit()) {
        return Err(DateParseError::InvalidFormat);
    }

    let month: u32 = month_str
        .parse()
        .map_err(|_| DateParseError::InvalidFormat)?;
    let year: i32 = year_str.parse().map_err(|_| DateParseError::InvalidFormat)?;

    CardDate::new(month, 2000 + year).ok_or(DateParseError::InvalidMonth)
}

/// Whether the user has finished typing a date: four digits entered,
/// with or without the separator.
pub fn is_entry_complete(input: &str) -> bool {
    input.trim().chars().filter(|c| c.is_ascii_digit()).count() == 4
}
