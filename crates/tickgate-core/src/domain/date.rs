use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use crate::ValidationError;

const ISO_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Calendar date in the service's single reference timezone (UTC), formatted
/// as ISO-8601 `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradingDate(Date);

impl TradingDate {
    /// Current UTC calendar date. Evaluated once per request by the gate so a
    /// single call never straddles a day boundary.
    pub fn today_utc() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input, ISO_DATE)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    pub const fn from_date(date: Date) -> Self {
        Self(date)
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }

    /// Date `days` before this one, saturating at the calendar minimum.
    pub fn minus_days(self, days: u32) -> Self {
        self.0
            .checked_sub(Duration::days(i64::from(days)))
            .map(Self)
            .unwrap_or(Self(Date::MIN))
    }

    pub fn next_day(self) -> Self {
        self.0
            .checked_add(Duration::days(1))
            .map(Self)
            .unwrap_or(Self(Date::MAX))
    }

    pub fn format_iso(self) -> String {
        self.0
            .format(ISO_DATE)
            .expect("calendar date must be ISO formattable")
    }
}

impl Display for TradingDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl Serialize for TradingDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for TradingDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

/// Inclusive date range an indicator is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: TradingDate,
    pub end: TradingDate,
}

impl DateWindow {
    pub fn new(start: TradingDate, end: TradingDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidWindow {
                start: start.format_iso(),
                end: end.format_iso(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: TradingDate) -> bool {
        self.start <= date && date <= self.end
    }
}
