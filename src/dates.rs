//! Conversions between date-keys (`YYYY-MM-DD`) and the calendar's native
//! dates, which are midnights in the calendar's time zone.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DateKeyError {
    #[error("'{0}' is not a YYYY-MM-DD date")]
    Malformed(String),
    #[error("'{0}' is not a calendar date")]
    OutOfRange(String),
}

/// Splits a date-key into its numeric components without checking that they
/// name a real day.
fn components(key: &str) -> Result<(i32, u32, u32), DateKeyError> {
    let malformed = || DateKeyError::Malformed(key.to_string());
    let mut parts = key.trim().splitn(3, '-');
    let year: i32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
    let month: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
    let day: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
    Ok((year, month, day))
}

/// Parses a canonical date-key. Anything that does not format back to the
/// same string is rejected.
pub fn parse_date_key(key: &str) -> Result<NaiveDate, DateKeyError> {
    let (year, month, day) = components(key)?;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateKeyError::OutOfRange(key.to_string()))?;
    if date_key(date) != key {
        return Err(DateKeyError::Malformed(key.to_string()));
    }
    Ok(date)
}

pub fn date_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Date-key of a native calendar date, read from its local calendar fields.
pub fn date_key_of<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Local midnight of `date` in `tz`. Where midnight falls in a DST gap the
/// first valid instant of the day is used instead.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    (0..3).find_map(|hour| {
        let naive = date.and_hms_opt(hour, 0, 0)?;
        tz.from_local_datetime(&naive).earliest()
    })
}

/// Converts a date-key into the calendar's native date.
///
/// The key is anchored at UTC midnight first and its UTC calendar fields are
/// then re-read as a local date. Parsing the key directly as a local
/// timestamp lands on the previous day west of UTC.
pub fn widget_date<Tz: TimeZone>(tz: &Tz, key: &str) -> Result<DateTime<Tz>, DateKeyError> {
    let out_of_range = || DateKeyError::OutOfRange(key.to_string());
    let (year, month, day) = components(key)?;
    let anchored = Utc
        .with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .ok_or_else(out_of_range)?;
    let utc_day = NaiveDate::from_ymd_opt(anchored.year(), anchored.month(), anchored.day())
        .ok_or_else(out_of_range)?;
    local_midnight(tz, utc_day).ok_or_else(out_of_range)
}
