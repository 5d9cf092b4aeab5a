//! Date conversion functions for the date validation stage.

use crate::utils::{is_datetime_dtype, is_missing_marker};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use polars::prelude::*;

/// Parse one cell into a date-time.
///
/// Tries RFC 3339 first, then each chrono format in order (as a date-time,
/// then as a plain date at midnight), then `YYYY-MM` and `YYYY`, which map to
/// the first day of the period. Missing markers and anything else yield `None`.
pub(crate) fn parse_date_cell(value: &str, formats: &[String]) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if is_missing_marker(trimmed) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }

    parse_partial_date(trimmed).map(|date| date.and_time(NaiveTime::MIN))
}

/// `YYYY` or `YYYY-MM` (month 1 or 2 digits).
fn parse_partial_date(value: &str) -> Option<NaiveDate> {
    let mut parts = value.split('-');
    let year_part = parts.next()?;
    let month_part = parts.next();
    if parts.next().is_some() {
        return None;
    }

    if year_part.len() != 4 || !year_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year_part.parse().ok()?;

    let month = match month_part {
        None => 1,
        Some(m) if (1..=2).contains(&m.len()) && m.bytes().all(|b| b.is_ascii_digit()) => {
            m.parse().ok()?
        }
        Some(_) => return None,
    };

    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Convert a column to dates, turning unparsable cells into nulls.
///
/// Returns the converted series and the number of non-null input cells that
/// failed to parse. Columns that already hold dates are returned unchanged.
/// The result is a `Date` column when every parsed value falls on midnight,
/// otherwise a millisecond `Datetime` column.
pub(crate) fn string_to_date(series: &Series, formats: &[String]) -> Result<(Series, usize)> {
    if is_datetime_dtype(series.dtype()) {
        return Ok((series.clone(), 0));
    }

    let as_text = series.cast(&DataType::String)?;
    let str_series = as_text.str()?;

    let mut parsed: Vec<Option<NaiveDateTime>> = Vec::with_capacity(str_series.len());
    let mut invalid = 0usize;

    for opt_val in str_series.into_iter() {
        match opt_val {
            Some(val) => {
                let value = parse_date_cell(val, formats);
                if value.is_none() {
                    invalid += 1;
                }
                parsed.push(value);
            }
            None => parsed.push(None),
        }
    }

    let all_midnight = parsed
        .iter()
        .flatten()
        .all(|dt| dt.time().num_seconds_from_midnight() == 0 && dt.nanosecond() == 0);

    let name = series.name().clone();
    let converted = if all_midnight {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
        let days: Vec<Option<i32>> = parsed
            .iter()
            .map(|opt| opt.map(|dt| (dt.date() - epoch).num_days() as i32))
            .collect();
        Series::new(name, days).cast(&DataType::Date)?
    } else {
        let millis: Vec<Option<i64>> = parsed
            .iter()
            .map(|opt| opt.map(|dt| dt.and_utc().timestamp_millis()))
            .collect();
        Series::new(name, millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
    };

    Ok((converted, invalid))
}
