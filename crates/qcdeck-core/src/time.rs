//! Deterministic time arithmetic.
//!
//! Asset names encode their acquisition moment as `YYYY-MM-DD` and
//! `HH-MM-SS` segments. This module converts that pair to unix seconds and
//! back with pure civil-date arithmetic. No wall-clock reads happen here.

use std::fmt;

pub const MILLIS_PER_SECOND: i64 = 1000;
pub const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeError(pub String);

impl fmt::Display for TimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TimeError {}

/// Floor conversion from epoch milliseconds to epoch seconds.
///
/// Brushed selections arrive in milliseconds; stored metric timestamps are
/// seconds. This is the single owner of that conversion.
#[must_use]
pub fn millis_to_seconds(millis: i64) -> i64 {
    millis.div_euclid(MILLIS_PER_SECOND)
}

/// Parse a naming-convention date/time pair (`2024-06-04`, `10-33-39`)
/// into unix seconds.
pub fn parse_name_timestamp(date: &str, time: &str) -> Result<i64, TimeError> {
    let (year, month, day) = split_triple(date, "date")?;
    let (hour, minute, second) = split_triple(time, "time")?;

    if !(1..=12).contains(&month) {
        return Err(TimeError(format!("month out of range: {month}")));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(TimeError(format!("day out of range: {day}")));
    }
    if hour > 23 || minute > 59 || second > 59 {
        return Err(TimeError(format!(
            "time out of range: {hour:02}-{minute:02}-{second:02}"
        )));
    }

    let days = days_from_civil(year, month, day);
    Ok(days * SECONDS_PER_DAY + i64::from(hour) * 3600 + i64::from(minute) * 60 + i64::from(second))
}

/// Inverse of [`parse_name_timestamp`]: unix seconds back to the
/// (`YYYY-MM-DD`, `HH-MM-SS`) naming-convention pair.
#[must_use]
pub fn format_name_timestamp(unix: i64) -> (String, String) {
    let days = unix.div_euclid(SECONDS_PER_DAY);
    let secs_of_day = unix.rem_euclid(SECONDS_PER_DAY);
    let (year, month, day) = civil_from_days(days);
    let hour = secs_of_day / 3600;
    let minute = (secs_of_day % 3600) / 60;
    let second = secs_of_day % 60;
    (
        format!("{year:04}-{month:02}-{day:02}"),
        format!("{hour:02}-{minute:02}-{second:02}"),
    )
}

fn split_triple(input: &str, what: &str) -> Result<(i64, u32, u32), TimeError> {
    let mut parts = input.split('-');
    let a = parts
        .next()
        .ok_or_else(|| TimeError(format!("{what} segment is empty")))?;
    let b = parts
        .next()
        .ok_or_else(|| TimeError(format!("{what} must have three '-' separated fields")))?;
    let c = parts
        .next()
        .ok_or_else(|| TimeError(format!("{what} must have three '-' separated fields")))?;
    if parts.next().is_some() {
        return Err(TimeError(format!(
            "{what} must have exactly three '-' separated fields"
        )));
    }
    let a = parse_field(a, what)?;
    let b = parse_field(b, what)?;
    let c = parse_field(c, what)?;
    let b = u32::try_from(b).map_err(|_| TimeError(format!("{what} field out of range")))?;
    let c = u32::try_from(c).map_err(|_| TimeError(format!("{what} field out of range")))?;
    Ok((a, b, c))
}

fn parse_field(field: &str, what: &str) -> Result<i64, TimeError> {
    if field.is_empty() || !field.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(TimeError(format!("{what} field `{field}` is not numeric")));
    }
    field
        .parse::<i64>()
        .map_err(|_| TimeError(format!("{what} field `{field}` overflows")))
}

fn is_leap_year(year: i64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

// Days since 1970-01-01 for a civil date (proleptic Gregorian).
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = i64::from((month + 9) % 12);
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { y + 1 } else { y };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    (year, month as u32, day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_zero() {
        assert_eq!(
            parse_name_timestamp("1970-01-01", "00-00-00").expect("epoch"),
            0
        );
    }

    #[test]
    fn known_timestamp_parses() {
        // 2024-06-04T10:33:39Z
        let unix = parse_name_timestamp("2024-06-04", "10-33-39").expect("parse");
        assert_eq!(unix, 1_717_497_219);
    }

    #[test]
    fn format_is_the_inverse_of_parse() {
        let unix = parse_name_timestamp("2024-08-27", "11-28-34").expect("parse");
        let (date, time) = format_name_timestamp(unix);
        assert_eq!(date, "2024-08-27");
        assert_eq!(time, "11-28-34");
    }

    #[test]
    fn leap_day_is_accepted_and_non_leap_rejected() {
        assert!(parse_name_timestamp("2024-02-29", "00-00-00").is_ok());
        assert!(parse_name_timestamp("2023-02-29", "00-00-00").is_err());
        assert!(parse_name_timestamp("2100-02-29", "00-00-00").is_err());
        assert!(parse_name_timestamp("2000-02-29", "00-00-00").is_ok());
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        assert!(parse_name_timestamp("2024-13-01", "00-00-00").is_err());
        assert!(parse_name_timestamp("2024-06-31", "00-00-00").is_err());
        assert!(parse_name_timestamp("2024-06-04", "24-00-00").is_err());
        assert!(parse_name_timestamp("2024-06-04", "10-61-00").is_err());
        assert!(parse_name_timestamp("2024-06", "10-33-39").is_err());
        assert!(parse_name_timestamp("2024-06-04-05", "10-33-39").is_err());
        assert!(parse_name_timestamp("2024-0x-04", "10-33-39").is_err());
    }

    #[test]
    fn millis_floor_toward_negative_infinity() {
        assert_eq!(millis_to_seconds(1_700_000_000_000), 1_700_000_000);
        assert_eq!(millis_to_seconds(1999), 1);
        assert_eq!(millis_to_seconds(-1), -1);
    }
}
