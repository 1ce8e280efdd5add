//! Compact date and decimal clock token conversion.
//!
//! Timesheets write dates as `ddmmyy`/`ddmmyyyy` and clock readings as
//! decimal hours (`9.00`, `13.5`). The decimal form is interpreted
//! literally: the fractional part times sixty, rounded, is the minute.
//! `9.30` is therefore 9h18m, not 9h30m. This matches how documents have
//! always been processed; do not "fix" it to base-60.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Errors from date and clock token conversion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// The date token was not a valid `ddmmyy` or `ddmmyyyy` value.
    #[error("invalid date token `{token}`")]
    InvalidDateToken { token: String },

    /// The clock token was not a parseable decimal hour.
    #[error("invalid clock token `{token}`")]
    InvalidClockToken { token: String },

    /// The hour/minute pair does not name a time of day.
    #[error("no time of day at {hour}:{minute:02}")]
    OutOfRange { hour: u32, minute: u32 },
}

/// Parses a compact date token into a calendar date.
///
/// Six digits are read as `ddmmyy` with the year in the 2000s; eight digits
/// as `ddmmyyyy`. Day, month and year are sliced positionally, so calendar
/// validity is whatever date construction rejects (day 32 fails).
pub fn parse_compact_date(token: &str) -> Result<NaiveDate, ClockError> {
    let invalid = || ClockError::InvalidDateToken {
        token: token.to_string(),
    };

    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let (day, month, year) = match token.len() {
        6 => (&token[0..2], &token[2..4], 2000 + parse_u32(&token[4..6])?),
        8 => (&token[0..2], &token[2..4], parse_u32(&token[4..8])?),
        _ => return Err(invalid()),
    };

    let day = parse_u32(day)?;
    let month = parse_u32(month)?;
    NaiveDate::from_ymd_opt(i32::try_from(year).map_err(|_| invalid())?, month, day)
        .ok_or_else(invalid)
}

fn parse_u32(digits: &str) -> Result<u32, ClockError> {
    digits.parse().map_err(|_| ClockError::InvalidDateToken {
        token: digits.to_string(),
    })
}

/// Converts a decimal hour token into an `(hour, minute)` pair.
///
/// The token is parsed as a float; the integer part is the hour and the
/// fractional part times sixty, rounded to nearest, is the minute.
pub fn decimal_hour_to_hm(token: &str) -> Result<(u32, u32), ClockError> {
    let value: f64 = token
        .trim()
        .parse()
        .map_err(|_| ClockError::InvalidClockToken {
            token: token.to_string(),
        })?;
    if !value.is_finite() || value < 0.0 {
        return Err(ClockError::InvalidClockToken {
            token: token.to_string(),
        });
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is finite and non-negative; truncation is the point"
    )]
    let hour = value.trunc() as u32;
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "fraction is in [0, 1); round(frac * 60) fits in u32"
    )]
    let minute = ((value - value.trunc()) * 60.0).round() as u32;
    Ok((hour, minute))
}

/// Builds an instant on the given calendar date, seconds always zero.
pub fn combine(date: NaiveDate, hour: u32, minute: u32) -> Result<NaiveDateTime, ClockError> {
    let time =
        NaiveTime::from_hms_opt(hour, minute, 0).ok_or(ClockError::OutOfRange { hour, minute })?;
    Ok(NaiveDateTime::new(date, time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_digit_date_lands_in_the_2000s() {
        assert_eq!(
            parse_compact_date("290125").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 29).unwrap()
        );
        assert_eq!(
            parse_compact_date("010100").unwrap(),
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
        );
    }

    #[test]
    fn eight_digit_date_uses_literal_year() {
        assert_eq!(
            parse_compact_date("29011999").unwrap(),
            NaiveDate::from_ymd_opt(1999, 1, 29).unwrap()
        );
    }

    #[test]
    fn date_rejects_other_lengths() {
        for token in ["", "2901", "2901255", "290125000"] {
            assert!(matches!(
                parse_compact_date(token),
                Err(ClockError::InvalidDateToken { .. })
            ));
        }
    }

    #[test]
    fn date_rejects_non_digits() {
        assert!(parse_compact_date("29jan5").is_err());
        assert!(parse_compact_date("²90125").is_err());
    }

    #[test]
    fn date_rejects_impossible_days() {
        assert!(parse_compact_date("320125").is_err());
        assert!(parse_compact_date("291325").is_err());
        assert!(parse_compact_date("300225").is_err());
    }

    #[test]
    fn decimal_hours_are_literal_decimal_not_base_sixty() {
        assert_eq!(decimal_hour_to_hm("9.00").unwrap(), (9, 0));
        assert_eq!(decimal_hour_to_hm("13.5").unwrap(), (13, 30));
        // .30 means 30 hundredths of an hour, which rounds to 18 minutes.
        assert_eq!(decimal_hour_to_hm("9.30").unwrap(), (9, 18));
        assert_eq!(decimal_hour_to_hm("12.25").unwrap(), (12, 15));
        assert_eq!(decimal_hour_to_hm("17").unwrap(), (17, 0));
    }

    #[test]
    fn decimal_hours_reject_garbage() {
        for token in ["", "nine", "9..0", "-1.0", "inf", "NaN"] {
            assert!(matches!(
                decimal_hour_to_hm(token),
                Err(ClockError::InvalidClockToken { .. })
            ));
        }
    }

    #[test]
    fn combine_builds_midnight_seconds() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 29).unwrap();
        let instant = combine(date, 9, 18).unwrap();
        assert_eq!(instant.to_string(), "2025-01-29 09:18:00");
    }

    #[test]
    fn combine_rejects_out_of_range_clock() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 29).unwrap();
        assert!(matches!(
            combine(date, 99, 0),
            Err(ClockError::OutOfRange { hour: 99, .. })
        ));
        // "9.999" rounds its fraction to a 60th minute.
        let (hour, minute) = decimal_hour_to_hm("9.999").unwrap();
        assert_eq!((hour, minute), (9, 60));
        assert!(combine(date, hour, minute).is_err());
    }
}
