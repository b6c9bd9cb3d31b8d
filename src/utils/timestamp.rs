use chrono::{DateTime, NaiveDateTime, ParseError, TimeZone};

/// Layout of `location.localtime` in weather payloads, e.g. `2025-05-01 9:05`.
const LOCALTIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub trait AsNaive {
    fn as_naive(&self) -> NaiveDateTime;
}

impl AsNaive for NaiveDateTime {
    fn as_naive(&self) -> NaiveDateTime {
        *self
    }
}

impl<T: TimeZone> AsNaive for DateTime<T> {
    fn as_naive(&self) -> NaiveDateTime {
        self.naive_local()
    }
}

/// Long date with short time, e.g. `May 1, 2025 at 9:05 AM`.
pub fn format_timestamp(date: impl AsNaive) -> String {
    date.as_naive().format("%B %-d, %Y at %-I:%M %p").to_string()
}

/// Parses a weather-API local time and renders it with [`format_timestamp`].
pub fn format_date(localtime: &str) -> Result<String, ParseError> {
    let parsed = NaiveDateTime::parse_from_str(localtime.trim(), LOCALTIME_FORMAT)?;
    Ok(format_timestamp(parsed))
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate};

    use super::*;

    #[test]
    fn formats_weather_localtime() {
        assert_eq!(format_date("2025-05-01 9:05").unwrap(), "May 1, 2025 at 9:05 AM");
        assert_eq!(format_date("2025-12-24 18:30").unwrap(), "December 24, 2025 at 6:30 PM");
    }

    #[test]
    fn rejects_garbage() {
        assert!(format_date("yesterday").is_err());
    }

    #[test]
    fn zoned_times_format_in_their_own_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(0, 15, 0)
            .unwrap()
            .and_local_timezone(offset)
            .unwrap();
        assert_eq!(format_timestamp(date), "January 2, 2025 at 12:15 AM");
    }
}
