use std::fmt::Display;

use chrono::{DateTime, TimeDelta, TimeZone};

/// Stopwatch style `HH:MM:SS`. Hours are not wrapped, so 100 hours renders as `100:00:00`.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let total = elapsed.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = total / 60 % 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// `YYYYMMDD`, used for the date columns of an export.
pub fn format_record_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format("%Y%m%d").to_string()
}

/// `HHMMSSmmm`, used for the time columns of an export.
pub fn format_record_time<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format("%H%M%S%3f").to_string()
}

/// `YYYYMMDD_HHMMSS`, used for naming export files.
pub fn format_file_timestamp<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};

    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(TimeDelta::seconds(3725)), "01:02:05");
        assert_eq!(format_elapsed(TimeDelta::zero()), "00:00:00");
        assert_eq!(format_elapsed(TimeDelta::milliseconds(59_999)), "00:00:59");
        assert_eq!(format_elapsed(TimeDelta::hours(123)), "123:00:00");
    }

    #[test]
    fn test_record_formats() {
        let date = Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2024, 3, 7)
                .unwrap()
                .and_hms_milli_opt(9, 5, 3, 42)
                .unwrap(),
        );

        assert_eq!(format_record_date(&date), "20240307");
        assert_eq!(format_record_time(&date), "090503042");
        assert_eq!(format_file_timestamp(&date), "20240307_090503");
    }
}
