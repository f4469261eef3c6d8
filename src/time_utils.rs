// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a backend timestamp or date column.
///
/// Accepts RFC3339 (`timestamptz` as PostgREST renders it), a bare
/// `YYYY-MM-DDTHH:MM:SS[.f]` treated as UTC, or a `date` column
/// (`YYYY-MM-DD`) which resolves to UTC midnight.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    // Postgres text output uses a space separator and short offsets ("+00")
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// First instant of the calendar month containing `now`, in `now`'s zone.
pub fn start_of_month<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let naive = now
        .date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_else(|| now.naive_local());

    now.timezone()
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T10:30:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T12:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-15T10:30:00.123456+00:00").map(|d| d.timestamp()),
            Some(expected.timestamp())
        );
        assert_eq!(parse_timestamp("2024-01-15T10:30:00"), Some(expected));
    }

    #[test]
    fn test_parse_date_only_is_utc_midnight() {
        assert_eq!(
            parse_timestamp("2024-06-01"),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("2024-13-45"), None);
    }

    #[test]
    fn test_start_of_month() {
        let now = Utc.with_ymd_and_hms(2024, 3, 17, 8, 45, 12).unwrap();
        assert_eq!(
            start_of_month(&now),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );

        let first = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(start_of_month(&first), first);
    }

    #[test]
    fn test_format_utc_rfc3339() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2024-01-15T10:30:00Z");
    }
}
