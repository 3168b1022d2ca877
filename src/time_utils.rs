// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.
//!
//! Calendar days are always UTC days: check-ins are stamped with the UTC
//! date at write time and streaks are measured against the UTC date.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The UTC calendar day containing `instant`.
pub fn utc_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// The current UTC calendar day.
pub fn utc_today() -> NaiveDate {
    utc_day(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_utc_day_ignores_local_offset() {
        // 23:30 in UTC-8 is already the next day in UTC
        let instant = chrono::FixedOffset::west_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 14, 23, 30, 0)
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(utc_day(instant), NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
    }

    #[test]
    fn test_format_utc_rfc3339() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_utc_rfc3339(instant), "2026-01-02T03:04:05Z");
    }
}
