//! Clinic-day arithmetic and store filter bounds.
//!
//! Timestamps are stored in UTC while "today" is a clinic day, so day boundaries are computed at
//! the clinic offset and then converted back to UTC before they reach a filter.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, SecondsFormat, TimeZone, Utc};

/// Calendar date at the clinic, `days_ago` days before `now`.
pub fn clinic_date(now: DateTime<FixedOffset>, days_ago: i64) -> NaiveDate {
    (now - Duration::days(days_ago)).date_naive()
}

/// First instant of a clinic day, in UTC.
pub fn day_start_utc(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    match offset.from_local_datetime(&midnight).single() {
        Some(local) => local.with_timezone(&Utc),
        // Fixed offsets are never ambiguous; keep UTC midnight as the fallback.
        None => Utc.from_utc_datetime(&midnight),
    }
}

/// Filter bound for a timestamp column, e.g. `2026-10-18T03:00:00Z`.
pub fn timestamp_bound(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Filter bound for a date column, e.g. `2026-10-18`.
pub fn date_bound(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
