//! Constants used throughout the wardboard core crate.
//!
//! Thresholds, windows and limits live here so the aggregation rules can be read in one place.

/// Department occupancy at or above this percentage is `critical`.
pub const CRITICAL_OCCUPANCY_PERCENT: u32 = 90;

/// Department occupancy at or above this percentage is `high`.
pub const HIGH_OCCUPANCY_PERCENT: u32 = 80;

/// Ward table: occupancy at or above this percentage raises an `Alerta`.
pub const WARD_ALERT_PERCENT: u32 = 90;

/// Ward table: occupancy at or above this percentage raises an `Atenção`.
pub const WARD_ATTENTION_PERCENT: u32 = 70;

/// Appointments starting within this many minutes appear in the notification feed.
pub const APPOINTMENT_LOOKAHEAD_MINUTES: i64 = 60;

/// Admissions and registrations younger than this appear in the notification feed.
pub const RECENT_EVENT_LOOKBACK_HOURS: i64 = 24;

/// Maximum number of notifications shown at once.
pub const NOTIFICATION_LIMIT: usize = 10;

/// Today's appointments fetched for the notification feed.
pub const NOTIFICATION_APPOINTMENT_FETCH_LIMIT: usize = 5;

/// Recent admissions fetched for the notification feed.
pub const NOTIFICATION_ADMISSION_FETCH_LIMIT: usize = 3;

/// Recent registrations fetched for the notification feed.
pub const NOTIFICATION_PATIENT_FETCH_LIMIT: usize = 3;

/// Results kept per category in the global search.
pub const SEARCH_RESULTS_PER_KIND: usize = 5;

/// Audit entries loaded into the viewer.
pub const AUDIT_LOG_FETCH_LIMIT: usize = 100;

/// Security alerts derived from the audit trail.
pub const SECURITY_ALERT_LIMIT: usize = 5;

/// Seconds between badge recomputations when no change arrives, so entries age out.
pub const BADGE_REFRESH_INTERVAL_SECS: u64 = 60;

/// Badge counts above this render as "9+".
pub const BADGE_COUNT_CAP: usize = 9;

/// Notices kept on the board when no limit is configured.
pub const DEFAULT_NOTICE_LIMIT: usize = 1;

/// Capacity of the in-process change broadcast channel.
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Wards listed in the bed management table when none are configured.
pub const DEFAULT_DEPARTMENTS: &[&str] = &[
    "UTI",
    "Enfermaria A",
    "Enfermaria B",
    "Pediatria",
    "Maternidade",
    "Centro Cirúrgico",
];

/// Path prefix of the managed backend's table API.
pub const REST_PATH_PREFIX: &str = "rest/v1";
