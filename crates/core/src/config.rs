//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services by
//! `Arc`. Nothing in the aggregation code reads environment variables during request handling.

use crate::constants::{DEFAULT_DEPARTMENTS, DEFAULT_NOTICE_LIMIT};
use crate::store::{ChangeFeed, MemoryStore, PostgrestStore, RecordStore};
use crate::{WardError, WardResult};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Where records are read from.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// A JSON snapshot loaded into a [`MemoryStore`].
    Snapshot(PathBuf),
    /// The managed backend's HTTP table API.
    Postgrest { url: String, api_key: String },
}

impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Snapshot(path) => f.debug_tuple("Snapshot").field(path).finish(),
            StoreBackend::Postgrest { url, .. } => f
                .debug_struct("Postgrest")
                .field("url", url)
                .finish_non_exhaustive(),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    backend: StoreBackend,
    clinic_offset: FixedOffset,
    departments: Vec<String>,
    notice_limit: usize,
    api_key: Option<String>,
}

impl CoreConfig {
    pub fn new(
        backend: StoreBackend,
        clinic_offset: FixedOffset,
        departments: Vec<String>,
        notice_limit: usize,
        api_key: Option<String>,
    ) -> WardResult<Self> {
        if departments.is_empty() {
            return Err(WardError::InvalidConfig(
                "department list cannot be empty".into(),
            ));
        }
        if notice_limit == 0 {
            return Err(WardError::InvalidConfig(
                "notice limit must be at least 1".into(),
            ));
        }

        Ok(Self {
            backend,
            clinic_offset,
            departments,
            notice_limit,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Configuration over a snapshot file with every other setting at its default.
    pub fn for_snapshot(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreBackend::Snapshot(path.into()),
            clinic_offset: utc_offset(),
            departments: default_departments(),
            notice_limit: DEFAULT_NOTICE_LIMIT,
            api_key: None,
        }
    }

    /// Resolve configuration from the process environment.
    ///
    /// Call once at startup, after `dotenvy` has populated the environment.
    pub fn from_process_env() -> WardResult<Self> {
        let var = |name: &str| std::env::var(name).ok();

        let backend = backend_from_env_values(
            var("WARDBOARD_SNAPSHOT"),
            var("RECORD_STORE_URL"),
            var("RECORD_STORE_KEY"),
        )?;
        let clinic_offset = clinic_offset_from_env_value(var("CLINIC_UTC_OFFSET"))?;
        let departments = departments_from_env_value(var("WARDBOARD_DEPARTMENTS"));
        let notice_limit = notice_limit_from_env_value(var("WARDBOARD_NOTICE_LIMIT"))?;

        Self::new(
            backend,
            clinic_offset,
            departments,
            notice_limit,
            var("API_KEY"),
        )
    }

    pub fn backend(&self) -> &StoreBackend {
        &self.backend
    }

    /// Offset of the clinic's wall clock. Appointment dates and times are read at this offset
    /// and "today"/"yesterday" are clinic days.
    pub fn clinic_offset(&self) -> FixedOffset {
        self.clinic_offset
    }

    /// Wards listed in the bed management table, in display order.
    pub fn departments(&self) -> &[String] {
        &self.departments
    }

    pub fn notice_limit(&self) -> usize {
        self.notice_limit
    }

    /// Key required from REST callers, when one is configured.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Current instant on the clinic's clock.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.clinic_offset)
    }

    pub fn with_clinic_offset(mut self, offset: FixedOffset) -> Self {
        self.clinic_offset = offset;
        self
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

fn default_departments() -> Vec<String> {
    DEFAULT_DEPARTMENTS.iter().map(|d| (*d).to_owned()).collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a clinic offset such as `-03:00`, `+0530` or `Z`. Defaults to UTC.
pub fn clinic_offset_from_env_value(value: Option<String>) -> WardResult<FixedOffset> {
    let Some(value) = non_blank(value) else {
        return Ok(utc_offset());
    };
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Ok(utc_offset());
    }

    let invalid = || WardError::InvalidConfig(format!("invalid CLINIC_UTC_OFFSET: {value:?}"));

    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Parse a comma-separated department list. Blank entries are ignored; an unset or blank value
/// yields the default wards.
pub fn departments_from_env_value(value: Option<String>) -> Vec<String> {
    let parsed: Vec<String> = non_blank(value)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    if parsed.is_empty() {
        default_departments()
    } else {
        parsed
    }
}

pub fn notice_limit_from_env_value(value: Option<String>) -> WardResult<usize> {
    let parsed = non_blank(value)
        .map(|v| {
            v.parse::<usize>().map_err(|_| {
                WardError::InvalidConfig(format!("invalid WARDBOARD_NOTICE_LIMIT: {v:?}"))
            })
        })
        .transpose()?;
    Ok(parsed.unwrap_or(DEFAULT_NOTICE_LIMIT))
}

/// Choose the record store backend. A snapshot path wins over remote credentials.
pub fn backend_from_env_values(
    snapshot: Option<String>,
    url: Option<String>,
    key: Option<String>,
) -> WardResult<StoreBackend> {
    if let Some(path) = non_blank(snapshot) {
        return Ok(StoreBackend::Snapshot(PathBuf::from(path)));
    }
    match (non_blank(url), non_blank(key)) {
        (Some(url), Some(api_key)) => Ok(StoreBackend::Postgrest { url, api_key }),
        (Some(_), None) => Err(WardError::InvalidConfig(
            "RECORD_STORE_KEY is required with RECORD_STORE_URL".into(),
        )),
        _ => Err(WardError::InvalidConfig(
            "set WARDBOARD_SNAPSHOT or RECORD_STORE_URL and RECORD_STORE_KEY".into(),
        )),
    }
}

/// Handles onto an opened record store.
#[derive(Clone)]
pub struct OpenedStore {
    pub records: Arc<dyn RecordStore>,
    /// Present only for backends that publish change events.
    pub changes: Option<Arc<dyn ChangeFeed>>,
}

/// Open the configured backend.
pub fn open_store(cfg: &CoreConfig) -> WardResult<OpenedStore> {
    match cfg.backend() {
        StoreBackend::Snapshot(path) => {
            let store = Arc::new(MemoryStore::load(path)?);
            Ok(OpenedStore {
                records: store.clone(),
                changes: Some(store),
            })
        }
        StoreBackend::Postgrest { url, api_key } => {
            tracing::info!("using record store at {}", url);
            Ok(OpenedStore {
                records: Arc::new(PostgrestStore::new(url.as_str(), api_key, None)?),
                changes: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn clinic_offset_defaults_to_utc() {
        assert_eq!(clinic_offset_from_env_value(None).unwrap(), utc_offset());
        assert_eq!(
            clinic_offset_from_env_value(Some("  ".into())).unwrap(),
            utc_offset()
        );
        assert_eq!(
            clinic_offset_from_env_value(Some("Z".into())).unwrap(),
            utc_offset()
        );
    }

    #[test]
    fn clinic_offset_parses_common_forms() {
        let parse = |s: &str| clinic_offset_from_env_value(Some(s.into())).unwrap();
        assert_eq!(parse("-03:00").local_minus_utc(), -3 * 3600);
        assert_eq!(parse("+0530").local_minus_utc(), 5 * 3600 + 30 * 60);
        assert_eq!(parse("+2").local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn clinic_offset_rejects_garbage() {
        for bad in ["03:00", "-3:75", "+15:00", "abc", "-xx"] {
            let err = clinic_offset_from_env_value(Some(bad.into())).unwrap_err();
            assert!(matches!(err, WardError::InvalidConfig(_)), "{bad}");
        }
    }

    #[test]
    fn departments_parse_and_default() {
        assert_eq!(departments_from_env_value(None).len(), DEFAULT_DEPARTMENTS.len());
        assert_eq!(
            departments_from_env_value(Some(" UTI , ,Pediatria".into())),
            vec!["UTI".to_string(), "Pediatria".to_string()]
        );
        assert_eq!(
            departments_from_env_value(Some(" , ".into())).len(),
            DEFAULT_DEPARTMENTS.len()
        );
    }

    #[test]
    fn notice_limit_parses_and_defaults() {
        assert_eq!(notice_limit_from_env_value(None).unwrap(), 1);
        assert_eq!(notice_limit_from_env_value(Some("3".into())).unwrap(), 3);
        assert!(notice_limit_from_env_value(Some("many".into())).is_err());
    }

    #[test]
    fn snapshot_wins_over_remote_credentials() {
        let backend = backend_from_env_values(
            Some("demo.json".into()),
            Some("https://example.test".into()),
            Some("key".into()),
        )
        .unwrap();
        assert_eq!(backend, StoreBackend::Snapshot(PathBuf::from("demo.json")));
    }

    #[test]
    fn remote_backend_needs_a_key() {
        let err = backend_from_env_values(None, Some("https://example.test".into()), None)
            .unwrap_err();
        assert!(matches!(err, WardError::InvalidConfig(_)));
        assert!(backend_from_env_values(None, None, None).is_err());

        let backend =
            backend_from_env_values(None, Some("https://example.test".into()), Some("k".into()))
                .unwrap();
        assert!(matches!(backend, StoreBackend::Postgrest { .. }));
        assert!(!format!("{backend:?}").contains("\"k\""));
    }

    #[test]
    fn config_validates_and_drops_blank_api_key() {
        let backend = StoreBackend::Snapshot("x.json".into());
        assert!(CoreConfig::new(backend.clone(), utc_offset(), vec![], 1, None).is_err());
        assert!(CoreConfig::new(backend.clone(), utc_offset(), default_departments(), 0, None)
            .is_err());

        let cfg = CoreConfig::new(
            backend,
            utc_offset(),
            default_departments(),
            2,
            Some(" ".into()),
        )
        .unwrap();
        assert_eq!(cfg.api_key(), None);
        assert_eq!(cfg.notice_limit(), 2);
    }

    #[tokio::test]
    async fn opens_snapshot_backend_with_change_feed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"beds": []}}"#).unwrap();

        let cfg = CoreConfig::for_snapshot(file.path());
        let opened = open_store(&cfg).unwrap();
        assert!(opened.changes.is_some());
        let beds = opened
            .records
            .query(crate::store::Table::Beds, &Default::default())
            .await
            .unwrap();
        assert!(beds.is_empty());
    }
}
