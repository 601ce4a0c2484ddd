//! The record store seam.
//!
//! Every page of the dashboard reads remote tables through [`RecordStore`]; change
//! notifications come through [`ChangeFeed`]. Two backends are provided:
//!
//! - [`MemoryStore`]: in-process tables, loaded from a JSON snapshot or seeded by tests
//! - [`PostgrestStore`]: the managed backend's HTTP table API
//!
//! Aggregation code only ever sees the traits.

mod memory;
mod postgrest;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

use crate::error::WardResult;
use async_trait::async_trait;
use chrono::DateTime;
use records::Row;
use serde_json::Value;
use std::cmp::Ordering;
use tokio::sync::broadcast;

/// Tables exposed by the record store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Patients,
    Professionals,
    Appointments,
    Beds,
    Admissions,
    MedicalRecords,
    AuditLogs,
}

impl Table {
    pub const ALL: &'static [Table] = &[
        Table::Patients,
        Table::Professionals,
        Table::Appointments,
        Table::Beds,
        Table::Admissions,
        Table::MedicalRecords,
        Table::AuditLogs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Table::Patients => "patients",
            Table::Professionals => "professionals",
            Table::Appointments => "appointments",
            Table::Beds => "beds",
            Table::Admissions => "admissions",
            Table::MedicalRecords => "medical_records",
            Table::AuditLogs => "audit_logs",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Table::ALL.iter().copied().find(|table| table.as_str() == name)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row predicate understood by every backend.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(&'static str, Value),
    Gte(&'static str, Value),
    Lt(&'static str, Value),
    In(&'static str, Vec<Value>),
    /// Case-insensitive substring match.
    Contains(&'static str, String),
    /// Matches when any of the inner filters matches.
    Any(Vec<Filter>),
}

impl Filter {
    pub fn equals(column: &'static str, value: impl Into<Value>) -> Self {
        Filter::Eq(column, value.into())
    }

    pub fn gte(column: &'static str, value: impl Into<Value>) -> Self {
        Filter::Gte(column, value.into())
    }

    pub fn lt(column: &'static str, value: impl Into<Value>) -> Self {
        Filter::Lt(column, value.into())
    }

    pub fn one_of<V: Into<Value>>(
        column: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Filter::In(column, values.into_iter().map(Into::into).collect())
    }

    pub fn contains(column: &'static str, needle: impl Into<String>) -> Self {
        Filter::Contains(column, needle.into())
    }

    /// Evaluate the filter against an in-memory row.
    ///
    /// Range comparisons follow the backend: numbers compare numerically, timestamps by
    /// instant whatever their offset, other strings lexicographically (which orders plain
    /// ISO dates), and mixed types never match.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::Eq(column, value) => row.get(*column).is_some_and(|v| v == value),
            Filter::Gte(column, bound) => row
                .get(*column)
                .and_then(|v| compare_values(v, bound))
                .is_some_and(|ord| ord != Ordering::Less),
            Filter::Lt(column, bound) => row
                .get(*column)
                .and_then(|v| compare_values(v, bound))
                .is_some_and(|ord| ord == Ordering::Less),
            Filter::In(column, values) => row
                .get(*column)
                .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
            Filter::Contains(column, needle) => row
                .get(*column)
                .and_then(Value::as_str)
                .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase())),
            Filter::Any(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }
}

/// Compare two scalar JSON values of the same kind.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => Some(x.cmp(&y)),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

/// Filters, ordering and limit for a table read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: &'static str, ascending: bool) -> Self {
        self.order = Some(Order { column, ascending });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Table-scoped reads against the record store.
///
/// Implementations must be safe to call concurrently: loaders issue several reads at once
/// and join them.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows of `table` matching every filter, ordered and limited as requested.
    async fn query(&self, table: Table, query: &Query) -> WardResult<Vec<Row>>;

    /// Number of rows of `table` matching every filter.
    async fn count(&self, table: Table, filters: &[Filter]) -> WardResult<u64>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Which change kinds a subscriber wants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventMask(u8);

impl EventMask {
    pub const INSERT: EventMask = EventMask(0b001);
    pub const UPDATE: EventMask = EventMask(0b010);
    pub const DELETE: EventMask = EventMask(0b100);
    pub const ALL: EventMask = EventMask(0b111);

    pub fn contains(self, kind: ChangeKind) -> bool {
        let bit = match kind {
            ChangeKind::Insert => Self::INSERT.0,
            ChangeKind::Update => Self::UPDATE.0,
            ChangeKind::Delete => Self::DELETE.0,
        };
        self.0 & bit != 0
    }
}

impl std::ops::BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

/// An upstream mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    /// Identifier of the affected row, when known.
    pub id: Option<String>,
}

/// Source of change notifications.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, tables: &[Table], mask: EventMask) -> Subscription;
}

/// A filtered stream of [`ChangeEvent`]s. Dropping it unsubscribes.
pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
    tables: Vec<Table>,
    mask: EventMask,
}

impl Subscription {
    pub(crate) fn new(
        rx: broadcast::Receiver<ChangeEvent>,
        tables: &[Table],
        mask: EventMask,
    ) -> Self {
        Self {
            rx,
            tables: tables.to_vec(),
            mask,
        }
    }

    fn wants(&self, event: &ChangeEvent) -> bool {
        self.tables.contains(&event.table) && self.mask.contains(event.kind)
    }

    /// Next matching event, or `None` once the feed has closed.
    ///
    /// If the subscriber fell behind and events were dropped, a synthetic update without
    /// an id is returned so the caller recomputes from scratch.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("change subscription lagged, {} events dropped", skipped);
                    let table = self.tables.first().copied()?;
                    return Some(ChangeEvent {
                        table,
                        kind: ChangeKind::Update,
                        id: None,
                    });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn range_filters_compare_iso_dates_lexicographically() {
        let r = row(json!({ "created_at": "2026-10-18T21:00:00Z" }));
        assert!(Filter::gte("created_at", "2026-10-18").matches(&r));
        assert!(Filter::lt("created_at", "2026-10-19").matches(&r));
        assert!(!Filter::lt("created_at", "2026-10-18").matches(&r));
    }

    #[test]
    fn range_filters_compare_timestamps_by_instant() {
        // 12:00Z written with the clinic offset
        let r = row(json!({ "created_at": "2026-10-18T09:00:00-03:00" }));
        assert!(Filter::gte("created_at", "2026-10-18T10:00:00Z").matches(&r));
        assert!(!Filter::lt("created_at", "2026-10-18T12:00:00Z").matches(&r));
        assert!(Filter::lt("created_at", "2026-10-18T12:00:00.5+00:00").matches(&r));

        let fractional = row(json!({ "created_at": "2026-10-18T12:00:00.250+00:00" }));
        assert!(Filter::gte("created_at", "2026-10-18T12:00:00Z").matches(&fractional));
        assert!(!Filter::gte("created_at", "2026-10-18T12:00:01Z").matches(&fractional));
    }

    #[test]
    fn range_filters_never_match_mixed_types() {
        let r = row(json!({ "duration": 30 }));
        assert!(Filter::gte("duration", 30).matches(&r));
        assert!(!Filter::gte("duration", "30").matches(&r));
        assert!(!Filter::gte("missing", 1).matches(&r));
    }

    #[test]
    fn contains_is_case_insensitive_and_any_ors() {
        let r = row(json!({ "name": "Joana Silva", "cpf": "111.222.333-44" }));
        assert!(Filter::contains("name", "SILVA").matches(&r));
        let either = Filter::Any(vec![
            Filter::contains("name", "souza"),
            Filter::contains("cpf", "222"),
        ]);
        assert!(either.matches(&r));
        assert!(!Filter::contains("cpf", "999").matches(&r));
    }

    #[test]
    fn membership_filter() {
        let r = row(json!({ "status": "Ativa" }));
        assert!(Filter::one_of("status", ["Ativa", "Alta"]).matches(&r));
        assert!(!Filter::one_of("status", ["Alta"]).matches(&r));
    }

    #[test]
    fn event_mask_combines() {
        let mask = EventMask::INSERT | EventMask::DELETE;
        assert!(mask.contains(ChangeKind::Insert));
        assert!(!mask.contains(ChangeKind::Update));
        assert!(EventMask::ALL.contains(ChangeKind::Update));
    }

    #[tokio::test]
    async fn subscription_filters_tables_and_kinds() {
        let (tx, rx) = broadcast::channel(8);
        let mut sub = Subscription::new(rx, &[Table::Beds], EventMask::UPDATE);

        tx.send(ChangeEvent {
            table: Table::Patients,
            kind: ChangeKind::Update,
            id: None,
        })
        .unwrap();
        tx.send(ChangeEvent {
            table: Table::Beds,
            kind: ChangeKind::Insert,
            id: Some("a".into()),
        })
        .unwrap();
        tx.send(ChangeEvent {
            table: Table::Beds,
            kind: ChangeKind::Update,
            id: Some("b".into()),
        })
        .unwrap();
        drop(tx);

        let event = sub.next().await.expect("matching event");
        assert_eq!(event.id.as_deref(), Some("b"));
        assert!(sub.next().await.is_none());
    }
}
