//! In-process record store.
//!
//! Backs the CLI (loaded from a JSON snapshot) and the test suites. Mutations broadcast
//! [`ChangeEvent`]s so subscribers behave as they would against the managed backend.

use super::{
    compare_values, ChangeEvent, ChangeFeed, ChangeKind, EventMask, Filter, Query, RecordStore,
    Subscription, Table,
};
use crate::constants::CHANGE_CHANNEL_CAPACITY;
use crate::error::{WardError, WardResult};
use async_trait::async_trait;
use records::{Record, Row};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

type Tables = HashMap<Table, Vec<Row>>;

pub struct MemoryStore {
    tables: RwLock<Tables>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            tables: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Build a store from a snapshot document.
    ///
    /// The document is a JSON object keyed by table name (`"beds"`, `"audit_logs"`, ...)
    /// whose values are arrays of rows. Unknown table names are rejected.
    pub fn from_snapshot_json(json: &str) -> WardResult<Self> {
        let tables: Tables = serde_json::from_str(json)?;
        let store = Self::new();
        *store.write() = tables;
        Ok(store)
    }

    /// Load a snapshot file from disk.
    pub fn load(path: &Path) -> WardResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(WardError::SnapshotRead)?;
        let store = Self::from_snapshot_json(&raw)?;
        tracing::info!(
            "loaded snapshot {} ({} rows)",
            path.display(),
            store.row_count()
        );
        Ok(store)
    }

    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }

    /// Insert a raw row, assigning a fresh `id` when it has none. Returns the id.
    pub fn insert(&self, table: Table, mut row: Row) -> String {
        let id = match row_id(&row) {
            Some(id) => id.to_owned(),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                row.insert("id".into(), Value::String(id.clone()));
                id
            }
        };
        self.write().entry(table).or_default().push(row);
        self.notify(table, ChangeKind::Insert, Some(id.clone()));
        id
    }

    /// Insert a typed record into its own table.
    pub fn insert_record<R: Record>(&self, record: &R) -> WardResult<String> {
        let table = Table::from_name(R::TABLE)
            .ok_or_else(|| WardError::InvalidInput(format!("unknown table {}", R::TABLE)))?;
        Ok(self.insert(table, record.to_row()?))
    }

    /// Merge `patch` into the row with the given id.
    pub fn update(&self, table: Table, id: &str, patch: Row) -> WardResult<()> {
        {
            let mut tables = self.write();
            let row = tables
                .get_mut(&table)
                .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(id)))
                .ok_or_else(|| WardError::NotFound {
                    table: table.as_str(),
                    id: id.to_owned(),
                })?;
            row.extend(patch);
        }
        self.notify(table, ChangeKind::Update, Some(id.to_owned()));
        Ok(())
    }

    pub fn delete(&self, table: Table, id: &str) -> WardResult<()> {
        let removed = {
            let mut tables = self.write();
            match tables.get_mut(&table) {
                Some(rows) => {
                    let before = rows.len();
                    rows.retain(|row| row_id(row) != Some(id));
                    rows.len() != before
                }
                None => false,
            }
        };
        if !removed {
            return Err(WardError::NotFound {
                table: table.as_str(),
                id: id.to_owned(),
            });
        }
        self.notify(table, ChangeKind::Delete, Some(id.to_owned()));
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, table: Table, kind: ChangeKind, id: Option<String>) {
        // No receivers is fine.
        let _ = self.changes.send(ChangeEvent { table, kind, id });
    }

    fn matching(&self, table: Table, filters: &[Filter]) -> Vec<Row> {
        self.read()
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

/// Ascending order with nulls last, matching the backend default.
fn order_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn query(&self, table: Table, query: &Query) -> WardResult<Vec<Row>> {
        let mut rows = self.matching(table, &query.filters);
        if let Some(order) = query.order {
            rows.sort_by(|a, b| {
                let ord = order_values(a.get(order.column), b.get(order.column));
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> WardResult<u64> {
        Ok(self.matching(table, filters).len() as u64)
    }
}

impl ChangeFeed for MemoryStore {
    fn subscribe(&self, tables: &[Table], mask: EventMask) -> Subscription {
        Subscription::new(self.changes.subscribe(), tables, mask)
    }
}
