//! Audit log viewer.
//!
//! Loads the latest entries, filters them on several predicates at once, derives security
//! alerts, and computes the headline statistics from concurrent counts.

use crate::clock::{clinic_date, day_start_utc, timestamp_bound};
use crate::constants::{AUDIT_LOG_FETCH_LIMIT, SECURITY_ALERT_LIMIT};
use crate::store::{Filter, Query, RecordStore, Table};
use crate::{WardError, WardResult};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use records::{decode_rows, AuditLog, AuditStatus, LogType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wardboard_types::SearchTerm;

/// Tabs of the audit page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AuditTab {
    #[default]
    #[serde(rename = "todos")]
    All,
    /// Failures, blocked attempts and security events.
    #[serde(rename = "seguranca")]
    Security,
    /// Reads and authentications.
    #[serde(rename = "acessos")]
    Access,
    /// Writes.
    #[serde(rename = "modificacoes")]
    Changes,
}

impl AuditTab {
    pub fn admits(self, log: &AuditLog) -> bool {
        match self {
            AuditTab::All => true,
            AuditTab::Security => log.is_problem() || log.log_type == LogType::Security,
            AuditTab::Access => matches!(log.log_type, LogType::Read | LogType::Authentication),
            AuditTab::Changes => log.log_type == LogType::Write,
        }
    }
}

impl std::str::FromStr for AuditTab {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todos" | "all" => Ok(AuditTab::All),
            "seguranca" | "security" => Ok(AuditTab::Security),
            "acessos" | "access" => Ok(AuditTab::Access),
            "modificacoes" | "changes" => Ok(AuditTab::Changes),
            other => Err(WardError::InvalidInput(format!("unknown audit tab {other:?}"))),
        }
    }
}

/// Every predicate of the audit viewer. Unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuditFilter {
    /// Matched against user, action and resource.
    pub search: Option<SearchTerm>,
    pub tab: AuditTab,
    /// Inclusive, compared against the UTC date of the entry.
    pub date_from: Option<NaiveDate>,
    /// Inclusive, compared against the UTC date of the entry.
    pub date_to: Option<NaiveDate>,
    pub status: Option<AuditStatus>,
    pub log_type: Option<LogType>,
    pub resource: Option<String>,
}

impl AuditFilter {
    /// True when anything beyond search and tab is set.
    pub fn has_active_filters(&self) -> bool {
        self.date_from.is_some()
            || self.date_to.is_some()
            || self.status.is_some()
            || self.log_type.is_some()
            || self.resource.is_some()
    }

    /// Reset the advanced filters, keeping search and tab.
    pub fn clear(&mut self) {
        self.date_from = None;
        self.date_to = None;
        self.status = None;
        self.log_type = None;
        self.resource = None;
    }

    pub fn matches(&self, log: &AuditLog) -> bool {
        let day = log.created_at.date_naive();
        self.search.as_ref().map_or(true, |term| {
            term.matches_any([
                log.user_name.as_str(),
                log.action.as_str(),
                log.resource.as_str(),
            ])
        }) && self.tab.admits(log)
            && self.date_from.map_or(true, |from| day >= from)
            && self.date_to.map_or(true, |to| day <= to)
            && self.status.map_or(true, |s| log.status == s)
            && self.log_type.map_or(true, |t| log.log_type == t)
            && self.resource.as_deref().map_or(true, |r| log.resource == r)
    }

    pub fn apply<'a>(&self, logs: &'a [AuditLog]) -> Vec<&'a AuditLog> {
        logs.iter().filter(|log| self.matches(log)).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AlertSeverity {
    #[serde(rename = "alta")]
    High,
    #[serde(rename = "media")]
    Medium,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SecurityAlert {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub at: DateTime<Utc>,
    pub severity: AlertSeverity,
}

/// The first five failed or blocked entries, in input order. Blocked attempts are high severity.
pub fn security_alerts(logs: &[AuditLog]) -> Vec<SecurityAlert> {
    logs.iter()
        .filter(|log| log.is_problem())
        .take(SECURITY_ALERT_LIMIT)
        .map(|log| {
            let blocked = log.status == AuditStatus::Blocked;
            SecurityAlert {
                id: log.id,
                title: if blocked {
                    "Tentativa bloqueada"
                } else {
                    "Ação com falha"
                }
                .to_owned(),
                description: format!("{} em {}", log.action, log.resource),
                at: log.created_at,
                severity: if blocked {
                    AlertSeverity::High
                } else {
                    AlertSeverity::Medium
                },
            }
        })
        .collect()
}

/// Distinct resources in first-seen order.
pub fn unique_resources(logs: &[AuditLog]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    logs.iter()
        .filter(|log| seen.insert(log.resource.as_str()))
        .map(|log| log.resource.clone())
        .collect()
}

/// What the audit page shows for a given filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuditView {
    pub logs: Vec<AuditLog>,
    pub alerts: Vec<SecurityAlert>,
    pub resources: Vec<String>,
}

/// Alerts and resources come from every loaded entry; only `logs` is filtered.
pub fn audit_view(logs: &[AuditLog], filter: &AuditFilter) -> AuditView {
    AuditView {
        logs: filter.apply(logs).into_iter().cloned().collect(),
        alerts: security_alerts(logs),
        resources: unique_resources(logs),
    }
}

/// Latest audit entries, newest first.
pub async fn fetch_audit_logs(store: &dyn RecordStore) -> WardResult<Vec<AuditLog>> {
    let query = Query::new()
        .order_by("created_at", false)
        .limit(AUDIT_LOG_FETCH_LIMIT);
    Ok(decode_rows(store.query(Table::AuditLogs, &query).await?))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuditStats {
    pub today_events: u64,
    /// Percentage of successful entries with one decimal; 100.0 when there are none.
    pub success_rate: f64,
    pub active_alerts: u64,
    pub blocked_attempts: u64,
}

pub fn compute_audit_stats(
    today_events: u64,
    successes: u64,
    total: u64,
    active_alerts: u64,
    blocked_attempts: u64,
) -> AuditStats {
    let success_rate = if total == 0 {
        100.0
    } else {
        (successes as f64 / total as f64 * 1000.0).round() / 10.0
    };
    AuditStats {
        today_events,
        success_rate,
        active_alerts,
        blocked_attempts,
    }
}

/// Count the statistics concurrently. "Today" starts at clinic midnight.
pub async fn load_audit_stats(
    store: &dyn RecordStore,
    now: DateTime<FixedOffset>,
) -> WardResult<AuditStats> {
    let today_start = timestamp_bound(day_start_utc(clinic_date(now, 0), *now.offset()));
    let today = [Filter::gte("created_at", today_start)];
    let successes = [Filter::equals("status", AuditStatus::Success.as_wire())];
    let problems = [Filter::one_of(
        "status",
        [AuditStatus::Failed.as_wire(), AuditStatus::Blocked.as_wire()],
    )];
    let blocked = [Filter::equals("status", AuditStatus::Blocked.as_wire())];

    let (today_events, successes, total, active_alerts, blocked_attempts) = tokio::try_join!(
        store.count(Table::AuditLogs, &today),
        store.count(Table::AuditLogs, &successes),
        store.count(Table::AuditLogs, &[]),
        store.count(Table::AuditLogs, &problems),
        store.count(Table::AuditLogs, &blocked),
    )?;

    Ok(compute_audit_stats(
        today_events,
        successes,
        total,
        active_alerts,
        blocked_attempts,
    ))
}
