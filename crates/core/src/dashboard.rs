//! Dashboard KPIs.
//!
//! [`compute_dashboard_stats`] is the pure part. [`fetch_dashboard`] issues the seven
//! independent store requests concurrently and keeps one result per slot, so a failing request
//! only zeroes its own figures. [`load_dashboard`] combines the two and never fails.

use crate::clock::{clinic_date, date_bound, day_start_utc, timestamp_bound};
use crate::occupancy::{aggregate_occupancy, occupancy_percentage, DepartmentOccupancy};
use crate::store::{Filter, Query, RecordStore, Table};
use crate::WardResult;
use chrono::{DateTime, FixedOffset};
use records::{decode_rows, AdmissionStatus, AppointmentStatus, Bed};
use serde::Serialize;

pub const PATIENTS_TREND_LABEL: &str = "novos ontem";
pub const APPOINTMENTS_TREND_LABEL: &str = "vs semana";
pub const ADMISSIONS_TREND_LABEL: &str = "novas ontem";

/// Raw inputs of the dashboard, one field per store request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawCounts {
    pub total_patients: u64,
    pub patients_yesterday: u64,
    pub scheduled_appointments: u64,
    pub appointments_last_week: u64,
    pub beds: Vec<Bed>,
    pub active_admissions: u64,
    pub admissions_yesterday: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Trend {
    pub value: i64,
    pub label: String,
}

impl Trend {
    fn new(value: i64, label: &str) -> Self {
        Self {
            value,
            label: label.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DashboardStats {
    pub total_patients: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patients_trend: Option<Trend>,
    pub scheduled_appointments: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointments_trend: Option<Trend>,
    pub occupied_beds: u32,
    pub total_beds: u32,
    pub occupancy_percentage: u32,
    pub active_admissions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admissions_trend: Option<Trend>,
}

/// Percentage change from `previous` to `current`, rounded half up.
///
/// A zero baseline yields 100 when `current` is positive and 0 otherwise.
pub fn trend(current: u64, previous: u64) -> i64 {
    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }
    let delta = 100 * (i128::from(current) - i128::from(previous));
    let previous = i128::from(previous);
    (2 * delta + previous).div_euclid(2 * previous) as i64
}

/// Derive the dashboard KPIs. Trends are attached only when their baseline count is non-zero.
pub fn compute_dashboard_stats(counts: &RawCounts) -> DashboardStats {
    let occupied_beds = counts.beds.iter().filter(|b| b.is_occupied()).count() as u32;
    let total_beds = counts.beds.len() as u32;

    // The patients baseline is today's total minus yesterday's registrations.
    let patients_trend = (counts.patients_yesterday > 0).then(|| {
        let baseline = counts.total_patients.saturating_sub(counts.patients_yesterday);
        Trend::new(trend(counts.total_patients, baseline), PATIENTS_TREND_LABEL)
    });
    let appointments_trend = (counts.appointments_last_week > 0).then(|| {
        Trend::new(
            trend(counts.scheduled_appointments, counts.appointments_last_week),
            APPOINTMENTS_TREND_LABEL,
        )
    });
    let admissions_trend = (counts.admissions_yesterday > 0).then(|| {
        Trend::new(counts.admissions_yesterday as i64, ADMISSIONS_TREND_LABEL)
    });

    DashboardStats {
        total_patients: counts.total_patients,
        patients_trend,
        scheduled_appointments: counts.scheduled_appointments,
        appointments_trend,
        occupied_beds,
        total_beds,
        occupancy_percentage: occupancy_percentage(occupied_beds, total_beds),
        active_admissions: counts.active_admissions,
        admissions_trend,
    }
}

/// Identifies one of the concurrent dashboard requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CountSlot {
    PatientsTotal,
    PatientsYesterday,
    AppointmentsScheduled,
    AppointmentsLastWeek,
    Beds,
    AdmissionsActive,
    AdmissionsYesterday,
}

impl std::fmt::Display for CountSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CountSlot::PatientsTotal => "patients_total",
            CountSlot::PatientsYesterday => "patients_yesterday",
            CountSlot::AppointmentsScheduled => "appointments_scheduled",
            CountSlot::AppointmentsLastWeek => "appointments_last_week",
            CountSlot::Beds => "beds",
            CountSlot::AdmissionsActive => "admissions_active",
            CountSlot::AdmissionsYesterday => "admissions_yesterday",
        };
        f.write_str(name)
    }
}

/// A request that failed and was degraded to zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SlotFailure {
    pub slot: CountSlot,
    /// Friendly message for display.
    pub message: String,
}

/// Per-slot outcome of the concurrent dashboard requests.
#[derive(Debug)]
pub struct DashboardFetch {
    pub patients_total: WardResult<u64>,
    pub patients_yesterday: WardResult<u64>,
    pub appointments_scheduled: WardResult<u64>,
    pub appointments_last_week: WardResult<u64>,
    pub beds: WardResult<Vec<Bed>>,
    pub admissions_active: WardResult<u64>,
    pub admissions_yesterday: WardResult<u64>,
}

fn settle<T: Default>(slot: CountSlot, result: WardResult<T>, failures: &mut Vec<SlotFailure>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("fetch_dashboard_stats: {} failed: {}", slot, e);
            failures.push(SlotFailure {
                slot,
                message: e.user_message().to_owned(),
            });
            T::default()
        }
    }
}

impl DashboardFetch {
    /// Collapse the slots into counts, degrading each failed slot to zero.
    pub fn into_counts(self) -> (RawCounts, Vec<SlotFailure>) {
        let mut failures = Vec::new();
        let counts = RawCounts {
            total_patients: settle(CountSlot::PatientsTotal, self.patients_total, &mut failures),
            patients_yesterday: settle(
                CountSlot::PatientsYesterday,
                self.patients_yesterday,
                &mut failures,
            ),
            scheduled_appointments: settle(
                CountSlot::AppointmentsScheduled,
                self.appointments_scheduled,
                &mut failures,
            ),
            appointments_last_week: settle(
                CountSlot::AppointmentsLastWeek,
                self.appointments_last_week,
                &mut failures,
            ),
            beds: settle(CountSlot::Beds, self.beds, &mut failures),
            active_admissions: settle(
                CountSlot::AdmissionsActive,
                self.admissions_active,
                &mut failures,
            ),
            admissions_yesterday: settle(
                CountSlot::AdmissionsYesterday,
                self.admissions_yesterday,
                &mut failures,
            ),
        };
        (counts, failures)
    }
}

async fn fetch_beds(store: &dyn RecordStore) -> WardResult<Vec<Bed>> {
    let rows = store.query(Table::Beds, &Query::new()).await?;
    Ok(decode_rows(rows))
}

/// Issue the dashboard requests concurrently and join them.
///
/// "Yesterday" and "last week" are clinic days relative to `now`.
pub async fn fetch_dashboard(store: &dyn RecordStore, now: DateTime<FixedOffset>) -> DashboardFetch {
    let offset = *now.offset();
    let today = clinic_date(now, 0);
    let today_start = timestamp_bound(day_start_utc(today, offset));
    let yesterday_start = timestamp_bound(day_start_utc(clinic_date(now, 1), offset));

    let patients_yesterday = [
        Filter::gte("created_at", yesterday_start.as_str()),
        Filter::lt("created_at", today_start.as_str()),
    ];
    let appointments_scheduled = [
        Filter::equals("status", AppointmentStatus::Scheduled.as_wire()),
        Filter::gte("appointment_date", date_bound(today)),
    ];
    let appointments_last_week = [
        Filter::gte("appointment_date", date_bound(clinic_date(now, 7))),
        Filter::lt("appointment_date", date_bound(today)),
    ];
    let admissions_active = [Filter::equals("status", AdmissionStatus::Active.as_wire())];
    let admissions_yesterday = [
        Filter::equals("status", AdmissionStatus::Active.as_wire()),
        Filter::gte("created_at", yesterday_start.as_str()),
        Filter::lt("created_at", today_start.as_str()),
    ];

    let (
        patients_total,
        patients_yesterday,
        appointments_scheduled,
        appointments_last_week,
        beds,
        admissions_active,
        admissions_yesterday,
    ) = tokio::join!(
        store.count(Table::Patients, &[]),
        store.count(Table::Patients, &patients_yesterday),
        store.count(Table::Appointments, &appointments_scheduled),
        store.count(Table::Appointments, &appointments_last_week),
        fetch_beds(store),
        store.count(Table::Admissions, &admissions_active),
        store.count(Table::Admissions, &admissions_yesterday),
    );

    DashboardFetch {
        patients_total,
        patients_yesterday,
        appointments_scheduled,
        appointments_last_week,
        beds,
        admissions_active,
        admissions_yesterday,
    }
}

/// Everything the dashboard page shows.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DashboardReport {
    pub stats: DashboardStats,
    pub occupancy: Vec<DepartmentOccupancy>,
    /// Requests that failed; their figures are shown as zero.
    pub failures: Vec<SlotFailure>,
}

pub async fn load_dashboard(store: &dyn RecordStore, now: DateTime<FixedOffset>) -> DashboardReport {
    let (counts, failures) = fetch_dashboard(store, now).await.into_counts();
    DashboardReport {
        stats: compute_dashboard_stats(&counts),
        occupancy: aggregate_occupancy(&counts.beds),
        failures,
    }
}
