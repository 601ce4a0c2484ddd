//! Notification feed.
//!
//! A point-in-time snapshot recomputed on every call: nothing is persisted, so entries expire as
//! soon as a later `now` moves them outside their window.

use crate::clock::{clinic_date, date_bound, timestamp_bound};
use crate::constants::{
    APPOINTMENT_LOOKAHEAD_MINUTES, NOTIFICATION_ADMISSION_FETCH_LIMIT,
    NOTIFICATION_APPOINTMENT_FETCH_LIMIT, NOTIFICATION_LIMIT, NOTIFICATION_PATIENT_FETCH_LIMIT,
    RECENT_EVENT_LOOKBACK_HOURS,
};
use crate::store::{Filter, Query, RecordStore, Table};
use crate::WardResult;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use records::{
    decode_rows, Admission, AdmissionStatus, Appointment, AppointmentStatus, Bed, Condition,
    Patient,
};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

const UNKNOWN_PATIENT: &str = "Paciente";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Appointment,
    Admission,
    Patient,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Urgent,
    Normal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// When the event happens (appointments) or happened (admissions, registrations).
    pub time: DateTime<FixedOffset>,
    pub severity: Severity,
}

/// A scheduled appointment with its start resolved at the clinic offset.
#[derive(Clone, Debug, PartialEq)]
pub struct UpcomingAppointment {
    pub id: Uuid,
    pub patient_name: Option<String>,
    pub kind: String,
    pub is_video: bool,
    pub status: AppointmentStatus,
    pub starts_at: DateTime<FixedOffset>,
}

/// An admission joined with its patient and bed.
#[derive(Clone, Debug, PartialEq)]
pub struct RecentAdmission {
    pub id: Uuid,
    pub patient_name: Option<String>,
    pub department: Option<String>,
    pub bed_number: Option<String>,
    pub condition: Condition,
    pub status: AdmissionStatus,
    pub created_at: DateTime<Utc>,
}

fn name_or_default(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or(UNKNOWN_PATIENT)
}

/// Build the feed from already-fetched inputs.
///
/// - appointments: scheduled ones starting in `(0, 60]` whole minutes from `now`
/// - admissions: active ones created in the last 24 hours; critical ones are urgent
/// - patients: registered in the last 24 hours
///
/// The merged list is ordered most recent first and truncated to ten entries.
pub fn build_notifications(
    appointments: &[UpcomingAppointment],
    admissions: &[RecentAdmission],
    patients: &[Patient],
    now: DateTime<FixedOffset>,
) -> Vec<Notification> {
    let offset = *now.offset();
    let since = now.with_timezone(&Utc) - Duration::hours(RECENT_EVENT_LOOKBACK_HOURS);
    let mut feed = Vec::new();

    for apt in appointments {
        if apt.status != AppointmentStatus::Scheduled {
            continue;
        }
        let minutes = (apt.starts_at - now).num_minutes();
        if minutes <= 0 || minutes > APPOINTMENT_LOOKAHEAD_MINUTES {
            continue;
        }
        feed.push(Notification {
            id: format!("apt-{}", apt.id),
            kind: NotificationKind::Appointment,
            title: if apt.is_video {
                "Teleconsulta".to_owned()
            } else {
                apt.kind.clone()
            },
            message: format!(
                "{} em {} minutos",
                name_or_default(&apt.patient_name),
                minutes
            ),
            time: apt.starts_at,
            severity: Severity::Normal,
        });
    }

    for adm in admissions {
        if adm.status != AdmissionStatus::Active || adm.created_at < since {
            continue;
        }
        let critical = adm.condition == Condition::Critical;
        feed.push(Notification {
            id: format!("adm-{}", adm.id),
            kind: NotificationKind::Admission,
            title: if critical {
                "Internação Urgente"
            } else {
                "Nova Internação"
            }
            .to_owned(),
            message: format!(
                "{} - {} (Leito {})",
                name_or_default(&adm.patient_name),
                adm.department.as_deref().unwrap_or("-"),
                adm.bed_number.as_deref().unwrap_or("-"),
            ),
            time: adm.created_at.with_timezone(&offset),
            severity: if critical {
                Severity::Urgent
            } else {
                Severity::Normal
            },
        });
    }

    for patient in patients {
        if patient.created_at < since {
            continue;
        }
        feed.push(Notification {
            id: format!("patient-{}", patient.id),
            kind: NotificationKind::Patient,
            title: "Novo Paciente".to_owned(),
            message: format!("{} foi cadastrado", patient.name),
            time: patient.created_at.with_timezone(&offset),
            severity: Severity::Normal,
        });
    }

    // Stable: equal timestamps keep group order.
    feed.sort_by(|a, b| b.time.cmp(&a.time));
    feed.truncate(NOTIFICATION_LIMIT);
    feed
}

/// Short age of an event relative to `now`: "Agora", "12 min", "5h" or "dd/MM".
pub fn relative_time_label(time: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> String {
    let elapsed = now - time;
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "Agora".to_owned();
    }
    if minutes < 60 {
        return format!("{minutes} min");
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{hours}h");
    }
    time.format("%d/%m").to_string()
}

pub(crate) async fn patient_names(
    store: &dyn RecordStore,
    ids: Vec<Uuid>,
) -> WardResult<HashMap<Uuid, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let query = Query::new().filter(Filter::one_of("id", ids.iter().map(Uuid::to_string)));
    let rows = store.query(Table::Patients, &query).await?;
    Ok(decode_rows::<Patient>(rows)
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect())
}

async fn beds_by_id(store: &dyn RecordStore, ids: Vec<Uuid>) -> WardResult<HashMap<Uuid, Bed>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let query = Query::new().filter(Filter::one_of("id", ids.iter().map(Uuid::to_string)));
    let rows = store.query(Table::Beds, &query).await?;
    Ok(decode_rows::<Bed>(rows)
        .into_iter()
        .map(|b| (b.id, b))
        .collect())
}

/// Query the store for the feed's inputs and build it.
pub async fn fetch_notifications(
    store: &dyn RecordStore,
    now: DateTime<FixedOffset>,
) -> WardResult<Vec<Notification>> {
    let offset = *now.offset();
    let since =
        timestamp_bound(now.with_timezone(&Utc) - Duration::hours(RECENT_EVENT_LOOKBACK_HOURS));

    let appointments_query = Query::new()
        .filter(Filter::equals("appointment_date", date_bound(clinic_date(now, 0))))
        .filter(Filter::equals("status", AppointmentStatus::Scheduled.as_wire()))
        .order_by("appointment_time", true)
        .limit(NOTIFICATION_APPOINTMENT_FETCH_LIMIT);
    let admissions_query = Query::new()
        .filter(Filter::gte("created_at", since.as_str()))
        .filter(Filter::equals("status", AdmissionStatus::Active.as_wire()))
        .order_by("created_at", false)
        .limit(NOTIFICATION_ADMISSION_FETCH_LIMIT);
    let patients_query = Query::new()
        .filter(Filter::gte("created_at", since.as_str()))
        .order_by("created_at", false)
        .limit(NOTIFICATION_PATIENT_FETCH_LIMIT);

    let (appointment_rows, admission_rows, patient_rows) = tokio::try_join!(
        store.query(Table::Appointments, &appointments_query),
        store.query(Table::Admissions, &admissions_query),
        store.query(Table::Patients, &patients_query),
    )?;
    let appointments: Vec<Appointment> = decode_rows(appointment_rows);
    let admissions: Vec<Admission> = decode_rows(admission_rows);
    let patients: Vec<Patient> = decode_rows(patient_rows);

    let mut patient_ids: Vec<Uuid> = appointments
        .iter()
        .map(|a| a.patient_id)
        .chain(admissions.iter().map(|a| a.patient_id))
        .collect();
    patient_ids.sort_unstable();
    patient_ids.dedup();
    let bed_ids: Vec<Uuid> = admissions.iter().map(|a| a.bed_id).collect();

    let (names, beds) = tokio::try_join!(
        patient_names(store, patient_ids),
        beds_by_id(store, bed_ids)
    )?;

    let upcoming: Vec<UpcomingAppointment> = appointments
        .into_iter()
        .filter_map(|apt| {
            let starts_at = apt.starts_at(&offset)?;
            Some(UpcomingAppointment {
                id: apt.id,
                patient_name: names.get(&apt.patient_id).cloned(),
                kind: apt.kind,
                is_video: apt.is_video,
                status: apt.status,
                starts_at,
            })
        })
        .collect();
    let recent: Vec<RecentAdmission> = admissions
        .into_iter()
        .map(|adm| {
            let bed = beds.get(&adm.bed_id);
            RecentAdmission {
                id: adm.id,
                patient_name: names.get(&adm.patient_id).cloned(),
                department: bed.map(|b| b.department.clone()),
                bed_number: bed.map(|b| b.bed_number.clone()),
                condition: adm.condition,
                status: adm.status,
                created_at: adm.created_at,
            }
        })
        .collect();

    Ok(build_notifications(&upcoming, &recent, &patients, now))
}
