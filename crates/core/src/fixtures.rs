//! Record builders and store doubles shared by the unit tests.

use crate::store::{Filter, MemoryStore, Query, RecordStore, Table};
use crate::{WardError, WardResult};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use records::{
    Admission, AdmissionStatus, Appointment, AppointmentStatus, AuditLog, AuditStatus, Bed,
    BedStatus, Condition, LogType, MedicalRecord, Patient, PatientStatus, Professional, Row,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

pub fn at(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap()
}

pub fn utc(rfc3339: &str) -> DateTime<Utc> {
    at(rfc3339).with_timezone(&Utc)
}

pub fn bed(department: &str, status: BedStatus) -> Bed {
    Bed {
        id: Uuid::new_v4(),
        bed_number: String::new(),
        department: department.to_owned(),
        status,
    }
}

pub fn patient(name: &str, created_at: &str) -> Patient {
    Patient {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        cpf: None,
        birth_date: None,
        status: PatientStatus::Active,
        created_at: utc(created_at),
    }
}

pub fn professional(name: &str, specialty: &str) -> Professional {
    Professional {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        specialty: specialty.to_owned(),
    }
}

pub fn medical_record(patient_id: Uuid, record_number: &str) -> MedicalRecord {
    MedicalRecord {
        id: Uuid::new_v4(),
        patient_id,
        record_number: record_number.to_owned(),
    }
}

pub fn appointment(patient_id: Uuid, date: &str, time: &str) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        patient_id,
        professional_id: None,
        appointment_date: date.parse::<NaiveDate>().unwrap(),
        appointment_time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
        duration: 30,
        kind: "Consulta".to_owned(),
        is_video: false,
        status: AppointmentStatus::Scheduled,
    }
}

pub fn admission(patient_id: Uuid, bed_id: Uuid, condition: Condition, created_at: &str) -> Admission {
    Admission {
        id: Uuid::new_v4(),
        patient_id,
        bed_id,
        professional_id: None,
        condition,
        status: AdmissionStatus::Active,
        diagnosis: None,
        created_at: utc(created_at),
    }
}

pub fn audit_log(
    user_name: &str,
    action: &str,
    resource: &str,
    status: AuditStatus,
    log_type: LogType,
    created_at: &str,
) -> AuditLog {
    AuditLog {
        id: Uuid::new_v4(),
        created_at: utc(created_at),
        user_name: user_name.to_owned(),
        action: action.to_owned(),
        resource: resource.to_owned(),
        resource_id: None,
        ip_address: None,
        status,
        log_type,
        details: None,
    }
}

/// A memory store that counts lookups and fails every request against chosen tables.
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing: Vec<Table>,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            failing: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(mut self, table: Table) -> Self {
        self.failing.push(table);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, table: Table) -> WardResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&table) {
            return Err(WardError::Backend {
                status: 503,
                message: format!("{table} unavailable"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn query(&self, table: Table, query: &Query) -> WardResult<Vec<Row>> {
        self.check(table)?;
        self.inner.query(table, query).await
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> WardResult<u64> {
        self.check(table)?;
        self.inner.count(table, filters).await
    }
}
