//! Inpatient admissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Record;

wire_enum! {
    /// Clinical condition recorded on admission.
    Condition, "condition" {
        Critical => "Crítico",
        Stable => "Estável",
        Recovering => "Recuperação",
    }
}

wire_enum! {
    AdmissionStatus, "admission status" {
        Active => "Ativa",
        Discharged => "Alta",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Admission {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub bed_id: Uuid,
    #[serde(default)]
    pub professional_id: Option<Uuid>,
    pub condition: Condition,
    pub status: AdmissionStatus,
    #[serde(default)]
    pub diagnosis: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Admission {
    pub fn is_active(&self) -> bool {
        self.status == AdmissionStatus::Active
    }

    pub fn is_critical(&self) -> bool {
        self.condition == Condition::Critical
    }
}

impl Record for Admission {
    const TABLE: &'static str = "admissions";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_active_critical_admission() {
        let row = json!({
            "id": "5d9c3f0a-9a34-4f43-8d1c-0f35b0a8e001",
            "patient_id": "0c4c6f3e-4a3a-4d8e-b1a8-8c7f1e0b2d22",
            "bed_id": "8f7e8a8e-2d2b-4c1a-9d55-6d4cbe0b6a11",
            "condition": "Crítico",
            "status": "Ativa",
            "admission_date": "2026-10-19",
            "created_at": "2026-10-19T03:00:00Z"
        });
        let admission = Admission::from_row(row.as_object().cloned().unwrap()).expect("decode");
        assert!(admission.is_active());
        assert!(admission.is_critical());
        assert!(admission.diagnosis.is_none());
    }

    #[test]
    fn discharged_is_not_active() {
        assert_eq!(AdmissionStatus::from_wire("Alta"), Some(AdmissionStatus::Discharged));
        assert_eq!(Condition::Recovering.to_string(), "Recuperação");
    }
}
