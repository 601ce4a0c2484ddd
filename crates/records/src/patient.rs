//! Registered patients.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Record;

wire_enum! {
    /// Care status shown in the patient registry.
    PatientStatus, "patient status" {
        Active => "Ativo",
        InTreatment => "Em tratamento",
        Admitted => "Internado",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    /// National identifier (CPF).
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    pub status: PatientStatus,
    pub created_at: DateTime<Utc>,
}

impl Record for Patient {
    const TABLE: &'static str = "patients";
}
