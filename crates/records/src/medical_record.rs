//! Electronic medical record headers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Record;

/// The header of a patient's chart; entries live in a separate table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub record_number: String,
}

impl Record for MedicalRecord {
    const TABLE: &'static str = "medical_records";
}
