//! Hospital beds.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Record;

wire_enum! {
    /// Occupancy state of a bed.
    BedStatus, "bed status" {
        Available => "Disponível",
        Occupied => "Ocupado",
        Maintenance => "Manutenção",
    }
}

/// A single bed in a department.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Bed {
    pub id: Uuid,
    #[serde(default)]
    pub bed_number: String,
    pub department: String,
    pub status: BedStatus,
}

impl Bed {
    pub fn is_occupied(&self) -> bool {
        self.status == BedStatus::Occupied
    }
}

impl Record for Bed {
    const TABLE: &'static str = "beds";
}
