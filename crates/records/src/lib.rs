//! Typed hospital records and boundary validation.
//!
//! The record store hands back loosely-typed JSON rows. This crate turns them into explicit
//! per-entity records before any aggregation touches them:
//! - enumerations carry the backend wire values (`"Ocupado"`, `"Ativa"`, ...)
//! - timestamps and dates are parsed once, here
//! - rows that fail validation are dropped at the boundary with a warning
//!
//! Records are immutable snapshots; nothing in this crate talks to the store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Declares a closed enumeration backed by backend wire strings.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Backend wire value.
            pub fn as_wire(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Parse from the backend wire value.
            pub fn from_wire(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_wire())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::RecordError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_wire(s).ok_or_else(|| $crate::RecordError::UnknownValue {
                    field: $field,
                    value: s.to_owned(),
                })
            }
        }
    };
}

pub mod admission;
pub mod appointment;
pub mod audit;
pub mod bed;
pub mod medical_record;
pub mod patient;
pub mod professional;
mod wire;

pub use admission::{Admission, AdmissionStatus, Condition};
pub use appointment::{Appointment, AppointmentStatus};
pub use audit::{AuditLog, AuditStatus, LogType};
pub use bed::{Bed, BedStatus};
pub use medical_record::MedicalRecord;
pub use patient::{Patient, PatientStatus};
pub use professional::Professional;

/// A raw row as returned by the record store: column name to JSON value.
pub type Row = serde_json::Map<String, Value>;

/// Errors returned by the `records` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid {table} row: {source}")]
    Decode {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {table} record: {source}")]
    Encode {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown {field}: {value:?}")]
    UnknownValue { field: &'static str, value: String },
}

/// Type alias for Results that can fail with a [`RecordError`].
pub type RecordResult<T> = Result<T, RecordError>;

/// A typed view of one row of a record store table.
pub trait Record: Serialize + DeserializeOwned {
    /// Name of the backing table.
    const TABLE: &'static str;

    /// Validate and convert a raw row.
    fn from_row(row: Row) -> RecordResult<Self> {
        serde_json::from_value(Value::Object(row)).map_err(|source| RecordError::Decode {
            table: Self::TABLE,
            source,
        })
    }

    /// Convert back into a raw row (used when seeding stores).
    fn to_row(&self) -> RecordResult<Row> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(RecordError::Encode {
                table: Self::TABLE,
                source: <serde_json::Error as serde::ser::Error>::custom(
                    "record did not serialise to an object",
                ),
            }),
            Err(source) => Err(RecordError::Encode {
                table: Self::TABLE,
                source,
            }),
        }
    }
}

/// Decode a batch of rows, dropping (and logging) any row that fails validation.
pub fn decode_rows<T: Record>(rows: Vec<Row>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match T::from_row(row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("skipping invalid row: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn decode_rows_skips_invalid_rows() {
        let rows = vec![
            row(json!({
                "id": "8f7e8a8e-2d2b-4c1a-9d55-6d4cbe0b6a11",
                "bed_number": "101",
                "department": "UTI",
                "status": "Ocupado"
            })),
            row(json!({
                "id": "0c4c6f3e-4a3a-4d8e-b1a8-8c7f1e0b2d22",
                "bed_number": "102",
                "department": "UTI",
                "status": "Quebrado"
            })),
            row(json!({ "department": "UTI", "status": "Disponível" })),
        ];

        let beds: Vec<Bed> = decode_rows(rows);
        assert_eq!(beds.len(), 1);
        assert_eq!(beds[0].status, BedStatus::Occupied);
    }

    #[test]
    fn from_str_reports_the_field() {
        let err = "Quebrado".parse::<BedStatus>().unwrap_err();
        match err {
            RecordError::UnknownValue { field, value } => {
                assert_eq!(field, "bed status");
                assert_eq!(value, "Quebrado");
            }
            other => panic!("expected UnknownValue, got {other:?}"),
        }
    }

    #[test]
    fn to_row_round_trips_wire_values() {
        let bed = Bed {
            id: uuid::Uuid::from_u128(7),
            bed_number: "7".into(),
            department: "Pediatria".into(),
            status: BedStatus::Maintenance,
        };
        let row = bed.to_row().expect("encode");
        assert_eq!(row["status"], json!("Manutenção"));
        assert_eq!(Bed::from_row(row).expect("decode"), bed);
    }
}
