//! Scheduled appointments, in person or by video.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Record;

wire_enum! {
    /// Lifecycle of an appointment.
    AppointmentStatus, "appointment status" {
        Scheduled => "Agendado",
        Confirmed => "Confirmado",
        InProgress => "Em atendimento",
        Completed => "Concluído",
        Cancelled => "Cancelado",
    }
}

fn default_duration() -> u32 {
    30
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    #[serde(default)]
    pub professional_id: Option<Uuid>,
    pub appointment_date: NaiveDate,
    #[serde(with = "crate::wire::clock_time")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "14:30:00"))]
    pub appointment_time: NaiveTime,
    /// Length in minutes.
    #[serde(default = "default_duration")]
    pub duration: u32,
    /// Free-text consultation type ("Consulta", "Retorno", ...).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub is_video: bool,
    pub status: AppointmentStatus,
}

impl Appointment {
    /// Start instant, reading date and time as wall-clock time at the clinic's offset.
    pub fn starts_at(&self, clinic: &FixedOffset) -> Option<DateTime<FixedOffset>> {
        clinic
            .from_local_datetime(&self.appointment_date.and_time(self.appointment_time))
            .single()
    }
}

impl Record for Appointment {
    const TABLE: &'static str = "appointments";
}
