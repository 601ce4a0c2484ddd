//! Bed management summary.
//!
//! Beds are joined with their active admission, then summarised per configured ward. Wards with
//! no beds are left out of the table.

use crate::constants::{WARD_ALERT_PERCENT, WARD_ATTENTION_PERCENT};
use crate::occupancy::occupancy_percentage;
use crate::store::{Filter, Query, RecordStore, Table};
use crate::WardResult;
use records::{decode_rows, Admission, AdmissionStatus, Bed, BedStatus, Condition};
use serde::Serialize;

/// Status shown next to each ward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum WardAlert {
    Normal,
    #[serde(rename = "Atenção")]
    Attention,
    #[serde(rename = "Alerta")]
    Alert,
}

impl WardAlert {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= WARD_ALERT_PERCENT {
            WardAlert::Alert
        } else if percentage >= WARD_ATTENTION_PERCENT {
            WardAlert::Attention
        } else {
            WardAlert::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WardAlert::Normal => "Normal",
            WardAlert::Attention => "Atenção",
            WardAlert::Alert => "Alerta",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BedWithAdmission {
    #[serde(flatten)]
    pub bed: Bed,
    pub admission: Option<Admission>,
}

impl BedWithAdmission {
    pub fn is_critical(&self) -> bool {
        self.admission.as_ref().is_some_and(Admission::is_critical)
    }
}

/// Attach to each bed the first active admission occupying it.
pub fn join_admissions(beds: Vec<Bed>, admissions: &[Admission]) -> Vec<BedWithAdmission> {
    beds.into_iter()
        .map(|bed| {
            let admission = admissions
                .iter()
                .find(|a| a.is_active() && a.bed_id == bed.id)
                .cloned();
            BedWithAdmission { bed, admission }
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DepartmentStatus {
    pub name: String,
    pub total: u32,
    pub occupied: u32,
    pub available: u32,
    /// Beds whose current patient is in critical condition.
    pub critical: u32,
    pub percentage: u32,
    pub alert: WardAlert,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WardTotals {
    pub total_beds: u32,
    pub occupied: u32,
    pub available: u32,
    pub critical_patients: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WardSummary {
    pub totals: WardTotals,
    pub departments: Vec<DepartmentStatus>,
}

fn count(beds: &[&BedWithAdmission], pred: impl Fn(&BedWithAdmission) -> bool) -> u32 {
    beds.iter().filter(|&&b| pred(b)).count() as u32
}

/// Summarise beds over `departments`, in the given order.
///
/// `admissions` are the active admissions; every critical one counts towards the totals even
/// when its bed is not in the listing.
pub fn summarize_wards(
    beds: &[BedWithAdmission],
    admissions: &[Admission],
    departments: &[String],
) -> WardSummary {
    let all: Vec<&BedWithAdmission> = beds.iter().collect();
    let totals = WardTotals {
        total_beds: all.len() as u32,
        occupied: count(&all, |b| b.bed.status == BedStatus::Occupied),
        available: count(&all, |b| b.bed.status == BedStatus::Available),
        critical_patients: admissions
            .iter()
            .filter(|a| a.is_active() && a.condition == Condition::Critical)
            .count() as u32,
    };

    let departments = departments
        .iter()
        .filter_map(|name| {
            let ward: Vec<&BedWithAdmission> =
                beds.iter().filter(|b| &b.bed.department == name).collect();
            if ward.is_empty() {
                return None;
            }
            let total = ward.len() as u32;
            let occupied = count(&ward, |b| b.bed.status == BedStatus::Occupied);
            let percentage = occupancy_percentage(occupied, total);
            Some(DepartmentStatus {
                name: name.clone(),
                total,
                occupied,
                available: count(&ward, |b| b.bed.status == BedStatus::Available),
                critical: count(&ward, BedWithAdmission::is_critical),
                percentage,
                alert: WardAlert::from_percentage(percentage),
            })
        })
        .collect();

    WardSummary {
        totals,
        departments,
    }
}

/// Listing filter of the bed grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BedFilter {
    pub department: Option<String>,
    pub status: Option<BedStatus>,
}

impl BedFilter {
    pub fn has_active_filters(&self) -> bool {
        self.department.is_some() || self.status.is_some()
    }

    pub fn matches(&self, bed: &Bed) -> bool {
        self.department.as_deref().map_or(true, |d| bed.department == d)
            && self.status.map_or(true, |s| bed.status == s)
    }
}

/// The bed management page: summary over every bed plus the filtered listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WardBoard {
    pub summary: WardSummary,
    pub beds: Vec<BedWithAdmission>,
}

/// Load beds (by bed number) and active admissions concurrently, then summarise.
pub async fn load_ward_board(
    store: &dyn RecordStore,
    departments: &[String],
    filter: &BedFilter,
) -> WardResult<WardBoard> {
    let beds_query = Query::new().order_by("bed_number", true);
    let admissions_query =
        Query::new().filter(Filter::equals("status", AdmissionStatus::Active.as_wire()));

    let (bed_rows, admission_rows) = tokio::try_join!(
        store.query(Table::Beds, &beds_query),
        store.query(Table::Admissions, &admissions_query),
    )?;
    let admissions: Vec<Admission> = decode_rows(admission_rows);
    let beds = join_admissions(decode_rows(bed_rows), &admissions);

    let summary = summarize_wards(&beds, &admissions, departments);
    let beds = beds.into_iter().filter(|b| filter.matches(&b.bed)).collect();
    Ok(WardBoard { summary, beds })
}
