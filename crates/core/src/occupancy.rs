//! Bed occupancy by department.
//!
//! Pure functions over a bed snapshot. Percentages are rounded to the nearest integer with
//! halves rounding up, and an empty denominator is defined as 0 %.

use crate::constants::{CRITICAL_OCCUPANCY_PERCENT, HIGH_OCCUPANCY_PERCENT};
use crate::store::{Query, RecordStore, Table};
use crate::WardResult;
use records::{decode_rows, Bed};
use serde::Serialize;
use std::collections::HashMap;

/// Severity band of a department's occupancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum OccupancyLevel {
    Critical,
    High,
    Normal,
}

impl OccupancyLevel {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= CRITICAL_OCCUPANCY_PERCENT {
            OccupancyLevel::Critical
        } else if percentage >= HIGH_OCCUPANCY_PERCENT {
            OccupancyLevel::High
        } else {
            OccupancyLevel::Normal
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DepartmentOccupancy {
    pub name: String,
    pub occupied: u32,
    pub total: u32,
    pub percentage: u32,
    pub level: OccupancyLevel,
}

impl DepartmentOccupancy {
    pub fn available(&self) -> u32 {
        self.total - self.occupied
    }
}

/// `round(part / total * 100)`, or 0 when `total` is 0.
pub fn occupancy_percentage(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (part, total) = (u64::from(part), u64::from(total));
    ((200 * part + total) / (2 * total)) as u32
}

/// Group beds by department and order departments by descending occupancy.
///
/// Departments with equal percentages keep the order in which they were first seen.
pub fn aggregate_occupancy(beds: &[Bed]) -> Vec<DepartmentOccupancy> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<(&str, u32, u32)> = Vec::new();

    for bed in beds {
        let slot = *index.entry(bed.department.as_str()).or_insert_with(|| {
            tallies.push((bed.department.as_str(), 0, 0));
            tallies.len() - 1
        });
        let tally = &mut tallies[slot];
        tally.2 += 1;
        if bed.is_occupied() {
            tally.1 += 1;
        }
    }

    let mut departments: Vec<DepartmentOccupancy> = tallies
        .into_iter()
        .map(|(name, occupied, total)| {
            let percentage = occupancy_percentage(occupied, total);
            DepartmentOccupancy {
                name: name.to_owned(),
                occupied,
                total,
                percentage,
                level: OccupancyLevel::from_percentage(percentage),
            }
        })
        .collect();

    // Stable sort keeps encounter order for ties.
    departments.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    departments
}

/// Load every bed and aggregate it.
pub async fn load_occupancy(store: &dyn RecordStore) -> WardResult<Vec<DepartmentOccupancy>> {
    let rows = store.query(Table::Beds, &Query::new()).await?;
    Ok(aggregate_occupancy(&decode_rows::<Bed>(rows)))
}
