use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeDelta};
use shared::{
    domain::{BedStatus, DepartmentId},
    protocol::{Bed, InventoryRecord},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BedCounts {
    pub free: usize,
    pub occupied: usize,
    pub maintenance: usize,
}

impl BedCounts {
    fn record(&mut self, status: BedStatus) {
        match status {
            BedStatus::Free => self.free += 1,
            BedStatus::Occupied => self.occupied += 1,
            BedStatus::Maintenance => self.maintenance += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.free + self.occupied + self.maintenance
    }

    /// Occupied share of all beds as a percentage; `0.0` with no beds.
    pub fn occupancy_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.occupied as f64 * 100.0 / total as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentOccupancy {
    pub department_id: DepartmentId,
    pub department_name: String,
    pub counts: BedCounts,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BedOccupancy {
    pub overall: BedCounts,
    /// Sorted by department name.
    pub departments: Vec<DepartmentOccupancy>,
}

pub fn bed_occupancy(beds: &[Bed]) -> BedOccupancy {
    let mut overall = BedCounts::default();
    let mut per_department: BTreeMap<DepartmentId, DepartmentOccupancy> = BTreeMap::new();

    for bed in beds {
        overall.record(bed.status);
        per_department
            .entry(bed.department_id)
            .or_insert_with(|| DepartmentOccupancy {
                department_id: bed.department_id,
                department_name: bed.department_name.clone(),
                counts: BedCounts::default(),
            })
            .counts
            .record(bed.status);
    }

    let mut departments: Vec<_> = per_department.into_values().collect();
    departments.sort_by(|a, b| {
        a.department_name
            .to_lowercase()
            .cmp(&b.department_name.to_lowercase())
    });
    BedOccupancy {
        overall,
        departments,
    }
}

/// Records whose quantity is strictly below `threshold`, lowest first.
pub fn low_stock(records: &[InventoryRecord], threshold: i64) -> Vec<&InventoryRecord> {
    let mut low: Vec<_> = records.iter().filter(|r| r.quantity < threshold).collect();
    low.sort_by_key(|r| r.quantity);
    low
}

/// Records expiring on or before `today + days`, soonest first. Stock that
/// has already expired is included; records without an expiry date are not.
/// A horizon past the calendar range clamps to its end.
pub fn expiring_within(
    records: &[InventoryRecord],
    today: NaiveDate,
    days: i64,
) -> Vec<&InventoryRecord> {
    let horizon = TimeDelta::try_days(days)
        .and_then(|span| today.checked_add_signed(span))
        .unwrap_or(if days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        });
    let mut expiring: Vec<_> = records
        .iter()
        .filter(|r| r.expiry_date.is_some_and(|expiry| expiry <= horizon))
        .collect();
    expiring.sort_by_key(|r| r.expiry_date);
    expiring
}

#[cfg(test)]
#[path = "tests/summary_tests.rs"]
mod tests;
