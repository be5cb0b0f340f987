use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(DepartmentId);
id_newtype!(StaffId);
id_newtype!(BedId);
id_newtype!(MedicineId);
id_newtype!(InventoryId);
id_newtype!(DiseaseId);
id_newtype!(SubcategoryId);
id_newtype!(AgeGroupId);
id_newtype!(PrescriptionId);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BedStatus {
    Free,
    Occupied,
    Maintenance,
}

impl BedStatus {
    pub const ALL: [BedStatus; 3] = [BedStatus::Free, BedStatus::Occupied, BedStatus::Maintenance];

    pub fn as_str(self) -> &'static str {
        match self {
            BedStatus::Free => "FREE",
            BedStatus::Occupied => "OCCUPIED",
            BedStatus::Maintenance => "MAINTENANCE",
        }
    }
}

impl FromStr for BedStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FREE" => Ok(BedStatus::Free),
            "OCCUPIED" => Ok(BedStatus::Occupied),
            "MAINTENANCE" => Ok(BedStatus::Maintenance),
            _ => Err(UnknownVariant {
                kind: "bed status",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgeGroupKind {
    Child,
    Teenager,
    Adult,
    Older,
}

impl AgeGroupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroupKind::Child => "CHILD",
            AgeGroupKind::Teenager => "TEENAGER",
            AgeGroupKind::Adult => "ADULT",
            AgeGroupKind::Older => "OLDER",
        }
    }
}

impl FromStr for AgeGroupKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CHILD" => Ok(AgeGroupKind::Child),
            "TEENAGER" => Ok(AgeGroupKind::Teenager),
            "ADULT" => Ok(AgeGroupKind::Adult),
            "OLDER" => Ok(AgeGroupKind::Older),
            _ => Err(UnknownVariant {
                kind: "age group",
                value: s.to_string(),
            }),
        }
    }
}

/// Whether a staff member of a given specialization is attached to a department.
///
/// Nurses float between wards and are never assigned one; every other
/// specialization belongs to exactly one department.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentRule {
    Forbidden,
    Required,
}

impl DepartmentRule {
    pub fn for_specialization(specialization: &str) -> Self {
        if is_nurse(specialization) {
            DepartmentRule::Forbidden
        } else {
            DepartmentRule::Required
        }
    }

    pub fn check(self, department_id: Option<DepartmentId>) -> Result<(), &'static str> {
        match (self, department_id) {
            (DepartmentRule::Forbidden, Some(_)) => Err("nurses must not be assigned a department"),
            (DepartmentRule::Required, None) => {
                Err("department is required for non-nurse specializations")
            }
            _ => Ok(()),
        }
    }
}

pub fn is_nurse(specialization: &str) -> bool {
    specialization.trim().eq_ignore_ascii_case("nurse")
}
