use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AgeGroupId, AgeGroupKind, BedId, BedStatus, DepartmentId, DiseaseId, InventoryId, MedicineId,
    PrescriptionId, StaffId, SubcategoryId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub department_id: DepartmentId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentInput {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub staff_id: StaffId,
    pub name: String,
    pub specialization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffInput {
    pub name: String,
    pub specialization: String,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bed {
    pub bed_id: BedId,
    pub bed_number: String,
    pub department_id: DepartmentId,
    pub department_name: String,
    pub status: BedStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedInput {
    pub bed_number: String,
    pub department_id: DepartmentId,
    #[serde(default)]
    pub status: Option<BedStatus>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BedStatusUpdate {
    pub status: BedStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub medicine_id: MedicineId,
    pub name: String,
    pub form: String,
    pub strength: String,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineInput {
    pub name: String,
    pub form: String,
    pub strength: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub inventory_id: InventoryId,
    pub medicine: Medicine,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
}

/// `expiry_date` travels as the raw form value so a malformed date is
/// reported as a validation error rather than a body decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryInput {
    pub medicine_id: MedicineId,
    pub quantity: i64,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescribedMedicine {
    pub prescription_id: PrescriptionId,
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub dosage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGroup {
    pub age_group_id: AgeGroupId,
    pub group: AgeGroupKind,
    pub age_range: String,
    pub medicines: Vec<PrescribedMedicine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub subcategory_id: SubcategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub age_groups: Vec<AgeGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    pub disease_id: DiseaseId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionInput {
    pub medicine_id: MedicineId,
    pub dosage: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeGroupInput {
    pub group: AgeGroupKind,
    pub age_range: String,
    #[serde(default)]
    pub medicines: Vec<PrescriptionInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubcategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub age_groups: Vec<AgeGroupInput>,
}

/// Full protocol tree as submitted by the disease editor. Updates replace
/// the whole tree below the disease row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<SubcategoryInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub title: String,
    pub severity: AlertSeverity,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub raw: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    DepartmentUpserted { department: Department },
    DepartmentDeleted { department_id: DepartmentId },
    StaffUpserted { staff: StaffMember },
    StaffDeleted { staff_id: StaffId },
    BedUpserted { bed: Bed },
    BedDeleted { bed_id: BedId },
    MedicineUpserted { medicine: Medicine },
    MedicineDeleted { medicine_id: MedicineId },
    InventoryUpserted { record: InventoryRecord },
    InventoryDeleted { inventory_id: InventoryId },
    DiseaseUpserted { disease: Disease },
    DiseaseDeleted { disease_id: DiseaseId },
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
