use std::sync::Arc;

use inference::PredictionClient;
use shared::error::{ApiError, ErrorCode};
use storage::Storage;

mod alerts;
mod beds;
mod departments;
mod diseases;
mod inventory;
mod medicines;
mod staff;

pub use alerts::{list_alerts, predict_alert};
pub use beds::{create_bed, delete_bed, get_bed, list_beds, update_bed, update_bed_status};
pub use departments::{
    create_department, delete_department, get_department, list_departments, update_department,
};
pub use diseases::{create_disease, delete_disease, get_disease, list_diseases, update_disease};
pub use inventory::{
    create_inventory, delete_inventory, get_inventory, list_inventory, update_inventory,
};
pub use medicines::{
    create_medicine, delete_medicine, get_medicine, list_medicines, update_medicine,
};
pub use staff::{create_staff, delete_staff, get_staff, list_staff, update_staff};

/// Names, numbers and units.
const MAX_TEXT_LEN: usize = 200;
/// Descriptions, notes and dosage instructions.
const MAX_FREE_TEXT_LEN: usize = 10_000;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub predictor: Option<Arc<dyn PredictionClient>>,
}

impl ApiContext {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            predictor: None,
        }
    }

    pub fn with_predictor(mut self, predictor: Arc<dyn PredictionClient>) -> Self {
        self.predictor = Some(predictor);
        self
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}

fn bounded_text(field: &str, value: &str, max: usize) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ApiError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

/// Trims a mandatory short form field and rejects blank or oversized values.
fn required_text(field: &str, value: &str) -> Result<String, ApiError> {
    bounded_text(field, value, MAX_TEXT_LEN)
}

/// Optional fields arrive as empty strings from the forms; those mean "unset".
fn optional_text(field: &str, value: Option<&str>) -> Result<Option<String>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => required_text(field, v).map(Some),
        None => Ok(None),
    }
}

fn required_free_text(field: &str, value: &str) -> Result<String, ApiError> {
    bounded_text(field, value, MAX_FREE_TEXT_LEN)
}

fn optional_free_text(field: &str, value: Option<&str>) -> Result<Option<String>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => required_free_text(field, v).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
