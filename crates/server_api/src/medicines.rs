use shared::{
    domain::MedicineId,
    error::ApiError,
    protocol::{Medicine, MedicineInput},
};
use storage::NewMedicine;
use tracing::{info, warn};

use crate::{internal, required_text, ApiContext};

struct ValidMedicine {
    name: String,
    form: String,
    strength: String,
    unit: String,
}

impl ValidMedicine {
    fn parse(input: &MedicineInput) -> Result<Self, ApiError> {
        Ok(Self {
            name: required_text("medicine name", &input.name)?,
            form: required_text("form", &input.form)?,
            strength: required_text("strength", &input.strength)?,
            unit: required_text("unit", &input.unit)?,
        })
    }

    fn as_row(&self) -> NewMedicine<'_> {
        NewMedicine {
            name: &self.name,
            form: &self.form,
            strength: &self.strength,
            unit: &self.unit,
        }
    }
}

pub async fn list_medicines(ctx: &ApiContext) -> Result<Vec<Medicine>, ApiError> {
    ctx.storage.list_medicines().await.map_err(internal)
}

pub async fn get_medicine(ctx: &ApiContext, medicine_id: MedicineId) -> Result<Medicine, ApiError> {
    ctx.storage
        .get_medicine(medicine_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("medicine not found"))
}

pub async fn create_medicine(ctx: &ApiContext, input: MedicineInput) -> Result<Medicine, ApiError> {
    let medicine = ValidMedicine::parse(&input)?;
    let created = ctx
        .storage
        .create_medicine(&medicine.as_row())
        .await
        .map_err(internal)?;
    info!(medicine_id = %created.medicine_id, name = %created.name, "medicine created");
    Ok(created)
}

pub async fn update_medicine(
    ctx: &ApiContext,
    medicine_id: MedicineId,
    input: MedicineInput,
) -> Result<Medicine, ApiError> {
    let medicine = ValidMedicine::parse(&input)?;
    ctx.storage
        .update_medicine(medicine_id, &medicine.as_row())
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("medicine not found"))
}

/// Refuses to drop a catalog entry that prescriptions or stock records
/// still point at.
pub async fn delete_medicine(ctx: &ApiContext, medicine_id: MedicineId) -> Result<(), ApiError> {
    let refs = ctx
        .storage
        .medicine_references(medicine_id)
        .await
        .map_err(internal)?;
    if refs.prescriptions > 0 || refs.inventory > 0 {
        warn!(
            %medicine_id,
            prescriptions = refs.prescriptions,
            inventory = refs.inventory,
            "blocked delete of referenced medicine"
        );
        return Err(ApiError::conflict(format!(
            "medicine is referenced by {} prescription(s) and {} inventory record(s)",
            refs.prescriptions, refs.inventory
        )));
    }

    let deleted = ctx
        .storage
        .delete_medicine(medicine_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(ApiError::not_found("medicine not found"));
    }
    info!(%medicine_id, "medicine deleted");
    Ok(())
}
