use chrono::NaiveDate;
use shared::{
    domain::{InventoryId, MedicineId},
    error::ApiError,
    protocol::{InventoryInput, InventoryRecord},
};
use storage::NewInventory;
use tracing::info;

use crate::{internal, optional_text, ApiContext};

struct ValidInventory {
    medicine_id: MedicineId,
    quantity: i64,
    batch_number: Option<String>,
    expiry_date: Option<NaiveDate>,
}

impl ValidInventory {
    fn as_row(&self) -> NewInventory<'_> {
        NewInventory {
            medicine_id: self.medicine_id,
            quantity: self.quantity,
            batch_number: self.batch_number.as_deref(),
            expiry_date: self.expiry_date,
        }
    }
}

fn parse_expiry(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::validation("expiry date must be formatted YYYY-MM-DD")),
        None => Ok(None),
    }
}

async fn validate(ctx: &ApiContext, input: InventoryInput) -> Result<ValidInventory, ApiError> {
    if input.quantity < 0 {
        return Err(ApiError::validation("quantity must not be negative"));
    }
    ctx.storage
        .get_medicine(input.medicine_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("medicine not found"))?;

    Ok(ValidInventory {
        medicine_id: input.medicine_id,
        quantity: input.quantity,
        batch_number: optional_text("batch number", input.batch_number.as_deref())?,
        expiry_date: parse_expiry(input.expiry_date.as_deref())?,
    })
}

pub async fn list_inventory(ctx: &ApiContext) -> Result<Vec<InventoryRecord>, ApiError> {
    ctx.storage.list_inventory().await.map_err(internal)
}

pub async fn get_inventory(
    ctx: &ApiContext,
    inventory_id: InventoryId,
) -> Result<InventoryRecord, ApiError> {
    ctx.storage
        .get_inventory(inventory_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("inventory record not found"))
}

pub async fn create_inventory(
    ctx: &ApiContext,
    input: InventoryInput,
) -> Result<InventoryRecord, ApiError> {
    let record = validate(ctx, input).await?;
    let inventory_id = ctx
        .storage
        .create_inventory(&record.as_row())
        .await
        .map_err(internal)?;
    info!(%inventory_id, medicine_id = %record.medicine_id, quantity = record.quantity, "stock recorded");
    get_inventory(ctx, inventory_id).await
}

pub async fn update_inventory(
    ctx: &ApiContext,
    inventory_id: InventoryId,
    input: InventoryInput,
) -> Result<InventoryRecord, ApiError> {
    let record = validate(ctx, input).await?;
    let updated = ctx
        .storage
        .update_inventory(inventory_id, &record.as_row())
        .await
        .map_err(internal)?;
    if !updated {
        return Err(ApiError::not_found("inventory record not found"));
    }
    get_inventory(ctx, inventory_id).await
}

pub async fn delete_inventory(ctx: &ApiContext, inventory_id: InventoryId) -> Result<(), ApiError> {
    let deleted = ctx
        .storage
        .delete_inventory(inventory_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(ApiError::not_found("inventory record not found"));
    }
    Ok(())
}
