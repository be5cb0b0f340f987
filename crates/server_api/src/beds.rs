use shared::{
    domain::{BedId, BedStatus, DepartmentId},
    error::ApiError,
    protocol::{Bed, BedInput},
};
use tracing::info;

use crate::{internal, required_text, ApiContext};

async fn ensure_number_available(
    ctx: &ApiContext,
    department_id: DepartmentId,
    bed_number: &str,
    current: Option<BedId>,
) -> Result<(), ApiError> {
    ctx.storage
        .get_department(department_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("department not found"))?;

    let existing = ctx
        .storage
        .bed_id_by_number(department_id, bed_number)
        .await
        .map_err(internal)?;
    match existing {
        Some(other) if Some(other) != current => Err(ApiError::conflict(format!(
            "bed '{bed_number}' already exists in this department"
        ))),
        _ => Ok(()),
    }
}

pub async fn list_beds(
    ctx: &ApiContext,
    department_id: Option<DepartmentId>,
) -> Result<Vec<Bed>, ApiError> {
    ctx.storage.list_beds(department_id).await.map_err(internal)
}

pub async fn get_bed(ctx: &ApiContext, bed_id: BedId) -> Result<Bed, ApiError> {
    ctx.storage
        .get_bed(bed_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("bed not found"))
}

pub async fn create_bed(ctx: &ApiContext, input: BedInput) -> Result<Bed, ApiError> {
    let bed_number = required_text("bed number", &input.bed_number)?;
    ensure_number_available(ctx, input.department_id, &bed_number, None).await?;

    let status = input.status.unwrap_or(BedStatus::Free);
    let bed_id = ctx
        .storage
        .create_bed(input.department_id, &bed_number, status)
        .await
        .map_err(internal)?;
    info!(%bed_id, department_id = %input.department_id, status = status.as_str(), "bed created");
    get_bed(ctx, bed_id).await
}

/// Full update. A missing status keeps the bed's current one.
pub async fn update_bed(ctx: &ApiContext, bed_id: BedId, input: BedInput) -> Result<Bed, ApiError> {
    let current = get_bed(ctx, bed_id).await?;
    let bed_number = required_text("bed number", &input.bed_number)?;
    ensure_number_available(ctx, input.department_id, &bed_number, Some(bed_id)).await?;

    let status = input.status.unwrap_or(current.status);
    let updated = ctx
        .storage
        .update_bed(bed_id, input.department_id, &bed_number, status)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(ApiError::not_found("bed not found"));
    }
    get_bed(ctx, bed_id).await
}

pub async fn update_bed_status(
    ctx: &ApiContext,
    bed_id: BedId,
    status: BedStatus,
) -> Result<Bed, ApiError> {
    let updated = ctx
        .storage
        .set_bed_status(bed_id, status)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(ApiError::not_found("bed not found"));
    }
    info!(%bed_id, status = status.as_str(), "bed status changed");
    get_bed(ctx, bed_id).await
}

pub async fn delete_bed(ctx: &ApiContext, bed_id: BedId) -> Result<(), ApiError> {
    let deleted = ctx.storage.delete_bed(bed_id).await.map_err(internal)?;
    if !deleted {
        return Err(ApiError::not_found("bed not found"));
    }
    Ok(())
}
