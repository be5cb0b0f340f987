use shared::{
    domain::DepartmentId,
    error::ApiError,
    protocol::{Department, DepartmentInput},
};
use tracing::info;

use crate::{internal, required_text, ApiContext};

pub async fn list_departments(ctx: &ApiContext) -> Result<Vec<Department>, ApiError> {
    ctx.storage.list_departments().await.map_err(internal)
}

pub async fn get_department(
    ctx: &ApiContext,
    department_id: DepartmentId,
) -> Result<Department, ApiError> {
    ctx.storage
        .get_department(department_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("department not found"))
}

pub async fn create_department(
    ctx: &ApiContext,
    input: DepartmentInput,
) -> Result<Department, ApiError> {
    let name = required_text("department name", &input.name)?;
    let department = ctx
        .storage
        .create_department(&name)
        .await
        .map_err(internal)?;
    info!(department_id = %department.department_id, name = %department.name, "department created");
    Ok(department)
}

pub async fn update_department(
    ctx: &ApiContext,
    department_id: DepartmentId,
    input: DepartmentInput,
) -> Result<Department, ApiError> {
    let name = required_text("department name", &input.name)?;
    ctx.storage
        .update_department(department_id, &name)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("department not found"))
}

/// Departments still holding beds or staff cannot be removed.
pub async fn delete_department(
    ctx: &ApiContext,
    department_id: DepartmentId,
) -> Result<(), ApiError> {
    let refs = ctx
        .storage
        .department_references(department_id)
        .await
        .map_err(internal)?;
    if refs.beds > 0 || refs.staff > 0 {
        return Err(ApiError::conflict(format!(
            "department still has {} bed(s) and {} staff member(s)",
            refs.beds, refs.staff
        )));
    }

    let deleted = ctx
        .storage
        .delete_department(department_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(ApiError::not_found("department not found"));
    }
    info!(%department_id, "department deleted");
    Ok(())
}
