use shared::{
    domain::{DepartmentId, DepartmentRule, StaffId},
    error::ApiError,
    protocol::{StaffInput, StaffMember},
};
use storage::NewStaff;
use tracing::info;

use crate::{internal, optional_text, required_text, ApiContext};

struct ValidStaff {
    name: String,
    specialization: String,
    department_id: Option<DepartmentId>,
    phone: Option<String>,
    email: Option<String>,
}

impl ValidStaff {
    fn as_row(&self) -> NewStaff<'_> {
        NewStaff {
            name: &self.name,
            specialization: &self.specialization,
            department_id: self.department_id,
            phone: self.phone.as_deref(),
            email: self.email.as_deref(),
        }
    }
}

async fn validate(ctx: &ApiContext, input: StaffInput) -> Result<ValidStaff, ApiError> {
    let name = required_text("staff name", &input.name)?;
    let specialization = required_text("specialization", &input.specialization)?;
    DepartmentRule::for_specialization(&specialization)
        .check(input.department_id)
        .map_err(ApiError::validation)?;

    if let Some(department_id) = input.department_id {
        ctx.storage
            .get_department(department_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| ApiError::not_found("department not found"))?;
    }

    let email = optional_text("email", input.email.as_deref())?;
    if let Some(email) = email.as_deref() {
        if !email.contains('@') {
            return Err(ApiError::validation("email must contain '@'"));
        }
    }

    Ok(ValidStaff {
        name,
        specialization,
        department_id: input.department_id,
        phone: optional_text("phone", input.phone.as_deref())?,
        email,
    })
}

pub async fn list_staff(ctx: &ApiContext) -> Result<Vec<StaffMember>, ApiError> {
    ctx.storage.list_staff().await.map_err(internal)
}

pub async fn get_staff(ctx: &ApiContext, staff_id: StaffId) -> Result<StaffMember, ApiError> {
    ctx.storage
        .get_staff(staff_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("staff member not found"))
}

pub async fn create_staff(ctx: &ApiContext, input: StaffInput) -> Result<StaffMember, ApiError> {
    let staff = validate(ctx, input).await?;
    let staff_id = ctx
        .storage
        .create_staff(&staff.as_row())
        .await
        .map_err(internal)?;
    info!(%staff_id, specialization = %staff.specialization, "staff member created");
    get_staff(ctx, staff_id).await
}

pub async fn update_staff(
    ctx: &ApiContext,
    staff_id: StaffId,
    input: StaffInput,
) -> Result<StaffMember, ApiError> {
    let staff = validate(ctx, input).await?;
    let updated = ctx
        .storage
        .update_staff(staff_id, &staff.as_row())
        .await
        .map_err(internal)?;
    if !updated {
        return Err(ApiError::not_found("staff member not found"));
    }
    get_staff(ctx, staff_id).await
}

pub async fn delete_staff(ctx: &ApiContext, staff_id: StaffId) -> Result<(), ApiError> {
    let deleted = ctx.storage.delete_staff(staff_id).await.map_err(internal)?;
    if !deleted {
        return Err(ApiError::not_found("staff member not found"));
    }
    info!(%staff_id, "staff member deleted");
    Ok(())
}
