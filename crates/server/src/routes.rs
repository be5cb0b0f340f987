use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use shared::{
    domain::{BedId, DepartmentId, DiseaseId, InventoryId, MedicineId, StaffId},
    error::{ApiError, ErrorCode},
    protocol::{
        Advisory, Bed, BedInput, BedStatusUpdate, Department, DepartmentInput, Disease,
        DiseaseInput, InventoryInput, InventoryRecord, Medicine, MedicineInput, Prediction,
        PredictionRequest, ServerEvent, StaffInput, StaffMember,
    },
};
use tracing::error;

use crate::{
    app_state::AppState,
    extract::{ApiJson, ApiPath, ApiQuery},
};

pub(crate) type Rejection = (StatusCode, Json<ApiError>);
type HttpResult<T> = Result<T, Rejection>;

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> Rejection {
    if err.code == ErrorCode::Internal {
        error!(message = %err.message, "request failed");
    }
    (status_for(err.code), Json(err))
}

#[derive(Debug, Deserialize)]
pub(crate) struct BedListQuery {
    department_id: Option<DepartmentId>,
}

// Departments

pub(crate) async fn list_departments(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<Department>>> {
    server_api::list_departments(&state.api)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn get_department(
    State(state): State<Arc<AppState>>,
    ApiPath(department_id): ApiPath<DepartmentId>,
) -> HttpResult<Json<Department>> {
    server_api::get_department(&state.api, department_id)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn create_department(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<DepartmentInput>,
) -> HttpResult<(StatusCode, Json<Department>)> {
    let department = server_api::create_department(&state.api, input)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::DepartmentUpserted {
        department: department.clone(),
    });
    Ok((StatusCode::CREATED, Json(department)))
}

pub(crate) async fn update_department(
    State(state): State<Arc<AppState>>,
    ApiPath(department_id): ApiPath<DepartmentId>,
    ApiJson(input): ApiJson<DepartmentInput>,
) -> HttpResult<Json<Department>> {
    let department = server_api::update_department(&state.api, department_id, input)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::DepartmentUpserted {
        department: department.clone(),
    });
    Ok(Json(department))
}

pub(crate) async fn delete_department(
    State(state): State<Arc<AppState>>,
    ApiPath(department_id): ApiPath<DepartmentId>,
) -> HttpResult<StatusCode> {
    server_api::delete_department(&state.api, department_id)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::DepartmentDeleted { department_id });
    Ok(StatusCode::NO_CONTENT)
}

// Staff

pub(crate) async fn list_staff(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<StaffMember>>> {
    server_api::list_staff(&state.api)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn get_staff(
    State(state): State<Arc<AppState>>,
    ApiPath(staff_id): ApiPath<StaffId>,
) -> HttpResult<Json<StaffMember>> {
    server_api::get_staff(&state.api, staff_id)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn create_staff(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<StaffInput>,
) -> HttpResult<(StatusCode, Json<StaffMember>)> {
    let staff = server_api::create_staff(&state.api, input)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::StaffUpserted {
        staff: staff.clone(),
    });
    Ok((StatusCode::CREATED, Json(staff)))
}

pub(crate) async fn update_staff(
    State(state): State<Arc<AppState>>,
    ApiPath(staff_id): ApiPath<StaffId>,
    ApiJson(input): ApiJson<StaffInput>,
) -> HttpResult<Json<StaffMember>> {
    let staff = server_api::update_staff(&state.api, staff_id, input)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::StaffUpserted {
        staff: staff.clone(),
    });
    Ok(Json(staff))
}

pub(crate) async fn delete_staff(
    State(state): State<Arc<AppState>>,
    ApiPath(staff_id): ApiPath<StaffId>,
) -> HttpResult<StatusCode> {
    server_api::delete_staff(&state.api, staff_id)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::StaffDeleted { staff_id });
    Ok(StatusCode::NO_CONTENT)
}

// Beds

pub(crate) async fn list_beds(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<BedListQuery>,
) -> HttpResult<Json<Vec<Bed>>> {
    server_api::list_beds(&state.api, q.department_id)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn get_bed(
    State(state): State<Arc<AppState>>,
    ApiPath(bed_id): ApiPath<BedId>,
) -> HttpResult<Json<Bed>> {
    server_api::get_bed(&state.api, bed_id)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn create_bed(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<BedInput>,
) -> HttpResult<(StatusCode, Json<Bed>)> {
    let bed = server_api::create_bed(&state.api, input)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::BedUpserted { bed: bed.clone() });
    Ok((StatusCode::CREATED, Json(bed)))
}

pub(crate) async fn update_bed(
    State(state): State<Arc<AppState>>,
    ApiPath(bed_id): ApiPath<BedId>,
    ApiJson(input): ApiJson<BedInput>,
) -> HttpResult<Json<Bed>> {
    let bed = server_api::update_bed(&state.api, bed_id, input)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::BedUpserted { bed: bed.clone() });
    Ok(Json(bed))
}

pub(crate) async fn update_bed_status(
    State(state): State<Arc<AppState>>,
    ApiPath(bed_id): ApiPath<BedId>,
    ApiJson(update): ApiJson<BedStatusUpdate>,
) -> HttpResult<Json<Bed>> {
    let bed = server_api::update_bed_status(&state.api, bed_id, update.status)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::BedUpserted { bed: bed.clone() });
    Ok(Json(bed))
}

pub(crate) async fn delete_bed(
    State(state): State<Arc<AppState>>,
    ApiPath(bed_id): ApiPath<BedId>,
) -> HttpResult<StatusCode> {
    server_api::delete_bed(&state.api, bed_id)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::BedDeleted { bed_id });
    Ok(StatusCode::NO_CONTENT)
}

// Medicines

pub(crate) async fn list_medicines(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<Medicine>>> {
    server_api::list_medicines(&state.api)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn get_medicine(
    State(state): State<Arc<AppState>>,
    ApiPath(medicine_id): ApiPath<MedicineId>,
) -> HttpResult<Json<Medicine>> {
    server_api::get_medicine(&state.api, medicine_id)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn create_medicine(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<MedicineInput>,
) -> HttpResult<(StatusCode, Json<Medicine>)> {
    let medicine = server_api::create_medicine(&state.api, input)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::MedicineUpserted {
        medicine: medicine.clone(),
    });
    Ok((StatusCode::CREATED, Json(medicine)))
}

pub(crate) async fn update_medicine(
    State(state): State<Arc<AppState>>,
    ApiPath(medicine_id): ApiPath<MedicineId>,
    ApiJson(input): ApiJson<MedicineInput>,
) -> HttpResult<Json<Medicine>> {
    let medicine = server_api::update_medicine(&state.api, medicine_id, input)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::MedicineUpserted {
        medicine: medicine.clone(),
    });
    Ok(Json(medicine))
}

pub(crate) async fn delete_medicine(
    State(state): State<Arc<AppState>>,
    ApiPath(medicine_id): ApiPath<MedicineId>,
) -> HttpResult<StatusCode> {
    server_api::delete_medicine(&state.api, medicine_id)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::MedicineDeleted { medicine_id });
    Ok(StatusCode::NO_CONTENT)
}

// Inventory

pub(crate) async fn list_inventory(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<InventoryRecord>>> {
    server_api::list_inventory(&state.api)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn get_inventory(
    State(state): State<Arc<AppState>>,
    ApiPath(inventory_id): ApiPath<InventoryId>,
) -> HttpResult<Json<InventoryRecord>> {
    server_api::get_inventory(&state.api, inventory_id)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn create_inventory(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<InventoryInput>,
) -> HttpResult<(StatusCode, Json<InventoryRecord>)> {
    let record = server_api::create_inventory(&state.api, input)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::InventoryUpserted {
        record: record.clone(),
    });
    Ok((StatusCode::CREATED, Json(record)))
}

pub(crate) async fn update_inventory(
    State(state): State<Arc<AppState>>,
    ApiPath(inventory_id): ApiPath<InventoryId>,
    ApiJson(input): ApiJson<InventoryInput>,
) -> HttpResult<Json<InventoryRecord>> {
    let record = server_api::update_inventory(&state.api, inventory_id, input)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::InventoryUpserted {
        record: record.clone(),
    });
    Ok(Json(record))
}

pub(crate) async fn delete_inventory(
    State(state): State<Arc<AppState>>,
    ApiPath(inventory_id): ApiPath<InventoryId>,
) -> HttpResult<StatusCode> {
    server_api::delete_inventory(&state.api, inventory_id)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::InventoryDeleted { inventory_id });
    Ok(StatusCode::NO_CONTENT)
}

// Diseases

pub(crate) async fn list_diseases(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<Disease>>> {
    server_api::list_diseases(&state.api)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn get_disease(
    State(state): State<Arc<AppState>>,
    ApiPath(disease_id): ApiPath<DiseaseId>,
) -> HttpResult<Json<Disease>> {
    server_api::get_disease(&state.api, disease_id)
        .await
        .map(Json)
        .map_err(reject)
}

pub(crate) async fn create_disease(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<DiseaseInput>,
) -> HttpResult<(StatusCode, Json<Disease>)> {
    let disease = server_api::create_disease(&state.api, input)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::DiseaseUpserted {
        disease: disease.clone(),
    });
    Ok((StatusCode::CREATED, Json(disease)))
}

pub(crate) async fn update_disease(
    State(state): State<Arc<AppState>>,
    ApiPath(disease_id): ApiPath<DiseaseId>,
    ApiJson(input): ApiJson<DiseaseInput>,
) -> HttpResult<Json<Disease>> {
    let disease = server_api::update_disease(&state.api, disease_id, input)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::DiseaseUpserted {
        disease: disease.clone(),
    });
    Ok(Json(disease))
}

pub(crate) async fn delete_disease(
    State(state): State<Arc<AppState>>,
    ApiPath(disease_id): ApiPath<DiseaseId>,
) -> HttpResult<StatusCode> {
    server_api::delete_disease(&state.api, disease_id)
        .await
        .map_err(reject)?;
    state.publish(ServerEvent::DiseaseDeleted { disease_id });
    Ok(StatusCode::NO_CONTENT)
}

// Alerts

pub(crate) async fn list_alerts() -> Json<Vec<Advisory>> {
    Json(server_api::list_alerts())
}

pub(crate) async fn predict_alert(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<PredictionRequest>,
) -> HttpResult<Json<Prediction>> {
    server_api::predict_alert(&state.api, request)
        .await
        .map(Json)
        .map_err(reject)
}
