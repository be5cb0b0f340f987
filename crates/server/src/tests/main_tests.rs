use super::*;
use axum::{
    body::{self, Body},
    http::Request,
};
use shared::{
    domain::{BedStatus, DepartmentId},
    error::{ApiError, ErrorCode},
    protocol::{Advisory, Bed, Department, Disease, InventoryRecord, Medicine, ServerEvent, StaffMember},
};
use tokio::sync::broadcast;
use tower::ServiceExt;

async fn test_app() -> (Router, broadcast::Receiver<ServerEvent>) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let state = AppState::new(ApiContext::new(storage));
    let events = state.events.subscribe();
    (build_router(Arc::new(state)), events)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, body.to_vec())
}

async fn create_department(app: &Router, name: &str) -> Department {
    let (status, body) = send(
        app,
        json_request("POST", "/departments", serde_json::json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_slice(&body).expect("department json")
}

async fn create_medicine(app: &Router, name: &str) -> Medicine {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/medicines",
            serde_json::json!({ "name": name, "form": "Tablet", "strength": "500", "unit": "mg" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_slice(&body).expect("medicine json")
}

fn error_code(body: &[u8]) -> ErrorCode {
    serde_json::from_slice::<ApiError>(body).expect("error json").code
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _events) = test_app().await;
    let (status, body) = send(&app, empty_request("GET", "/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn department_crud_publishes_events() {
    let (app, mut events) = test_app().await;
    let department = create_department(&app, "Cardiology").await;
    match events.try_recv().expect("event") {
        ServerEvent::DepartmentUpserted { department: published } => {
            assert_eq!(published, department)
        }
        other => panic!("unexpected event {other:?}"),
    }

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/departments/{}", department.department_id),
            serde_json::json!({ "name": "Cardiac Care" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let renamed: Department = serde_json::from_slice(&body).expect("json");
    assert_eq!(renamed.name, "Cardiac Care");

    let (status, _) = send(
        &app,
        empty_request("DELETE", &format!("/departments/{}", department.department_id)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        empty_request("GET", &format!("/departments/{}", department.department_id)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), ErrorCode::NotFound);

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(event);
    }
    assert!(matches!(
        kinds.last(),
        Some(ServerEvent::DepartmentDeleted { department_id }) if *department_id == department.department_id
    ));
}

#[tokio::test]
async fn blank_department_name_is_bad_request() {
    let (app, _events) = test_app().await;
    let (status, body) = send(
        &app,
        json_request("POST", "/departments", serde_json::json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), ErrorCode::Validation);
}

#[tokio::test]
async fn nurse_assigned_to_department_is_rejected() {
    let (app, _events) = test_app().await;
    let ward = create_department(&app, "Ward").await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/staff",
            serde_json::json!({
                "name": "Ada",
                "specialization": "Nurse",
                "department_id": ward.department_id,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/staff",
            serde_json::json!({ "name": "Ada", "specialization": "Nurse", "phone": "555-0100" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let nurse: StaffMember = serde_json::from_slice(&body).expect("json");
    assert_eq!(nurse.department_id, None);

    let (status, body) = send(&app, empty_request("GET", "/staff")).await;
    assert_eq!(status, StatusCode::OK);
    let staff: Vec<StaffMember> = serde_json::from_slice(&body).expect("json");
    assert_eq!(staff.len(), 1);
}

#[tokio::test]
async fn beds_filter_by_department_and_patch_status() {
    let (app, _events) = test_app().await;
    let icu = create_department(&app, "ICU").await;
    let ward = create_department(&app, "Ward").await;

    for (number, department) in [("ICU-1", &icu), ("ICU-2", &icu), ("W-1", &ward)] {
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/beds",
                serde_json::json!({ "bed_number": number, "department_id": department.department_id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        empty_request("GET", &format!("/beds?department_id={}", icu.department_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let beds: Vec<Bed> = serde_json::from_slice(&body).expect("json");
    assert_eq!(beds.len(), 2);
    assert!(beds.iter().all(|bed| bed.status == BedStatus::Free));

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/beds/{}/status", beds[0].bed_id),
            serde_json::json!({ "status": "OCCUPIED" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let bed: Bed = serde_json::from_slice(&body).expect("json");
    assert_eq!(bed.status, BedStatus::Occupied);

    let (status, body) = send(&app, empty_request("GET", "/beds")).await;
    assert_eq!(status, StatusCode::OK);
    let all: Vec<Bed> = serde_json::from_slice(&body).expect("json");
    assert_eq!(all.len(), 3);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/beds",
            serde_json::json!({ "bed_number": "ICU-1", "department_id": icu.department_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), ErrorCode::Conflict);

    let (status, _) = send(
        &app,
        empty_request("DELETE", &format!("/departments/{}", icu.department_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn bed_in_unknown_department_is_not_found() {
    let (app, _events) = test_app().await;
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/beds",
            serde_json::json!({ "bed_number": "X-1", "department_id": DepartmentId(42) }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inventory_and_medicine_reference_rules() {
    let (app, _events) = test_app().await;
    let medicine = create_medicine(&app, "Amoxicillin").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/inventory",
            serde_json::json!({
                "medicine_id": medicine.medicine_id,
                "quantity": 120,
                "batch_number": "AMX-22",
                "expiry_date": "2027-03-01",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let record: InventoryRecord = serde_json::from_slice(&body).expect("json");
    assert_eq!(record.medicine.name, "Amoxicillin");
    assert_eq!(record.expiry_date.map(|d| d.to_string()).as_deref(), Some("2027-03-01"));

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/inventory/{}", record.inventory_id),
            serde_json::json!({
                "medicine_id": medicine.medicine_id,
                "quantity": 10,
                "expiry_date": "03/01/2027",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        empty_request("DELETE", &format!("/medicines/{}", medicine.medicine_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        empty_request("DELETE", &format!("/inventory/{}", record.inventory_id)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        empty_request("DELETE", &format!("/medicines/{}", medicine.medicine_id)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn disease_tree_round_trips_over_http() {
    let (app, _events) = test_app().await;
    let medicine = create_medicine(&app, "Paracetamol").await;
    let payload = serde_json::json!({
        "name": "Dengue",
        "description": "Viral fever",
        "subcategories": [{
            "name": "Classic",
            "age_groups": [{
                "group": "CHILD",
                "age_range": "1-12",
                "medicines": [{ "medicine_id": medicine.medicine_id, "dosage": "250mg every 6h" }]
            }]
        }]
    });

    let (status, body) = send(&app, json_request("POST", "/diseases", payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let disease: Disease = serde_json::from_slice(&body).expect("json");
    let prescribed = &disease.subcategories[0].age_groups[0].medicines[0];
    assert_eq!(prescribed.medicine_name, "Paracetamol");

    let (status, body) = send(&app, json_request("POST", "/diseases", payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), ErrorCode::Conflict);

    let (status, body) = send(&app, empty_request("GET", "/diseases")).await;
    assert_eq!(status, StatusCode::OK);
    let diseases: Vec<Disease> = serde_json::from_slice(&body).expect("json");
    assert_eq!(diseases.len(), 1);

    let (status, _) = send(
        &app,
        empty_request("DELETE", &format!("/diseases/{}", disease.disease_id)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn alerts_list_and_predict_without_endpoint() {
    let (app, _events) = test_app().await;
    let (status, body) = send(&app, empty_request("GET", "/alerts")).await;
    assert_eq!(status, StatusCode::OK);
    let alerts: Vec<Advisory> = serde_json::from_slice(&body).expect("json");
    assert!(!alerts.is_empty());

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/alerts/predict",
            serde_json::json!({ "prompt": "rising fever cases" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error_code(&body), ErrorCode::Unavailable);
}

#[tokio::test]
async fn undecodable_requests_answer_with_api_errors() {
    let (app, _events) = test_app().await;
    let ward = create_department(&app, "Ward").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/beds",
            serde_json::json!({
                "bed_number": "W-1",
                "department_id": ward.department_id,
                "status": "broken"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: ApiError = serde_json::from_slice(&body).expect("error json");
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(err.message.contains("broken"), "{}", err.message);

    let (status, body) = send(
        &app,
        json_request("POST", "/staff", serde_json::json!({ "name": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: ApiError = serde_json::from_slice(&body).expect("error json");
    assert!(err.message.contains("specialization"), "{}", err.message);

    let (status, body) = send(&app, empty_request("GET", "/beds/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), ErrorCode::Validation);

    let (status, body) = send(&app, empty_request("GET", "/beds?department_id=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), ErrorCode::Validation);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let (app, _events) = test_app().await;
    let name = "x".repeat(MAX_BODY_BYTES + 1);
    let body = serde_json::json!({ "name": name }).to_string();
    let request = Request::post("/departments")
        .header("content-type", "application/json")
        .header("content-length", body.len())
        .body(Body::from(body))
        .expect("request");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[test]
fn error_codes_map_to_http_statuses() {
    use routes::status_for;
    assert_eq!(status_for(ErrorCode::Validation), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(ErrorCode::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(status_for(ErrorCode::Conflict), StatusCode::CONFLICT);
    assert_eq!(status_for(ErrorCode::Unavailable), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(status_for(ErrorCode::Internal), StatusCode::INTERNAL_SERVER_ERROR);
}
