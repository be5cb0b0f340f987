use super::*;
use async_trait::async_trait;
use inference::InferenceError;
use shared::{
    domain::{AgeGroupKind, BedStatus, DepartmentId, DiseaseId, MedicineId, StaffId},
    protocol::{
        AgeGroupInput, BedInput, DepartmentInput, DiseaseInput, InventoryInput, MedicineInput,
        Prediction, PredictionRequest, PrescriptionInput, StaffInput, SubcategoryInput,
    },
};

struct CannedPredictor(Result<&'static str, ()>);

#[async_trait]
impl PredictionClient for CannedPredictor {
    async fn predict(&self, prompt: &str) -> Result<Prediction, InferenceError> {
        if prompt.trim().is_empty() {
            return Err(InferenceError::EmptyPrompt);
        }
        match self.0 {
            Ok(text) => Ok(inference::parse_prediction(text)),
            Err(()) => Err(InferenceError::EmptyResult),
        }
    }
}

async fn setup() -> ApiContext {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    ApiContext::new(storage)
}

async fn department(ctx: &ApiContext, name: &str) -> DepartmentId {
    create_department(
        ctx,
        DepartmentInput {
            name: name.to_string(),
        },
    )
    .await
    .expect("department")
    .department_id
}

async fn medicine(ctx: &ApiContext, name: &str) -> MedicineId {
    create_medicine(
        ctx,
        MedicineInput {
            name: name.to_string(),
            form: "Tablet".to_string(),
            strength: "500".to_string(),
            unit: "mg".to_string(),
        },
    )
    .await
    .expect("medicine")
    .medicine_id
}

fn staff_input(specialization: &str, department_id: Option<DepartmentId>) -> StaffInput {
    StaffInput {
        name: "Sam Okafor".to_string(),
        specialization: specialization.to_string(),
        department_id,
        phone: Some("  ".to_string()),
        email: None,
    }
}

fn protocol(name: &str, medicine_id: MedicineId) -> DiseaseInput {
    DiseaseInput {
        name: name.to_string(),
        description: None,
        subcategories: vec![SubcategoryInput {
            name: " Uncomplicated ".to_string(),
            description: Some(String::new()),
            age_groups: vec![AgeGroupInput {
                group: AgeGroupKind::Adult,
                age_range: "18-65".to_string(),
                medicines: vec![PrescriptionInput {
                    medicine_id,
                    dosage: "1 tablet twice daily".to_string(),
                    notes: None,
                }],
            }],
        }],
    }
}

#[tokio::test]
async fn nurse_with_department_is_rejected() {
    let ctx = setup().await;
    let ward = department(&ctx, "Ward A").await;

    let err = create_staff(&ctx, staff_input("nurse", Some(ward)))
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);

    let nurse = create_staff(&ctx, staff_input("Nurse", None))
        .await
        .expect("nurse without department");
    assert_eq!(nurse.department_id, None);
    assert_eq!(nurse.phone, None, "blank phone is stored as unset");
}

#[tokio::test]
async fn non_nurse_requires_existing_department() {
    let ctx = setup().await;
    let err = create_staff(&ctx, staff_input("Surgeon", None))
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = create_staff(&ctx, staff_input("Surgeon", Some(DepartmentId(77))))
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::NotFound);

    let surgery = department(&ctx, "Surgery").await;
    let surgeon = create_staff(&ctx, staff_input("Surgeon", Some(surgery)))
        .await
        .expect("surgeon");
    assert_eq!(surgeon.department_name.as_deref(), Some("Surgery"));
}

#[tokio::test]
async fn switching_specialization_to_nurse_must_drop_department() {
    let ctx = setup().await;
    let ward = department(&ctx, "Ward B").await;
    let member = create_staff(&ctx, staff_input("Physician", Some(ward)))
        .await
        .expect("staff");

    let err = update_staff(&ctx, member.staff_id, staff_input("nurse", Some(ward)))
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);

    let updated = update_staff(&ctx, member.staff_id, staff_input("nurse", None))
        .await
        .expect("update");
    assert_eq!(updated.specialization, "nurse");
    assert_eq!(updated.department_id, None);

    let err = update_staff(&ctx, StaffId(999), staff_input("nurse", None))
        .await
        .expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn invalid_email_is_rejected() {
    let ctx = setup().await;
    let mut input = staff_input("nurse", None);
    input.email = Some("not-an-address".to_string());
    let err = create_staff(&ctx, input).await.expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn department_with_beds_cannot_be_deleted() {
    let ctx = setup().await;
    let icu = department(&ctx, "ICU").await;
    let bed = create_bed(
        &ctx,
        BedInput {
            bed_number: "ICU-01".to_string(),
            department_id: icu,
            status: None,
        },
    )
    .await
    .expect("bed");
    assert_eq!(bed.status, BedStatus::Free);

    let err = delete_department(&ctx, icu).await.expect_err("blocked");
    assert_eq!(err.code, ErrorCode::Conflict);

    delete_bed(&ctx, bed.bed_id).await.expect("delete bed");
    delete_department(&ctx, icu).await.expect("delete department");
    let err = get_department(&ctx, icu).await.expect_err("gone");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn department_with_only_staff_cannot_be_deleted() {
    let ctx = setup().await;
    let cardiology = department(&ctx, "Cardiology").await;
    let doctor = create_staff(&ctx, staff_input("Cardiologist", Some(cardiology)))
        .await
        .expect("doctor");

    let err = delete_department(&ctx, cardiology)
        .await
        .expect_err("blocked");
    assert_eq!(err.code, ErrorCode::Conflict);
    assert!(err.message.contains("1 staff"), "{}", err.message);

    delete_staff(&ctx, doctor.staff_id).await.expect("delete staff");
    delete_department(&ctx, cardiology)
        .await
        .expect("delete department");
}

#[tokio::test]
async fn duplicate_bed_number_conflicts_within_department() {
    let ctx = setup().await;
    let icu = department(&ctx, "ICU").await;
    let input = || BedInput {
        bed_number: "B-7".to_string(),
        department_id: icu,
        status: Some(BedStatus::Occupied),
    };
    let bed = create_bed(&ctx, input()).await.expect("bed");
    let err = create_bed(&ctx, input()).await.expect_err("duplicate");
    assert_eq!(err.code, ErrorCode::Conflict);

    let unchanged = update_bed(&ctx, bed.bed_id, input())
        .await
        .expect("re-saving the same bed is fine");
    assert_eq!(unchanged.status, BedStatus::Occupied);
}

#[tokio::test]
async fn bed_status_transitions_and_update_keeps_status() {
    let ctx = setup().await;
    let ward = department(&ctx, "Ward").await;
    let other = department(&ctx, "Annex").await;
    let bed = create_bed(
        &ctx,
        BedInput {
            bed_number: "W-1".to_string(),
            department_id: ward,
            status: None,
        },
    )
    .await
    .expect("bed");

    let bed = update_bed_status(&ctx, bed.bed_id, BedStatus::Maintenance)
        .await
        .expect("status");
    assert_eq!(bed.status, BedStatus::Maintenance);

    let moved = update_bed(
        &ctx,
        bed.bed_id,
        BedInput {
            bed_number: "A-1".to_string(),
            department_id: other,
            status: None,
        },
    )
    .await
    .expect("move");
    assert_eq!(moved.department_name, "Annex");
    assert_eq!(moved.status, BedStatus::Maintenance);

    assert_eq!(list_beds(&ctx, Some(ward)).await.expect("beds").len(), 0);
    assert_eq!(list_beds(&ctx, Some(other)).await.expect("beds").len(), 1);
}

#[tokio::test]
async fn referenced_medicine_cannot_be_deleted() {
    let ctx = setup().await;
    let ors = medicine(&ctx, "ORS").await;
    create_inventory(
        &ctx,
        InventoryInput {
            medicine_id: ors,
            quantity: 40,
            batch_number: Some("ORS-1".to_string()),
            expiry_date: Some("2027-01-31".to_string()),
        },
    )
    .await
    .expect("stock");

    let err = delete_medicine(&ctx, ors).await.expect_err("blocked");
    assert_eq!(err.code, ErrorCode::Conflict);

    let unused = medicine(&ctx, "Zinc").await;
    delete_medicine(&ctx, unused).await.expect("delete unused");
    let err = delete_medicine(&ctx, unused).await.expect_err("already gone");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn inventory_validates_quantity_and_expiry() {
    let ctx = setup().await;
    let ors = medicine(&ctx, "ORS").await;

    let err = create_inventory(
        &ctx,
        InventoryInput {
            medicine_id: ors,
            quantity: -5,
            batch_number: None,
            expiry_date: None,
        },
    )
    .await
    .expect_err("negative");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = create_inventory(
        &ctx,
        InventoryInput {
            medicine_id: ors,
            quantity: 5,
            batch_number: None,
            expiry_date: Some("31/01/2027".to_string()),
        },
    )
    .await
    .expect_err("bad date");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = create_inventory(
        &ctx,
        InventoryInput {
            medicine_id: MedicineId(404),
            quantity: 5,
            batch_number: None,
            expiry_date: None,
        },
    )
    .await
    .expect_err("unknown medicine");
    assert_eq!(err.code, ErrorCode::NotFound);

    let record = create_inventory(
        &ctx,
        InventoryInput {
            medicine_id: ors,
            quantity: 0,
            batch_number: Some(" ".to_string()),
            expiry_date: Some("".to_string()),
        },
    )
    .await
    .expect("empty optional fields");
    assert_eq!(record.batch_number, None);
    assert_eq!(record.expiry_date, None);
    assert_eq!(record.medicine.name, "ORS");
}

#[tokio::test]
async fn disease_names_are_unique() {
    let ctx = setup().await;
    let drug = medicine(&ctx, "Artemether").await;
    create_disease(&ctx, protocol("Malaria", drug))
        .await
        .expect("create");
    let err = create_disease(&ctx, protocol("  Malaria ", drug))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[tokio::test]
async fn disease_create_normalizes_tree() {
    let ctx = setup().await;
    let drug = medicine(&ctx, "Artemether").await;
    let disease = create_disease(&ctx, protocol("Malaria", drug))
        .await
        .expect("create");
    let subcategory = &disease.subcategories[0];
    assert_eq!(subcategory.name, "Uncomplicated");
    assert_eq!(subcategory.description, None);
    assert_eq!(subcategory.age_groups[0].medicines[0].medicine_id, drug);
}

#[tokio::test]
async fn long_descriptions_and_notes_are_accepted() {
    let ctx = setup().await;
    let drug = medicine(&ctx, "Oseltamivir").await;
    let mut input = protocol("Flu", drug);
    input.description = Some("x".repeat(250));
    input.subcategories[0].description = Some("y".repeat(1_000));
    input.subcategories[0].age_groups[0].medicines[0].notes = Some("z".repeat(2_000));

    let disease = create_disease(&ctx, input).await.expect("create");
    assert_eq!(disease.description.as_deref().map(str::len), Some(250));
    assert_eq!(
        disease.subcategories[0].age_groups[0].medicines[0]
            .notes
            .as_deref()
            .map(str::len),
        Some(2_000)
    );

    let mut input = protocol("Flu B", drug);
    input.name = "n".repeat(201);
    let err = create_disease(&ctx, input).await.expect_err("long name");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn disease_rejects_unknown_medicine_and_blank_dosage() {
    let ctx = setup().await;
    let err = create_disease(&ctx, protocol("Typhoid", MedicineId(31)))
        .await
        .expect_err("unknown medicine");
    assert_eq!(err.code, ErrorCode::NotFound);

    let drug = medicine(&ctx, "Ceftriaxone").await;
    let mut input = protocol("Typhoid", drug);
    input.subcategories[0].age_groups[0].medicines[0].dosage = "   ".to_string();
    let err = create_disease(&ctx, input).await.expect_err("blank dosage");
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(list_diseases(&ctx).await.expect("list").is_empty());
}

#[tokio::test]
async fn disease_update_replaces_nested_tree() {
    let ctx = setup().await;
    let first = medicine(&ctx, "Artemether").await;
    let second = medicine(&ctx, "Primaquine").await;
    let created = create_disease(&ctx, protocol("Malaria", first))
        .await
        .expect("create");

    let mut input = protocol("Malaria", second);
    input.subcategories[0].age_groups.push(AgeGroupInput {
        group: AgeGroupKind::Child,
        age_range: "under 5".to_string(),
        medicines: Vec::new(),
    });
    let updated = update_disease(&ctx, created.disease_id, input)
        .await
        .expect("update keeps its own name");

    let groups = &updated.subcategories[0].age_groups;
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].medicines[0].medicine_id, second);
    assert_ne!(
        updated.subcategories[0].subcategory_id,
        created.subcategories[0].subcategory_id
    );

    delete_medicine(&ctx, first)
        .await
        .expect("old prescription no longer references it");
}

#[tokio::test]
async fn disease_update_cannot_take_another_name() {
    let ctx = setup().await;
    let drug = medicine(&ctx, "Oseltamivir").await;
    create_disease(&ctx, protocol("Influenza", drug))
        .await
        .expect("create");
    let covid = create_disease(&ctx, protocol("COVID-19", drug))
        .await
        .expect("create");

    let err = update_disease(&ctx, covid.disease_id, protocol("Influenza", drug))
        .await
        .expect_err("conflict");
    assert_eq!(err.code, ErrorCode::Conflict);

    let err = update_disease(&ctx, DiseaseId(999), protocol("Measles", drug))
        .await
        .expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn deleting_disease_frees_its_medicines() {
    let ctx = setup().await;
    let drug = medicine(&ctx, "Doxycycline").await;
    let disease = create_disease(&ctx, protocol("Leptospirosis", drug))
        .await
        .expect("create");

    assert_eq!(
        delete_medicine(&ctx, drug).await.expect_err("blocked").code,
        ErrorCode::Conflict
    );
    delete_disease(&ctx, disease.disease_id)
        .await
        .expect("delete");
    delete_medicine(&ctx, drug).await.expect("now free");
}

#[tokio::test]
async fn prediction_without_endpoint_is_unavailable() {
    let ctx = setup().await;
    let err = predict_alert(
        &ctx,
        PredictionRequest {
            prompt: "fever cluster".to_string(),
        },
    )
    .await
    .expect_err("no predictor");
    assert_eq!(err.code, ErrorCode::Unavailable);
    assert!(!list_alerts().is_empty());
}

#[tokio::test]
async fn prediction_errors_map_to_api_codes() {
    let ctx = setup()
        .await
        .with_predictor(Arc::new(CannedPredictor(Ok("Disease: Cholera\nRisk: high"))));
    let prediction = predict_alert(
        &ctx,
        PredictionRequest {
            prompt: "flooding in district 4".to_string(),
        },
    )
    .await
    .expect("prediction");
    assert_eq!(prediction.disease.as_deref(), Some("Cholera"));

    let err = predict_alert(
        &ctx,
        PredictionRequest {
            prompt: " ".to_string(),
        },
    )
    .await
    .expect_err("blank prompt");
    assert_eq!(err.code, ErrorCode::Validation);

    let failing = setup()
        .await
        .with_predictor(Arc::new(CannedPredictor(Err(()))));
    let err = predict_alert(
        &failing,
        PredictionRequest {
            prompt: "anything".to_string(),
        },
    )
    .await
    .expect_err("upstream failure");
    assert_eq!(err.code, ErrorCode::Unavailable);
}
