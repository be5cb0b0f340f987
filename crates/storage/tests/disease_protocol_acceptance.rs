use shared::{
    domain::{AgeGroupKind, BedStatus},
    protocol::{AgeGroupInput, DiseaseInput, PrescriptionInput, SubcategoryInput},
};
use storage::{NewInventory, NewMedicine, Storage};

#[tokio::test]
async fn protocol_survives_reopen_and_resync_on_disk() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("hospital.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    let amoxicillin = storage
        .create_medicine(&NewMedicine {
            name: "Amoxicillin",
            form: "Syrup",
            strength: "250",
            unit: "mg/5ml",
        })
        .await
        .expect("medicine");
    let azithromycin = storage
        .create_medicine(&NewMedicine {
            name: "Azithromycin",
            form: "Tablet",
            strength: "500",
            unit: "mg",
        })
        .await
        .expect("medicine");

    let pneumonia = DiseaseInput {
        name: "Pneumonia".to_string(),
        description: None,
        subcategories: vec![SubcategoryInput {
            name: "Community acquired".to_string(),
            description: None,
            age_groups: vec![AgeGroupInput {
                group: AgeGroupKind::Child,
                age_range: "2-11".to_string(),
                medicines: vec![PrescriptionInput {
                    medicine_id: amoxicillin.medicine_id,
                    dosage: "45 mg/kg/day".to_string(),
                    notes: None,
                }],
            }],
        }],
    };
    let disease_id = storage
        .create_disease_tree(&pneumonia)
        .await
        .expect("create");
    drop(storage);

    let storage = Storage::new(&database_url).await.expect("reopen");
    let mut resync = pneumonia.clone();
    resync.subcategories[0].age_groups.push(AgeGroupInput {
        group: AgeGroupKind::Adult,
        age_range: "18+".to_string(),
        medicines: vec![PrescriptionInput {
            medicine_id: azithromycin.medicine_id,
            dosage: "500 mg once daily".to_string(),
            notes: Some("3 days".to_string()),
        }],
    });
    assert!(storage
        .replace_disease_tree(disease_id, &resync)
        .await
        .expect("replace"));

    let disease = storage
        .load_disease_tree(disease_id)
        .await
        .expect("load")
        .expect("present");
    let groups = &disease.subcategories[0].age_groups;
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1].medicines[0].medicine_name, "Azithromycin");

    // Stock and bed tables stay independent of protocol rewrites.
    let ward = storage.create_department("Pulmonology").await.expect("dept");
    storage
        .create_bed(ward.department_id, "P-01", BedStatus::Occupied)
        .await
        .expect("bed");
    storage
        .create_inventory(&NewInventory {
            medicine_id: azithromycin.medicine_id,
            quantity: 30,
            batch_number: Some("AZ-77"),
            expiry_date: None,
        })
        .await
        .expect("inventory");
    let refs = storage
        .medicine_references(azithromycin.medicine_id)
        .await
        .expect("refs");
    assert_eq!(refs.prescriptions, 1);
    assert_eq!(refs.inventory, 1);
}
