use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use shared::{
    domain::{AgeGroupKind, BedStatus, DepartmentId},
    protocol::{AgeGroupInput, Department, DiseaseInput, PrescriptionInput, SubcategoryInput},
};
use storage::{NewInventory, NewMedicine, NewStaff, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Administrative helpers for the hospital database")]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/hospital.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill an empty database with demo departments, beds, staff, stock and
    /// one disease protocol.
    Seed,
    CreateDepartment {
        name: String,
    },
    CreateMedicine {
        name: String,
        #[arg(long, default_value = "Tablet")]
        form: String,
        #[arg(long)]
        strength: String,
        #[arg(long, default_value = "mg")]
        unit: String,
    },
    ListBeds {
        #[arg(long)]
        department_id: Option<i64>,
        #[arg(long)]
        status: Option<BedStatus>,
    },
}

#[derive(Debug, Default, PartialEq, Eq)]
struct SeedReport {
    departments: usize,
    beds: usize,
    staff: usize,
    medicines: usize,
    inventory: usize,
    diseases: usize,
}

const DEPARTMENTS: [(&str, &[&str]); 4] = [
    ("Emergency", &["ER-01", "ER-02", "ER-03"]),
    ("Intensive Care", &["ICU-01", "ICU-02"]),
    ("Pediatrics", &["PED-01", "PED-02", "PED-03"]),
    ("General Ward", &["GW-01", "GW-02", "GW-03", "GW-04"]),
];

const MEDICINES: [(&str, &str, &str, &str, i64, &str); 4] = [
    ("Paracetamol", "Tablet", "500", "mg", 400, "2027-06-30"),
    ("Oral Rehydration Salts", "Sachet", "20.5", "g", 35, "2026-11-30"),
    ("Amoxicillin", "Capsule", "250", "mg", 120, "2027-01-15"),
    ("Artemether/Lumefantrine", "Tablet", "20/120", "mg", 8, "2026-12-01"),
];

async fn seed(storage: &Storage) -> Result<SeedReport> {
    if !storage.list_departments().await?.is_empty() {
        bail!("database already has departments; seed only runs on an empty database");
    }

    let mut report = SeedReport::default();
    let mut department_ids: Vec<DepartmentId> = Vec::new();
    for (name, beds) in DEPARTMENTS {
        let department = storage.create_department(name).await?;
        report.departments += 1;
        for (idx, number) in beds.iter().enumerate() {
            let status = if idx == 0 {
                BedStatus::Occupied
            } else {
                BedStatus::Free
            };
            storage
                .create_bed(department.department_id, number, status)
                .await?;
            report.beds += 1;
        }
        department_ids.push(department.department_id);
    }

    let staff = [
        ("Dr. Abena Owusu", "Emergency Physician", Some(department_ids[0])),
        ("Dr. Tomas Ruiz", "Intensivist", Some(department_ids[1])),
        ("Dr. Mei Lin", "Pediatrician", Some(department_ids[2])),
        ("Grace Njeri", "Nurse", None),
    ];
    for (name, specialization, department_id) in staff {
        storage
            .create_staff(&NewStaff {
                name,
                specialization,
                department_id,
                phone: None,
                email: None,
            })
            .await?;
        report.staff += 1;
    }

    let mut medicine_ids = Vec::new();
    for (name, form, strength, unit, quantity, expiry) in MEDICINES {
        let medicine = storage
            .create_medicine(&NewMedicine {
                name,
                form,
                strength,
                unit,
            })
            .await?;
        report.medicines += 1;
        let expiry_date = NaiveDate::parse_from_str(expiry, "%Y-%m-%d")
            .with_context(|| format!("bad seed expiry date {expiry}"))?;
        storage
            .create_inventory(&NewInventory {
                medicine_id: medicine.medicine_id,
                quantity,
                batch_number: Some("SEED-001"),
                expiry_date: Some(expiry_date),
            })
            .await?;
        report.inventory += 1;
        medicine_ids.push(medicine.medicine_id);
    }

    let prescribe = |idx: usize, dosage: &str| PrescriptionInput {
        medicine_id: medicine_ids[idx],
        dosage: dosage.to_string(),
        notes: None,
    };
    let dengue = DiseaseInput {
        name: "Dengue".to_string(),
        description: Some("Mosquito-borne viral fever".to_string()),
        subcategories: vec![SubcategoryInput {
            name: "Without warning signs".to_string(),
            description: None,
            age_groups: vec![
                AgeGroupInput {
                    group: AgeGroupKind::Child,
                    age_range: "1-12 years".to_string(),
                    medicines: vec![
                        prescribe(0, "15 mg/kg every 6 hours"),
                        prescribe(1, "after every loose stool"),
                    ],
                },
                AgeGroupInput {
                    group: AgeGroupKind::Adult,
                    age_range: "18-65 years".to_string(),
                    medicines: vec![prescribe(0, "1 g every 6 hours, max 4 g/day")],
                },
            ],
        }],
    };
    storage.create_disease_tree(&dengue).await?;
    report.diseases += 1;

    Ok(report)
}

async fn create_department(storage: &Storage, name: &str) -> Result<Department> {
    let name = name.trim();
    if name.is_empty() {
        bail!("department name must not be blank");
    }
    storage.create_department(name).await
}

async fn list_beds(
    storage: &Storage,
    department_id: Option<i64>,
    status: Option<BedStatus>,
) -> Result<()> {
    let beds = storage.list_beds(department_id.map(DepartmentId)).await?;
    for bed in beds
        .iter()
        .filter(|bed| status.map_or(true, |wanted| bed.status == wanted))
    {
        println!(
            "{:>5}  {:<10} {:<12} {}",
            bed.bed_id.0,
            bed.bed_number,
            bed.status.as_str(),
            bed.department_name
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Seed => {
            let report = seed(&storage).await?;
            info!(?report, "seeded demo data");
            println!("seeded {report:?}");
        }
        Command::CreateDepartment { name } => {
            let department = create_department(&storage, &name).await?;
            println!("created department_id={}", department.department_id);
        }
        Command::CreateMedicine {
            name,
            form,
            strength,
            unit,
        } => {
            let medicine = storage
                .create_medicine(&NewMedicine {
                    name: name.trim(),
                    form: form.trim(),
                    strength: strength.trim(),
                    unit: unit.trim(),
                })
                .await?;
            println!("created medicine_id={}", medicine.medicine_id);
        }
        Command::ListBeds {
            department_id,
            status,
        } => list_beds(&storage, department_id, status).await?,
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
