use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite, SqliteConnection,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{
        AgeGroupId, AgeGroupKind, BedId, BedStatus, DepartmentId, DiseaseId, InventoryId,
        MedicineId, PrescriptionId, StaffId, SubcategoryId,
    },
    protocol::{
        AgeGroup, Bed, Department, Disease, DiseaseInput, InventoryRecord, Medicine,
        PrescribedMedicine, StaffMember, Subcategory, SubcategoryInput,
    },
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Column values for a staff row, already validated by the caller.
#[derive(Debug, Clone)]
pub struct NewStaff<'a> {
    pub name: &'a str,
    pub specialization: &'a str,
    pub department_id: Option<DepartmentId>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct NewMedicine<'a> {
    pub name: &'a str,
    pub form: &'a str,
    pub strength: &'a str,
    pub unit: &'a str,
}

#[derive(Debug, Clone)]
pub struct NewInventory<'a> {
    pub medicine_id: MedicineId,
    pub quantity: i64,
    pub batch_number: Option<&'a str>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepartmentReferences {
    pub beds: i64,
    pub staff: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MedicineReferences {
    pub prescriptions: i64,
    pub inventory: i64,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_department(&self, name: &str) -> Result<Department> {
        let row = sqlx::query("INSERT INTO departments (name) VALUES (?) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .context("failed to insert department")?;
        department_from_row(&row)
    }

    pub async fn get_department(&self, department_id: DepartmentId) -> Result<Option<Department>> {
        let row = sqlx::query("SELECT id, name FROM departments WHERE id = ?")
            .bind(department_id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(department_from_row).transpose()
    }

    pub async fn list_departments(&self) -> Result<Vec<Department>> {
        let rows = sqlx::query("SELECT id, name FROM departments ORDER BY lower(name) ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(department_from_row).collect()
    }

    pub async fn update_department(
        &self,
        department_id: DepartmentId,
        name: &str,
    ) -> Result<Option<Department>> {
        let row = sqlx::query("UPDATE departments SET name = ? WHERE id = ? RETURNING id, name")
            .bind(name)
            .bind(department_id.0)
            .fetch_optional(&self.pool)
            .await
            .context("failed to update department")?;
        row.as_ref().map(department_from_row).transpose()
    }

    pub async fn delete_department(&self, department_id: DepartmentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(department_id.0)
            .execute(&self.pool)
            .await
            .context("failed to delete department")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn department_references(
        &self,
        department_id: DepartmentId,
    ) -> Result<DepartmentReferences> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM beds WHERE department_id = ?1),
                (SELECT COUNT(*) FROM staff WHERE department_id = ?1)",
        )
        .bind(department_id.0)
        .fetch_one(&self.pool)
        .await?;
        Ok(DepartmentReferences {
            beds: row.try_get(0)?,
            staff: row.try_get(1)?,
        })
    }

    pub async fn create_staff(&self, staff: &NewStaff<'_>) -> Result<StaffId> {
        let rec = sqlx::query(
            "INSERT INTO staff (name, specialization, department_id, phone, email)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(staff.name)
        .bind(staff.specialization)
        .bind(staff.department_id.map(|id| id.0))
        .bind(staff.phone)
        .bind(staff.email)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert staff member")?;
        Ok(StaffId(rec.try_get::<i64, _>(0)?))
    }

    pub async fn get_staff(&self, staff_id: StaffId) -> Result<Option<StaffMember>> {
        let row = sqlx::query(
            "SELECT s.id, s.name, s.specialization, s.department_id, d.name, s.phone, s.email
             FROM staff s
             LEFT JOIN departments d ON d.id = s.department_id
             WHERE s.id = ?",
        )
        .bind(staff_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(staff_from_row).transpose()
    }

    pub async fn list_staff(&self) -> Result<Vec<StaffMember>> {
        let rows = sqlx::query(
            "SELECT s.id, s.name, s.specialization, s.department_id, d.name, s.phone, s.email
             FROM staff s
             LEFT JOIN departments d ON d.id = s.department_id
             ORDER BY lower(s.name) ASC, s.id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(staff_from_row).collect()
    }

    pub async fn update_staff(&self, staff_id: StaffId, staff: &NewStaff<'_>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE staff
             SET name = ?, specialization = ?, department_id = ?, phone = ?, email = ?
             WHERE id = ?",
        )
        .bind(staff.name)
        .bind(staff.specialization)
        .bind(staff.department_id.map(|id| id.0))
        .bind(staff.phone)
        .bind(staff.email)
        .bind(staff_id.0)
        .execute(&self.pool)
        .await
        .context("failed to update staff member")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_staff(&self, staff_id: StaffId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM staff WHERE id = ?")
            .bind(staff_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create_bed(
        &self,
        department_id: DepartmentId,
        bed_number: &str,
        status: BedStatus,
    ) -> Result<BedId> {
        let rec = sqlx::query(
            "INSERT INTO beds (department_id, bed_number, status) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(department_id.0)
        .bind(bed_number)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .context("failed to insert bed")?;
        Ok(BedId(rec.try_get::<i64, _>(0)?))
    }

    pub async fn get_bed(&self, bed_id: BedId) -> Result<Option<Bed>> {
        let row = sqlx::query(
            "SELECT b.id, b.bed_number, b.department_id, d.name, b.status
             FROM beds b
             INNER JOIN departments d ON d.id = b.department_id
             WHERE b.id = ?",
        )
        .bind(bed_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(bed_from_row).transpose()
    }

    pub async fn list_beds(&self, department_id: Option<DepartmentId>) -> Result<Vec<Bed>> {
        let rows = sqlx::query(
            "SELECT b.id, b.bed_number, b.department_id, d.name, b.status
             FROM beds b
             INNER JOIN departments d ON d.id = b.department_id
             WHERE (?1 IS NULL OR b.department_id = ?1)
             ORDER BY lower(d.name) ASC, b.bed_number ASC, b.id ASC",
        )
        .bind(department_id.map(|id| id.0))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(bed_from_row).collect()
    }

    /// Looks up a bed by its number inside one department, the key the
    /// schema keeps unique.
    pub async fn bed_id_by_number(
        &self,
        department_id: DepartmentId,
        bed_number: &str,
    ) -> Result<Option<BedId>> {
        let row = sqlx::query("SELECT id FROM beds WHERE department_id = ? AND bed_number = ?")
            .bind(department_id.0)
            .bind(bed_number)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.try_get::<i64, _>(0).map(BedId))
            .transpose()
            .map_err(Into::into)
    }

    pub async fn update_bed(
        &self,
        bed_id: BedId,
        department_id: DepartmentId,
        bed_number: &str,
        status: BedStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE beds SET department_id = ?, bed_number = ?, status = ? WHERE id = ?",
        )
        .bind(department_id.0)
        .bind(bed_number)
        .bind(status.as_str())
        .bind(bed_id.0)
        .execute(&self.pool)
        .await
        .context("failed to update bed")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_bed_status(&self, bed_id: BedId, status: BedStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE beds SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(bed_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_bed(&self, bed_id: BedId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM beds WHERE id = ?")
            .bind(bed_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create_medicine(&self, medicine: &NewMedicine<'_>) -> Result<Medicine> {
        let row = sqlx::query(
            "INSERT INTO medicines (name, form, strength, unit) VALUES (?, ?, ?, ?)
             RETURNING id, name, form, strength, unit",
        )
        .bind(medicine.name)
        .bind(medicine.form)
        .bind(medicine.strength)
        .bind(medicine.unit)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert medicine")?;
        medicine_from_row(&row, 0)
    }

    pub async fn get_medicine(&self, medicine_id: MedicineId) -> Result<Option<Medicine>> {
        let row = sqlx::query("SELECT id, name, form, strength, unit FROM medicines WHERE id = ?")
            .bind(medicine_id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(|r| medicine_from_row(r, 0)).transpose()
    }

    pub async fn list_medicines(&self) -> Result<Vec<Medicine>> {
        let rows = sqlx::query(
            "SELECT id, name, form, strength, unit FROM medicines ORDER BY lower(name) ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|r| medicine_from_row(r, 0)).collect()
    }

    pub async fn update_medicine(
        &self,
        medicine_id: MedicineId,
        medicine: &NewMedicine<'_>,
    ) -> Result<Option<Medicine>> {
        let row = sqlx::query(
            "UPDATE medicines SET name = ?, form = ?, strength = ?, unit = ? WHERE id = ?
             RETURNING id, name, form, strength, unit",
        )
        .bind(medicine.name)
        .bind(medicine.form)
        .bind(medicine.strength)
        .bind(medicine.unit)
        .bind(medicine_id.0)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update medicine")?;
        row.as_ref().map(|r| medicine_from_row(r, 0)).transpose()
    }

    pub async fn delete_medicine(&self, medicine_id: MedicineId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM medicines WHERE id = ?")
            .bind(medicine_id.0)
            .execute(&self.pool)
            .await
            .context("failed to delete medicine")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn medicine_references(&self, medicine_id: MedicineId) -> Result<MedicineReferences> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM prescribed_medicines WHERE medicine_id = ?1),
                (SELECT COUNT(*) FROM inventory WHERE medicine_id = ?1)",
        )
        .bind(medicine_id.0)
        .fetch_one(&self.pool)
        .await?;
        Ok(MedicineReferences {
            prescriptions: row.try_get(0)?,
            inventory: row.try_get(1)?,
        })
    }

    pub async fn create_inventory(&self, record: &NewInventory<'_>) -> Result<InventoryId> {
        let rec = sqlx::query(
            "INSERT INTO inventory (medicine_id, quantity, batch_number, expiry_date)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(record.medicine_id.0)
        .bind(record.quantity)
        .bind(record.batch_number)
        .bind(record.expiry_date)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert inventory record")?;
        Ok(InventoryId(rec.try_get::<i64, _>(0)?))
    }

    pub async fn get_inventory(&self, inventory_id: InventoryId) -> Result<Option<InventoryRecord>> {
        let row = sqlx::query(
            "SELECT i.id, i.quantity, i.batch_number, i.expiry_date,
                    m.id, m.name, m.form, m.strength, m.unit
             FROM inventory i
             INNER JOIN medicines m ON m.id = i.medicine_id
             WHERE i.id = ?",
        )
        .bind(inventory_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(inventory_from_row).transpose()
    }

    pub async fn list_inventory(&self) -> Result<Vec<InventoryRecord>> {
        let rows = sqlx::query(
            "SELECT i.id, i.quantity, i.batch_number, i.expiry_date,
                    m.id, m.name, m.form, m.strength, m.unit
             FROM inventory i
             INNER JOIN medicines m ON m.id = i.medicine_id
             ORDER BY lower(m.name) ASC, i.expiry_date IS NULL, i.expiry_date ASC, i.id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(inventory_from_row).collect()
    }

    pub async fn update_inventory(
        &self,
        inventory_id: InventoryId,
        record: &NewInventory<'_>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE inventory
             SET medicine_id = ?, quantity = ?, batch_number = ?, expiry_date = ?
             WHERE id = ?",
        )
        .bind(record.medicine_id.0)
        .bind(record.quantity)
        .bind(record.batch_number)
        .bind(record.expiry_date)
        .bind(inventory_id.0)
        .execute(&self.pool)
        .await
        .context("failed to update inventory record")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_inventory(&self, inventory_id: InventoryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = ?")
            .bind(inventory_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn disease_id_by_name(&self, name: &str) -> Result<Option<DiseaseId>> {
        let row = sqlx::query("SELECT id FROM diseases WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.try_get::<i64, _>(0).map(DiseaseId))
            .transpose()
            .map_err(Into::into)
    }

    /// Inserts a disease together with its whole protocol tree in one
    /// transaction.
    pub async fn create_disease_tree(&self, input: &DiseaseInput) -> Result<DiseaseId> {
        let mut tx = self.pool.begin().await?;
        match insert_disease_tree(&mut *tx, input).await {
            Ok(disease_id) => {
                tx.commit().await?;
                Ok(disease_id)
            }
            Err(err) => {
                tx.rollback().await?;
                Err(err)
            }
        }
    }

    /// Rewrites the disease row and replaces every subcategory below it.
    ///
    /// Existing subcategories are deleted (age groups and prescriptions go
    /// with them through `ON DELETE CASCADE`) and the submitted tree is
    /// inserted fresh, so nested ids change on every update. Returns `false`
    /// when the disease does not exist.
    pub async fn replace_disease_tree(
        &self,
        disease_id: DiseaseId,
        input: &DiseaseInput,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        match rewrite_disease_tree(&mut *tx, disease_id, input).await {
            Ok(true) => {
                tx.commit().await?;
                Ok(true)
            }
            Ok(false) => {
                tx.rollback().await?;
                Ok(false)
            }
            Err(err) => {
                tx.rollback().await?;
                Err(err)
            }
        }
    }

    pub async fn delete_disease(&self, disease_id: DiseaseId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM diseases WHERE id = ?")
            .bind(disease_id.0)
            .execute(&self.pool)
            .await
            .context("failed to delete disease")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn load_disease_tree(&self, disease_id: DiseaseId) -> Result<Option<Disease>> {
        let mut trees = self.load_disease_trees(Some(disease_id)).await?;
        Ok(trees.pop())
    }

    pub async fn list_disease_trees(&self) -> Result<Vec<Disease>> {
        self.load_disease_trees(None).await
    }

    async fn load_disease_trees(&self, only: Option<DiseaseId>) -> Result<Vec<Disease>> {
        let filter = only.map(|id| id.0);

        let disease_rows = sqlx::query(
            "SELECT id, name, description FROM diseases
             WHERE (?1 IS NULL OR id = ?1)
             ORDER BY lower(name) ASC, id ASC",
        )
        .bind(filter)
        .fetch_all(&self.pool)
        .await?;
        if disease_rows.is_empty() {
            return Ok(Vec::new());
        }

        let subcategory_rows = sqlx::query(
            "SELECT id, disease_id, name, description FROM subcategories
             WHERE (?1 IS NULL OR disease_id = ?1)
             ORDER BY id ASC",
        )
        .bind(filter)
        .fetch_all(&self.pool)
        .await?;

        let age_group_rows = sqlx::query(
            "SELECT a.id, a.subcategory_id, a.age_group, a.age_range
             FROM age_groups a
             INNER JOIN subcategories s ON s.id = a.subcategory_id
             WHERE (?1 IS NULL OR s.disease_id = ?1)
             ORDER BY a.id ASC",
        )
        .bind(filter)
        .fetch_all(&self.pool)
        .await?;

        let prescription_rows = sqlx::query(
            "SELECT p.id, p.age_group_id, p.medicine_id, m.name, p.dosage, p.notes
             FROM prescribed_medicines p
             INNER JOIN medicines m ON m.id = p.medicine_id
             INNER JOIN age_groups a ON a.id = p.age_group_id
             INNER JOIN subcategories s ON s.id = a.subcategory_id
             WHERE (?1 IS NULL OR s.disease_id = ?1)
             ORDER BY p.id ASC",
        )
        .bind(filter)
        .fetch_all(&self.pool)
        .await?;

        let mut prescriptions: HashMap<i64, Vec<PrescribedMedicine>> = HashMap::new();
        for row in &prescription_rows {
            let age_group_id: i64 = row.try_get(1)?;
            prescriptions
                .entry(age_group_id)
                .or_default()
                .push(PrescribedMedicine {
                    prescription_id: PrescriptionId(row.try_get(0)?),
                    medicine_id: MedicineId(row.try_get(2)?),
                    medicine_name: row.try_get(3)?,
                    dosage: row.try_get(4)?,
                    notes: row.try_get(5)?,
                });
        }

        let mut age_groups: HashMap<i64, Vec<AgeGroup>> = HashMap::new();
        for row in &age_group_rows {
            let age_group_id: i64 = row.try_get(0)?;
            let subcategory_id: i64 = row.try_get(1)?;
            let group: AgeGroupKind = row.try_get::<String, _>(2)?.parse()?;
            age_groups.entry(subcategory_id).or_default().push(AgeGroup {
                age_group_id: AgeGroupId(age_group_id),
                group,
                age_range: row.try_get(3)?,
                medicines: prescriptions.remove(&age_group_id).unwrap_or_default(),
            });
        }

        let mut subcategories: HashMap<i64, Vec<Subcategory>> = HashMap::new();
        for row in &subcategory_rows {
            let subcategory_id: i64 = row.try_get(0)?;
            let disease_id: i64 = row.try_get(1)?;
            subcategories.entry(disease_id).or_default().push(Subcategory {
                subcategory_id: SubcategoryId(subcategory_id),
                name: row.try_get(2)?,
                description: row.try_get(3)?,
                age_groups: age_groups.remove(&subcategory_id).unwrap_or_default(),
            });
        }

        disease_rows
            .iter()
            .map(|row| {
                let disease_id: i64 = row.try_get(0)?;
                Ok(Disease {
                    disease_id: DiseaseId(disease_id),
                    name: row.try_get(1)?,
                    description: row.try_get(2)?,
                    subcategories: subcategories.remove(&disease_id).unwrap_or_default(),
                })
            })
            .collect()
    }
}

async fn insert_disease_tree(
    conn: &mut SqliteConnection,
    input: &DiseaseInput,
) -> Result<DiseaseId> {
    let rec = sqlx::query("INSERT INTO diseases (name, description) VALUES (?, ?) RETURNING id")
        .bind(&input.name)
        .bind(input.description.as_deref())
        .fetch_one(&mut *conn)
        .await
        .context("failed to insert disease")?;
    let disease_id = DiseaseId(rec.try_get::<i64, _>(0)?);

    insert_subcategories(conn, disease_id, &input.subcategories).await?;
    Ok(disease_id)
}

async fn rewrite_disease_tree(
    conn: &mut SqliteConnection,
    disease_id: DiseaseId,
    input: &DiseaseInput,
) -> Result<bool> {
    let updated = sqlx::query("UPDATE diseases SET name = ?, description = ? WHERE id = ?")
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(disease_id.0)
        .execute(&mut *conn)
        .await
        .context("failed to update disease")?
        .rows_affected();
    if updated == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM subcategories WHERE disease_id = ?")
        .bind(disease_id.0)
        .execute(&mut *conn)
        .await
        .context("failed to clear disease subcategories")?;

    insert_subcategories(conn, disease_id, &input.subcategories).await?;
    Ok(true)
}

async fn insert_subcategories(
    conn: &mut SqliteConnection,
    disease_id: DiseaseId,
    subcategories: &[SubcategoryInput],
) -> Result<()> {
    for subcategory in subcategories {
        let rec = sqlx::query(
            "INSERT INTO subcategories (disease_id, name, description) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(disease_id.0)
        .bind(&subcategory.name)
        .bind(subcategory.description.as_deref())
        .fetch_one(&mut *conn)
        .await
        .context("failed to insert subcategory")?;
        let subcategory_id: i64 = rec.try_get(0)?;

        for age_group in &subcategory.age_groups {
            let rec = sqlx::query(
                "INSERT INTO age_groups (subcategory_id, age_group, age_range) VALUES (?, ?, ?) RETURNING id",
            )
            .bind(subcategory_id)
            .bind(age_group.group.as_str())
            .bind(&age_group.age_range)
            .fetch_one(&mut *conn)
            .await
            .context("failed to insert age group")?;
            let age_group_id: i64 = rec.try_get(0)?;

            for prescription in &age_group.medicines {
                sqlx::query(
                    "INSERT INTO prescribed_medicines (age_group_id, medicine_id, dosage, notes)
                     VALUES (?, ?, ?, ?)",
                )
                .bind(age_group_id)
                .bind(prescription.medicine_id.0)
                .bind(&prescription.dosage)
                .bind(prescription.notes.as_deref())
                .execute(&mut *conn)
                .await
                .with_context(|| {
                    format!(
                        "failed to insert prescription for medicine {}",
                        prescription.medicine_id
                    )
                })?;
            }
        }
    }
    Ok(())
}

fn department_from_row(row: &SqliteRow) -> Result<Department> {
    Ok(Department {
        department_id: DepartmentId(row.try_get(0)?),
        name: row.try_get(1)?,
    })
}

fn staff_from_row(row: &SqliteRow) -> Result<StaffMember> {
    Ok(StaffMember {
        staff_id: StaffId(row.try_get(0)?),
        name: row.try_get(1)?,
        specialization: row.try_get(2)?,
        department_id: row.try_get::<Option<i64>, _>(3)?.map(DepartmentId),
        department_name: row.try_get(4)?,
        phone: row.try_get(5)?,
        email: row.try_get(6)?,
    })
}

fn bed_from_row(row: &SqliteRow) -> Result<Bed> {
    Ok(Bed {
        bed_id: BedId(row.try_get(0)?),
        bed_number: row.try_get(1)?,
        department_id: DepartmentId(row.try_get(2)?),
        department_name: row.try_get(3)?,
        status: row.try_get::<String, _>(4)?.parse()?,
    })
}

fn medicine_from_row(row: &SqliteRow, offset: usize) -> Result<Medicine> {
    Ok(Medicine {
        medicine_id: MedicineId(row.try_get(offset)?),
        name: row.try_get(offset + 1)?,
        form: row.try_get(offset + 2)?,
        strength: row.try_get(offset + 3)?,
        unit: row.try_get(offset + 4)?,
    })
}

fn inventory_from_row(row: &SqliteRow) -> Result<InventoryRecord> {
    Ok(InventoryRecord {
        inventory_id: InventoryId(row.try_get(0)?),
        quantity: row.try_get(1)?,
        batch_number: row.try_get(2)?,
        expiry_date: row.try_get::<Option<NaiveDate>, _>(3)?,
        medicine: medicine_from_row(row, 4)?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
