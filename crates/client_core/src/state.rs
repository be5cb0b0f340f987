use shared::protocol::{
    Advisory, Bed, Department, Disease, InventoryRecord, Medicine, ServerEvent, StaffMember,
};
use tracing::info;

use crate::{ClientError, DashboardClient};

/// Client-side cache of every collection the dashboard renders.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub departments: Vec<Department>,
    pub staff: Vec<StaffMember>,
    pub beds: Vec<Bed>,
    pub medicines: Vec<Medicine>,
    pub inventory: Vec<InventoryRecord>,
    pub diseases: Vec<Disease>,
    pub alerts: Vec<Advisory>,
}

fn upsert<T, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) {
    let wanted = key(&item);
    match items.iter_mut().find(|existing| key(existing) == wanted) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

impl DashboardState {
    /// Reloads every collection; the cache is left untouched if any fetch fails.
    pub async fn refresh_all(&mut self, client: &DashboardClient) -> Result<(), ClientError> {
        let (departments, staff, beds, medicines, inventory, diseases, alerts) = futures::try_join!(
            client.list_departments(),
            client.list_staff(),
            client.list_beds(None),
            client.list_medicines(),
            client.list_inventory(),
            client.list_diseases(),
            client.list_alerts(),
        )?;

        *self = Self {
            departments,
            staff,
            beds,
            medicines,
            inventory,
            diseases,
            alerts,
        };
        info!(
            departments = self.departments.len(),
            staff = self.staff.len(),
            beds = self.beds.len(),
            inventory = self.inventory.len(),
            diseases = self.diseases.len(),
            "dashboard state refreshed"
        );
        Ok(())
    }

    /// Folds one change-feed event into the cache.
    ///
    /// Denormalised copies follow their source: renaming a department
    /// updates the department name shown on staff and beds, and editing a
    /// medicine updates the copy embedded in inventory records.
    pub fn apply_event(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::DepartmentUpserted { department } => {
                for member in &mut self.staff {
                    if member.department_id == Some(department.department_id) {
                        member.department_name = Some(department.name.clone());
                    }
                }
                for bed in &mut self.beds {
                    if bed.department_id == department.department_id {
                        bed.department_name = department.name.clone();
                    }
                }
                upsert(&mut self.departments, department.clone(), |d| d.department_id);
            }
            ServerEvent::DepartmentDeleted { department_id } => {
                self.departments
                    .retain(|d| d.department_id != *department_id);
            }
            ServerEvent::StaffUpserted { staff } => {
                upsert(&mut self.staff, staff.clone(), |s| s.staff_id);
            }
            ServerEvent::StaffDeleted { staff_id } => {
                self.staff.retain(|s| s.staff_id != *staff_id);
            }
            ServerEvent::BedUpserted { bed } => {
                upsert(&mut self.beds, bed.clone(), |b| b.bed_id);
            }
            ServerEvent::BedDeleted { bed_id } => {
                self.beds.retain(|b| b.bed_id != *bed_id);
            }
            ServerEvent::MedicineUpserted { medicine } => {
                for record in &mut self.inventory {
                    if record.medicine.medicine_id == medicine.medicine_id {
                        record.medicine = medicine.clone();
                    }
                }
                upsert(&mut self.medicines, medicine.clone(), |m| m.medicine_id);
            }
            ServerEvent::MedicineDeleted { medicine_id } => {
                self.medicines.retain(|m| m.medicine_id != *medicine_id);
            }
            ServerEvent::InventoryUpserted { record } => {
                upsert(&mut self.inventory, record.clone(), |r| r.inventory_id);
            }
            ServerEvent::InventoryDeleted { inventory_id } => {
                self.inventory.retain(|r| r.inventory_id != *inventory_id);
            }
            ServerEvent::DiseaseUpserted { disease } => {
                upsert(&mut self.diseases, disease.clone(), |d| d.disease_id);
            }
            ServerEvent::DiseaseDeleted { disease_id } => {
                self.diseases.retain(|d| d.disease_id != *disease_id);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
