//! Search-box filtering. Every filter is a case-insensitive substring match
//! over the fields the corresponding table displays; a blank query keeps
//! every row.

use shared::{
    domain::BedStatus,
    protocol::{Bed, Disease, InventoryRecord, Medicine, StaffMember},
};

fn matches<'a>(query: &str, fields: impl IntoIterator<Item = &'a str>) -> bool {
    let needle = query.trim().to_lowercase();
    needle.is_empty()
        || fields
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter_staff<'a>(staff: &'a [StaffMember], query: &str) -> Vec<&'a StaffMember> {
    staff
        .iter()
        .filter(|member| {
            let fields = [
                Some(member.name.as_str()),
                Some(member.specialization.as_str()),
                member.department_name.as_deref(),
                member.phone.as_deref(),
                member.email.as_deref(),
            ];
            matches(query, fields.into_iter().flatten())
        })
        .collect()
}

/// Beds matching `query` on number or department, optionally limited to one
/// status.
pub fn filter_beds<'a>(beds: &'a [Bed], query: &str, status: Option<BedStatus>) -> Vec<&'a Bed> {
    beds.iter()
        .filter(|bed| status.map_or(true, |wanted| bed.status == wanted))
        .filter(|bed| {
            matches(
                query,
                [bed.bed_number.as_str(), bed.department_name.as_str()],
            )
        })
        .collect()
}

pub fn filter_medicines<'a>(medicines: &'a [Medicine], query: &str) -> Vec<&'a Medicine> {
    medicines
        .iter()
        .filter(|m| matches(query, [m.name.as_str(), m.form.as_str()]))
        .collect()
}

pub fn filter_inventory<'a>(records: &'a [InventoryRecord], query: &str) -> Vec<&'a InventoryRecord> {
    records
        .iter()
        .filter(|record| {
            let fields = [
                Some(record.medicine.name.as_str()),
                Some(record.medicine.form.as_str()),
                record.batch_number.as_deref(),
            ];
            matches(query, fields.into_iter().flatten())
        })
        .collect()
}

/// Matches the disease name, its subcategory names and the medicines any
/// age group prescribes.
pub fn filter_diseases<'a>(diseases: &'a [Disease], query: &str) -> Vec<&'a Disease> {
    diseases
        .iter()
        .filter(|disease| {
            let subcategories = disease.subcategories.iter().map(|s| s.name.as_str());
            let medicines = disease
                .subcategories
                .iter()
                .flat_map(|s| &s.age_groups)
                .flat_map(|a| &a.medicines)
                .map(|p| p.medicine_name.as_str());
            matches(
                query,
                std::iter::once(disease.name.as_str())
                    .chain(subcategories)
                    .chain(medicines),
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/filter_tests.rs"]
mod tests;
