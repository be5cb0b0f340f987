use std::collections::BTreeSet;

use shared::{
    domain::{DiseaseId, MedicineId},
    error::ApiError,
    protocol::{AgeGroupInput, Disease, DiseaseInput, PrescriptionInput, SubcategoryInput},
};
use tracing::info;

use crate::{internal, optional_free_text, required_free_text, required_text, ApiContext};

/// Trims every text field of the submitted tree and rejects blank names,
/// age ranges and dosages.
fn normalize(input: DiseaseInput) -> Result<DiseaseInput, ApiError> {
    let subcategories = input
        .subcategories
        .into_iter()
        .map(|subcategory| -> Result<SubcategoryInput, ApiError> {
            let age_groups = subcategory
                .age_groups
                .into_iter()
                .map(|age_group| -> Result<AgeGroupInput, ApiError> {
                    let medicines = age_group
                        .medicines
                        .into_iter()
                        .map(|prescription| -> Result<PrescriptionInput, ApiError> {
                            Ok(PrescriptionInput {
                                medicine_id: prescription.medicine_id,
                                dosage: required_free_text("dosage", &prescription.dosage)?,
                                notes: optional_free_text("notes", prescription.notes.as_deref())?,
                            })
                        })
                        .collect::<Result<Vec<_>, ApiError>>()?;
                    Ok(AgeGroupInput {
                        group: age_group.group,
                        age_range: required_text("age range", &age_group.age_range)?,
                        medicines,
                    })
                })
                .collect::<Result<Vec<_>, ApiError>>()?;
            Ok(SubcategoryInput {
                name: required_text("subcategory name", &subcategory.name)?,
                description: optional_free_text("description", subcategory.description.as_deref())?,
                age_groups,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(DiseaseInput {
        name: required_text("disease name", &input.name)?,
        description: optional_free_text("description", input.description.as_deref())?,
        subcategories,
    })
}

fn referenced_medicines(input: &DiseaseInput) -> BTreeSet<MedicineId> {
    input
        .subcategories
        .iter()
        .flat_map(|s| &s.age_groups)
        .flat_map(|a| &a.medicines)
        .map(|p| p.medicine_id)
        .collect()
}

async fn validate(
    ctx: &ApiContext,
    input: DiseaseInput,
    current: Option<DiseaseId>,
) -> Result<DiseaseInput, ApiError> {
    let input = normalize(input)?;

    if let Some(existing) = ctx
        .storage
        .disease_id_by_name(&input.name)
        .await
        .map_err(internal)?
    {
        if Some(existing) != current {
            return Err(ApiError::conflict(format!(
                "disease '{}' already exists",
                input.name
            )));
        }
    }

    for medicine_id in referenced_medicines(&input) {
        ctx.storage
            .get_medicine(medicine_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| ApiError::not_found(format!("medicine {medicine_id} not found")))?;
    }

    Ok(input)
}

pub async fn list_diseases(ctx: &ApiContext) -> Result<Vec<Disease>, ApiError> {
    ctx.storage.list_disease_trees().await.map_err(internal)
}

pub async fn get_disease(ctx: &ApiContext, disease_id: DiseaseId) -> Result<Disease, ApiError> {
    ctx.storage
        .load_disease_tree(disease_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("disease not found"))
}

pub async fn create_disease(ctx: &ApiContext, input: DiseaseInput) -> Result<Disease, ApiError> {
    let input = validate(ctx, input, None).await?;
    let disease_id = ctx
        .storage
        .create_disease_tree(&input)
        .await
        .map_err(internal)?;
    info!(
        %disease_id,
        name = %input.name,
        subcategories = input.subcategories.len(),
        "disease protocol created"
    );
    get_disease(ctx, disease_id).await
}

/// Replaces the disease and its whole protocol tree with `input`.
///
/// Nested rows are recreated, so subcategory, age group and prescription
/// ids in the response differ from the ones the client sent back.
pub async fn update_disease(
    ctx: &ApiContext,
    disease_id: DiseaseId,
    input: DiseaseInput,
) -> Result<Disease, ApiError> {
    get_disease(ctx, disease_id).await?;
    let input = validate(ctx, input, Some(disease_id)).await?;
    let replaced = ctx
        .storage
        .replace_disease_tree(disease_id, &input)
        .await
        .map_err(internal)?;
    if !replaced {
        return Err(ApiError::not_found("disease not found"));
    }
    info!(%disease_id, name = %input.name, "disease protocol replaced");
    get_disease(ctx, disease_id).await
}

pub async fn delete_disease(ctx: &ApiContext, disease_id: DiseaseId) -> Result<(), ApiError> {
    let deleted = ctx
        .storage
        .delete_disease(disease_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(ApiError::not_found("disease not found"));
    }
    info!(%disease_id, "disease protocol deleted");
    Ok(())
}
