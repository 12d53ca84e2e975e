//! Commands for Material operations

use crate::domain::{DomainError, DomainResult, Material, MaterialDraft};
use crate::repository::{
    MaterialCategoryOperations, MaterialPage, MaterialQuery, MaterialQueryOperations, Repository,
};
use crate::AppState;

/// Create (`id` None) or update a material from editor input
pub async fn save_material(state: &AppState, id: Option<u32>, draft: MaterialDraft) -> DomainResult<Material> {
    let normalized = draft.normalize()?;
    let mut material = Material::from_draft(&normalized);
    match id {
        Some(id) => {
            material.id = id;
            state.material_repo.update(&material).await
        }
        None => state.material_repo.create(&material).await,
    }
}

pub async fn get_material(state: &AppState, id: u32) -> DomainResult<Material> {
    state
        .material_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Material {} not found", id)))
}

pub async fn delete_material(state: &AppState, id: u32) -> DomainResult<()> {
    state.material_repo.delete(id).await
}

/// One page; the page size falls back to the configured one when the query leaves it 0
pub async fn query_materials(state: &AppState, mut query: MaterialQuery) -> DomainResult<MaterialPage> {
    if query.limit == 0 {
        query.limit = state.config.page_size;
    }
    state
        .material_repo
        .query_page(&query, state.config.legacy_compat)
        .await
}

/// Give rows with only flat category fields a path; returns the number converted
pub async fn backfill_category_index(state: &AppState) -> DomainResult<usize> {
    state.material_repo.backfill_category_index().await
}
