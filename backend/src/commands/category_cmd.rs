//! Commands for Category operations
//!
//! Taxonomy CRUD, the assembled tree and drag reordering.

use crate::domain::{build_tree, Category, CategoryLevel, DomainError, DomainResult, LargeNode, ReorderPlan, SiblingScope};
use crate::repository::{CategoryHierarchyOperations, CategoryPositioningOperations, Repository};
use crate::AppState;

/// Create a category. Without `order` it is appended to its sibling group.
pub async fn create_category(
    state: &AppState,
    name: String,
    level: CategoryLevel,
    parent_id: Option<u32>,
    order: Option<i64>,
) -> DomainResult<Category> {
    let mut category = match parent_id {
        Some(parent_id) => Category::new_child(name, level, parent_id, 0),
        None => Category::new_large(name, 0),
    };
    category.level = level;
    // Reject shape errors before touching sort keys
    category.validate_shape()?;

    category.order = match order {
        Some(order) => order,
        None => {
            let scope = SiblingScope::of(&category)?;
            state.category_repo.next_order(scope, state.config.order_stride).await?
        }
    };
    state.category_repo.create(&category).await
}

/// All categories ordered by level, parent and order
pub async fn list_categories(state: &AppState) -> DomainResult<Vec<Category>> {
    state.category_repo.list().await
}

pub async fn get_category(state: &AppState, id: u32) -> DomainResult<Option<Category>> {
    state.category_repo.find_by_id(id).await
}

/// Rename and/or set the sort key manually
pub async fn update_category(
    state: &AppState,
    id: u32,
    name: Option<String>,
    order: Option<i64>,
) -> DomainResult<Category> {
    let existing = state
        .category_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Category {} not found", id)))?;

    let updated = Category {
        name: name.unwrap_or(existing.name.clone()),
        order: order.unwrap_or(existing.order),
        ..existing
    };
    state.category_repo.update(&updated).await
}

/// One sibling group: Large roots when `parent_id` is None
pub async fn list_children(
    state: &AppState,
    level: CategoryLevel,
    parent_id: Option<u32>,
) -> DomainResult<Vec<Category>> {
    let scope = match (level, parent_id) {
        (CategoryLevel::Large, None) => SiblingScope::Root,
        (CategoryLevel::Medium, Some(large_id)) => SiblingScope::Medium { large_id },
        (CategoryLevel::Small, Some(medium_id)) => SiblingScope::Small { medium_id },
        _ => {
            return Err(DomainError::InvalidInput(format!(
                "{} categories cannot be listed with parent {:?}",
                level.label(),
                parent_id
            )))
        }
    };
    state.category_repo.list_children(scope).await
}

/// Delete a leaf category nothing refers to
pub async fn delete_category(state: &AppState, id: u32) -> DomainResult<()> {
    state.category_repo.delete(id).await
}

/// The full forest
pub async fn get_category_tree(state: &AppState) -> DomainResult<Vec<LargeNode>> {
    let categories = state.category_repo.list().await?;
    Ok(build_tree(&categories))
}

/// Apply a drop inside one sibling group.
///
/// Drops across groups and drops back onto the same index change nothing
/// and return `Ok(None)`.
pub async fn reorder_categories(
    state: &AppState,
    moved_id: u32,
    source: SiblingScope,
    from: usize,
    destination: SiblingScope,
    to: usize,
) -> DomainResult<Option<ReorderPlan>> {
    if source != destination {
        log::debug!("Ignoring drop of {} from {} into {}", moved_id, source, destination);
        return Ok(None);
    }
    state
        .category_repo
        .apply_reorder(source, moved_id, from, to, state.config.order_stride)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_appends_with_stride() {
        let state = AppState::in_memory().await.unwrap();
        let a = create_category(&state, "Grammar".into(), CategoryLevel::Large, None, None)
            .await
            .unwrap();
        let b = create_category(&state, "Vocabulary".into(), CategoryLevel::Large, None, None)
            .await
            .unwrap();
        assert_eq!(a.order, 0);
        assert_eq!(b.order, 100);

        let m = create_category(&state, "Tense".into(), CategoryLevel::Medium, Some(a.id), Some(42))
            .await
            .unwrap();
        assert_eq!(m.order, 42);

        let bad = create_category(&state, "Orphan".into(), CategoryLevel::Small, None, None).await;
        assert!(matches!(bad, Err(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_cross_group_drop_is_ignored() {
        let state = AppState::in_memory().await.unwrap();
        let a = create_category(&state, "A".into(), CategoryLevel::Large, None, None)
            .await
            .unwrap();
        let result = reorder_categories(
            &state,
            a.id,
            SiblingScope::Root,
            0,
            SiblingScope::Medium { large_id: a.id },
            0,
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_and_tree() {
        let state = AppState::in_memory().await.unwrap();
        let a = create_category(&state, "A".into(), CategoryLevel::Large, None, None)
            .await
            .unwrap();
        create_category(&state, "A1".into(), CategoryLevel::Medium, Some(a.id), None)
            .await
            .unwrap();

        let renamed = update_category(&state, a.id, Some("Grammar".into()), None).await.unwrap();
        assert_eq!(renamed.name, "Grammar");
        assert_eq!(renamed.order, a.order);

        let forest = get_category_tree(&state).await.unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].children.len(), 1);

        let children = list_children(&state, CategoryLevel::Medium, Some(a.id)).await.unwrap();
        assert_eq!(children.len(), 1);
        assert!(list_children(&state, CategoryLevel::Medium, None).await.is_err());
    }
}
