//! Category Hierarchy Operations
//!
//! Sibling groups: Large roots, the Mediums of a Large, the Smalls of a Medium.

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::domain::{Category, DomainError, DomainResult, SiblingScope};
use super::category_repo::{row_to_category, CATEGORY_COLUMNS};

/// Trait for category hierarchy operations
#[async_trait]
pub trait CategoryHierarchyOperations {
    /// One sibling group ordered by (order, id)
    async fn list_children(&self, scope: SiblingScope) -> DomainResult<Vec<Category>>;
}

#[async_trait]
impl CategoryHierarchyOperations for super::category_repo::CategoryRepository {
    async fn list_children(&self, scope: SiblingScope) -> DomainResult<Vec<Category>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;
        query_siblings(conn, scope)
    }
}

/// Number of categories naming `id` as their parent
pub(super) fn count_children(conn: &Connection, id: u32) -> DomainResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM categories WHERE parent_id = ?",
        params![id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Members of `scope` in display order
pub(super) fn query_siblings(conn: &Connection, scope: SiblingScope) -> DomainResult<Vec<Category>> {
    let mut categories = Vec::new();
    match scope.parent_id() {
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM categories WHERE level = 'L' ORDER BY sort_order, id",
                CATEGORY_COLUMNS
            ))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                categories.push(row_to_category(row)?);
            }
        }
        Some(parent_id) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM categories WHERE level = ? AND parent_id = ? ORDER BY sort_order, id",
                CATEGORY_COLUMNS
            ))?;
            let mut rows = stmt.query(params![scope.level().as_str(), parent_id])?;
            while let Some(row) = rows.next()? {
                categories.push(row_to_category(row)?);
            }
        }
    }
    Ok(categories)
}
