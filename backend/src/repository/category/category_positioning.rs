//! Category Positioning Operations
//!
//! Sort keys inside a sibling group. Every rewrite renumbers the whole group
//! with a fixed stride inside one transaction.

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::domain::{plan_reorder, DomainError, DomainResult, ReorderPlan, SiblingScope};
use super::super::db::now_millis;
use super::category_hierarchy::query_siblings;

/// Trait for category positioning operations
#[async_trait]
pub trait CategoryPositioningOperations {
    /// Sort key that appends to the end of `scope`
    async fn next_order(&self, scope: SiblingScope, stride: i64) -> DomainResult<i64>;

    /// Move the category at `from` to `to` and renumber the group.
    ///
    /// `moved_id` is checked against the stored order at `from`; a mismatch
    /// means the caller's view is stale and nothing is written.
    async fn apply_reorder(
        &self,
        scope: SiblingScope,
        moved_id: u32,
        from: usize,
        to: usize,
        stride: i64,
    ) -> DomainResult<Option<ReorderPlan>>;
}

#[async_trait]
impl CategoryPositioningOperations for super::category_repo::CategoryRepository {
    async fn next_order(&self, scope: SiblingScope, stride: i64) -> DomainResult<i64> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let max: Option<i64> = match scope.parent_id() {
            None => conn.query_row(
                "SELECT MAX(sort_order) FROM categories WHERE level = 'L'",
                [],
                |row| row.get(0),
            )?,
            Some(parent_id) => conn.query_row(
                "SELECT MAX(sort_order) FROM categories WHERE level = ? AND parent_id = ?",
                params![scope.level().as_str(), parent_id],
                |row| row.get(0),
            )?,
        };
        Ok(max.map(|m| m + stride).unwrap_or(0))
    }

    async fn apply_reorder(
        &self,
        scope: SiblingScope,
        moved_id: u32,
        from: usize,
        to: usize,
        stride: i64,
    ) -> DomainResult<Option<ReorderPlan>> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DomainError::Internal("Database not initialized".to_string()))?;
        let tx = conn.transaction()?;

        let ids: Vec<u32> = query_siblings(&tx, scope)?.iter().map(|c| c.id).collect();
        let plan = match plan_reorder(scope, &ids, moved_id, from, to, stride)? {
            Some(plan) => plan,
            None => return Ok(None),
        };

        write_orders(&tx, &plan.assignments)?;
        tx.commit()?;
        log::info!("Reordered {}: {} moved {} -> {}", scope, moved_id, from, to);
        Ok(Some(plan))
    }
}

fn write_orders(conn: &Connection, assignments: &[(u32, i64)]) -> DomainResult<()> {
    let now = now_millis();
    let mut stmt = conn.prepare("UPDATE categories SET sort_order = ?, updated_at = ? WHERE id = ?")?;
    for (id, order) in assignments {
        stmt.execute(params![order, now, id])?;
    }
    Ok(())
}
