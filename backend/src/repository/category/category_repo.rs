//! Category Repository - Core CRUD Operations
//!
//! SQLite-backed implementation for Category CRUD operations.
//! Specialized operations are in separate modules:
//! - category_hierarchy: sibling groups and parent lookups
//! - category_positioning: sort keys and reordering

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::domain::{Category, CategoryLevel, DomainError, DomainResult};
use super::super::db::{now_millis, SharedConnection};
use super::super::material::count_material_references;
use super::super::traits::Repository;
use super::category_hierarchy::count_children;

pub(super) const CATEGORY_COLUMNS: &str = "id, name, level, parent_id, sort_order, created_at";

/// SQLite implementation of Category repository
pub struct CategoryRepository {
    pub(super) conn: SharedConnection,
}

impl CategoryRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Repository<Category> for CategoryRepository {
    async fn create(&self, entity: &Category) -> DomainResult<Category> {
        let mut category = entity.clone();
        category.name = category.name.trim().to_string();
        category.validate_shape()?;

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        if let Some(parent_id) = category.parent_id {
            let parent = find_category(conn, parent_id)?
                .ok_or_else(|| DomainError::NotFound(format!("Parent category {} not found", parent_id)))?;
            category.validate_parent(&parent)?;
        }

        let now = now_millis();
        conn.execute(
            "INSERT INTO categories (name, level, parent_id, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                category.name,
                category.level.as_str(),
                category.parent_id,
                category.order,
                now,
                now
            ],
        )?;

        category.id = conn.last_insert_rowid() as u32;
        category.created_at = now;
        log::info!(
            "Created {} category {} '{}'",
            category.level.label(),
            category.id,
            category.name
        );
        Ok(category)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Category>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;
        find_category(conn, id)
    }

    async fn list(&self) -> DomainResult<Vec<Category>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories
             ORDER BY CASE level WHEN 'L' THEN 0 WHEN 'M' THEN 1 ELSE 2 END,
                      parent_id, sort_order, id",
            CATEGORY_COLUMNS
        ))?;
        let mut rows = stmt.query([])?;

        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(row_to_category(row)?);
        }
        Ok(categories)
    }

    /// Renames and re-keys; level and parent are fixed after creation
    async fn update(&self, entity: &Category) -> DomainResult<Category> {
        let name = entity.name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidInput("Category name is required".into()));
        }

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let changed = conn.execute(
            "UPDATE categories SET name = ?, sort_order = ?, updated_at = ? WHERE id = ?",
            params![name, entity.order, now_millis(), entity.id],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Category {} not found", entity.id)));
        }

        find_category(conn, entity.id)?
            .ok_or_else(|| DomainError::NotFound(format!("Category {} not found", entity.id)))
    }

    /// Refuses when the category has children or is referenced by a material
    async fn delete(&self, id: u32) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DomainError::Internal("Database not initialized".to_string()))?;
        let tx = conn.transaction()?;

        let category = find_category(&tx, id)?
            .ok_or_else(|| DomainError::NotFound(format!("Category {} not found", id)))?;

        let children = count_children(&tx, id)?;
        if children > 0 {
            log::warn!("Refused to delete category {}: {} children", id, children);
            return Err(DomainError::Integrity("has child categories".into()));
        }

        let references = count_material_references(&tx, category.level, id)?;
        if references > 0 {
            log::warn!("Refused to delete category {}: {} materials", id, references);
            return Err(DomainError::Integrity("in use by materials".into()));
        }

        tx.execute("DELETE FROM categories WHERE id = ?", params![id])?;
        tx.commit()?;
        log::info!("Deleted category {} '{}'", id, category.name);
        Ok(())
    }
}

pub(crate) fn find_category(conn: &Connection, id: u32) -> DomainResult<Option<Category>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS))?;
    let mut rows = stmt.query(params![id])?;
    let category = match rows.next()? {
        Some(row) => Some(row_to_category(row)?),
        None => None,
    };
    Ok(category)
}

/// Convert a database row to Category
pub(super) fn row_to_category(row: &rusqlite::Row) -> DomainResult<Category> {
    let level: String = row.get(2)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        level: CategoryLevel::parse(&level)?,
        parent_id: row.get(3)?,
        order: row.get(4)?,
        created_at: row.get(5)?,
    })
}
