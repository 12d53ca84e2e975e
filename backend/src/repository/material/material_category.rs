//! Material-Category Operations
//!
//! Reference counting for the category delete guard and the backfill that
//! gives rows written before paths existed a path and junction rows.

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::domain::{CategoryIndex, CategoryLevel, CategoryPath, DomainError, DomainResult};
use super::super::category::find_category;
use super::material_repo::{legacy_column, write_categories};

/// Trait for material-category operations
#[async_trait]
pub trait MaterialCategoryOperations {
    /// Convert rows that only carry flat category fields into one path each.
    /// Returns the number of rows that gained a path; rows whose flat ids
    /// all point at missing categories are left as they are.
    async fn backfill_category_index(&self) -> DomainResult<usize>;
}

#[async_trait]
impl MaterialCategoryOperations for super::material_repo::MaterialRepository {
    async fn backfill_category_index(&self) -> DomainResult<usize> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DomainError::Internal("Database not initialized".to_string()))?;
        let tx = conn.transaction()?;

        let pending = legacy_only_rows(&tx)?;
        let mut converted = 0;
        for (material_id, legacy) in &pending {
            let path = existing_only(&tx, *legacy)?;
            if path.is_blank() {
                log::debug!("Material {} has no usable category ids; left unindexed", material_id);
                continue;
            }
            let paths = [path];
            write_categories(&tx, *material_id, &paths, &CategoryIndex::from_paths(&paths))?;
            converted += 1;
        }
        tx.commit()?;

        if converted > 0 {
            log::info!("Backfilled category paths for {} material(s)", converted);
        }
        Ok(converted)
    }
}

/// Rows referencing `category_id` at `level` via the flat field or the junction table
pub(crate) fn count_material_references(
    conn: &Connection,
    level: CategoryLevel,
    category_id: u32,
) -> DomainResult<i64> {
    let count = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM materials m
             WHERE m.{} = ?1
                OR EXISTS (SELECT 1 FROM material_categories mc
                           WHERE mc.material_id = m.id AND mc.level = ?2 AND mc.category_id = ?1)",
            legacy_column(level)
        ),
        params![category_id, level.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Materials with no stored paths but at least one flat field set
fn legacy_only_rows(conn: &Connection) -> DomainResult<Vec<(u32, CategoryPath)>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.large_category_id, m.medium_category_id, m.small_category_id
         FROM materials m
         WHERE NOT EXISTS (SELECT 1 FROM material_paths p WHERE p.material_id = m.id)
           AND (m.large_category_id IS NOT NULL
                OR m.medium_category_id IS NOT NULL
                OR m.small_category_id IS NOT NULL)
         ORDER BY m.id",
    )?;
    let mut rows = stmt.query([])?;
    let mut pending = Vec::new();
    while let Some(row) = rows.next()? {
        pending.push((row.get(0)?, CategoryPath::new(row.get(1)?, row.get(2)?, row.get(3)?)));
    }
    Ok(pending)
}

/// Drop flat ids whose category is gone or sits at another level
fn existing_only(conn: &Connection, legacy: CategoryPath) -> DomainResult<CategoryPath> {
    let mut path = CategoryPath::BLANK;
    for level in CategoryLevel::ALL {
        if let Some(id) = legacy.get(level) {
            match find_category(conn, id)? {
                Some(category) if category.level == level => match level {
                    CategoryLevel::Large => path.large_id = Some(id),
                    CategoryLevel::Medium => path.medium_id = Some(id),
                    CategoryLevel::Small => path.small_id = Some(id),
                },
                _ => log::warn!("Skipping missing {} category {} during backfill", level.label(), id),
            }
        }
    }
    Ok(path)
}
