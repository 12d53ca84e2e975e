//! Material Query Operations
//!
//! Filtered, cursor-paginated listing ordered by creation time (newest
//! first, id breaking ties). Only the most specific category level of a
//! filter path is applied.

use async_trait::async_trait;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::domain::{CategoryPath, Difficulty, DomainError, DomainResult, Material, MaterialType};
use super::material_repo::{legacy_column, select_materials, MATERIAL_COLUMNS};

/// Position after the last retrieved record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialCursor {
    pub created_at: i64,
    pub id: u32,
}

impl MaterialCursor {
    pub fn after(material: &Material) -> Self {
        Self {
            created_at: material.created_at,
            id: material.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialQuery {
    pub material_type: Option<MaterialType>,
    pub difficulty: Option<Difficulty>,
    pub path: CategoryPath,
    pub cursor: Option<MaterialCursor>,
    pub limit: u32,
}

impl MaterialQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            material_type: None,
            difficulty: None,
            path: CategoryPath::BLANK,
            cursor: None,
            limit,
        }
    }

    /// Same filter, continuing after `cursor`
    pub fn next_page(&self, cursor: MaterialCursor) -> Self {
        Self {
            cursor: Some(cursor),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialPage {
    pub items: Vec<Material>,
    /// Cursor of the last item; None for an empty page
    pub next_cursor: Option<MaterialCursor>,
    /// The page came back full
    pub has_more: bool,
}

impl MaterialPage {
    fn from_items(items: Vec<Material>, limit: u32) -> Self {
        Self {
            next_cursor: items.last().map(MaterialCursor::after),
            has_more: items.len() as u32 >= limit,
            items,
        }
    }
}

/// How the category clause matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CategoryMatch {
    /// Junction rows
    Indexed,
    /// Flat field, only for rows without junction rows
    Legacy,
}

/// Trait for material listing
#[async_trait]
pub trait MaterialQueryOperations {
    /// One page of materials. With `legacy_compat` and a category filter,
    /// rows that only carry the flat category fields are merged in.
    async fn query_page(&self, query: &MaterialQuery, legacy_compat: bool) -> DomainResult<MaterialPage>;
}

#[async_trait]
impl MaterialQueryOperations for super::material_repo::MaterialRepository {
    async fn query_page(&self, query: &MaterialQuery, legacy_compat: bool) -> DomainResult<MaterialPage> {
        if query.limit == 0 {
            return Err(DomainError::InvalidInput("Page size must be positive".into()));
        }

        let scoped = query.path.most_specific().is_some();
        let items = if scoped && legacy_compat {
            let (indexed, legacy) = tokio::try_join!(
                self.fetch(query, CategoryMatch::Indexed),
                self.fetch(query, CategoryMatch::Legacy)
            )?;
            merge_pages(indexed, legacy, query.limit)
        } else {
            self.fetch(query, CategoryMatch::Indexed).await?
        };

        log::debug!(
            "Material page: {} item(s), cursor {:?}, scope {:?}",
            items.len(),
            query.cursor,
            query.path.most_specific()
        );
        Ok(MaterialPage::from_items(items, query.limit))
    }
}

impl super::material_repo::MaterialRepository {
    async fn fetch(&self, query: &MaterialQuery, mode: CategoryMatch) -> DomainResult<Vec<Material>> {
        let (sql, values) = page_sql(query, mode);
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;
        select_materials(conn, &sql, &values)
    }
}

/// SELECT for one page plus its bound values
pub(super) fn page_sql(query: &MaterialQuery, mode: CategoryMatch) -> (String, Vec<Value>) {
    let mut sql = format!("SELECT {} FROM materials m WHERE 1 = 1", MATERIAL_COLUMNS);
    let mut values = Vec::new();

    if let Some(material_type) = query.material_type {
        sql.push_str(" AND m.material_type = ?");
        values.push(Value::Text(material_type.as_str().to_string()));
    }
    if let Some(difficulty) = query.difficulty {
        sql.push_str(" AND m.difficulty = ?");
        values.push(Value::Text(difficulty.as_str().to_string()));
    }

    if let Some((level, id)) = query.path.most_specific() {
        match mode {
            CategoryMatch::Indexed => {
                sql.push_str(
                    " AND EXISTS (SELECT 1 FROM material_categories mc
                       WHERE mc.material_id = m.id AND mc.level = ? AND mc.category_id = ?)",
                );
                values.push(Value::Text(level.as_str().to_string()));
                values.push(Value::Integer(id as i64));
            }
            CategoryMatch::Legacy => {
                sql.push_str(&format!(
                    " AND m.{} = ? AND NOT EXISTS (SELECT 1 FROM material_categories mc WHERE mc.material_id = m.id)",
                    legacy_column(level)
                ));
                values.push(Value::Integer(id as i64));
            }
        }
    }

    if let Some(cursor) = query.cursor {
        sql.push_str(" AND (m.created_at < ? OR (m.created_at = ? AND m.id < ?))");
        values.push(Value::Integer(cursor.created_at));
        values.push(Value::Integer(cursor.created_at));
        values.push(Value::Integer(cursor.id as i64));
    }

    sql.push_str(" ORDER BY m.created_at DESC, m.id DESC LIMIT ?");
    values.push(Value::Integer(query.limit as i64));
    (sql, values)
}

/// Union by id, newest first, cut to `limit`
pub(super) fn merge_pages(indexed: Vec<Material>, legacy: Vec<Material>, limit: u32) -> Vec<Material> {
    let mut merged = indexed;
    for material in legacy {
        if !merged.iter().any(|m| m.id == material.id) {
            merged.push(material);
        }
    }
    merged.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    merged.truncate(limit as usize);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_supersedes_medium_and_large() {
        let mut query = MaterialQuery::new(30);
        query.path = CategoryPath::new(Some(1), Some(2), Some(3));
        let (sql, values) = page_sql(&query, CategoryMatch::Indexed);
        assert_eq!(sql.matches("mc.category_id = ?").count(), 1);
        assert_eq!(values[0], Value::Text("S".into()));
        assert_eq!(values[1], Value::Integer(3));
    }

    #[test]
    fn test_legacy_clause_uses_flat_column() {
        let mut query = MaterialQuery::new(10);
        query.material_type = Some(MaterialType::Sentence);
        query.path = CategoryPath::new(Some(4), None, None);
        let (sql, values) = page_sql(&query, CategoryMatch::Legacy);
        assert!(sql.contains("m.large_category_id = ?"));
        assert!(sql.contains("NOT EXISTS"));
        assert_eq!(values, vec![
            Value::Text("sentence".into()),
            Value::Integer(4),
            Value::Integer(10),
        ]);
    }

    #[test]
    fn test_cursor_clause_breaks_ties_by_id() {
        let query = MaterialQuery::new(5).next_page(MaterialCursor { created_at: 1000, id: 7 });
        let (sql, values) = page_sql(&query, CategoryMatch::Indexed);
        assert!(sql.contains("m.created_at = ? AND m.id < ?"));
        assert!(!sql.contains("material_categories"));
        assert_eq!(values.len(), 4);
    }
}
