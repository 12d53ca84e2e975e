//! Material Repository - Core CRUD Operations
//!
//! Materials are written together with their ordered paths and the
//! per-level junction rows derived from them, in one transaction.

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::domain::{
    clean_paths, legacy_mirror, CategoryIndex, CategoryLevel, CategoryPath, Difficulty, DomainError,
    DomainResult, Material, MaterialType, Source,
};
use super::super::category::find_category;
use super::super::db::{now_millis, SharedConnection};
use super::super::traits::Repository;

pub(super) const MATERIAL_COLUMNS: &str = "m.id, m.material_type, m.text, m.translation_ko, m.difficulty, \
     m.source_text, m.large_category_id, m.medium_category_id, m.small_category_id, m.created_at, m.updated_at";

/// SQLite implementation of Material repository
pub struct MaterialRepository {
    pub(super) conn: SharedConnection,
}

impl MaterialRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Repository<Material> for MaterialRepository {
    async fn create(&self, entity: &Material) -> DomainResult<Material> {
        let mut material = prepare(entity)?;

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DomainError::Internal("Database not initialized".to_string()))?;
        let tx = conn.transaction()?;

        reject_duplicate(&tx, &material, 0)?;
        check_categories(&tx, &material.paths)?;

        let now = now_millis();
        tx.execute(
            "INSERT INTO materials (material_type, text, translation_ko, difficulty, source_text,
                 large_category_id, medium_category_id, small_category_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                material.material_type.as_str(),
                material.text,
                material.translation_ko,
                material.difficulty.as_str(),
                material.source.text,
                material.legacy.large_id,
                material.legacy.medium_id,
                material.legacy.small_id,
                now,
                now
            ],
        )?;
        material.id = tx.last_insert_rowid() as u32;
        material.created_at = now;
        material.updated_at = now;

        write_categories(&tx, material.id, &material.paths, &material.index)?;
        tx.commit()?;

        log::info!(
            "Created {} {} with {} path(s)",
            material.material_type.as_str(),
            material.id,
            material.paths.len()
        );
        Ok(material)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Material>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;
        find_material(conn, id)
    }

    async fn list(&self) -> DomainResult<Vec<Material>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;
        select_materials(
            conn,
            &format!(
                "SELECT {} FROM materials m ORDER BY m.created_at DESC, m.id DESC",
                MATERIAL_COLUMNS
            ),
            &[],
        )
    }

    async fn update(&self, entity: &Material) -> DomainResult<Material> {
        let mut material = prepare(entity)?;

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DomainError::Internal("Database not initialized".to_string()))?;
        let tx = conn.transaction()?;

        reject_duplicate(&tx, &material, material.id)?;
        check_categories(&tx, &material.paths)?;

        let now = now_millis();
        let changed = tx.execute(
            "UPDATE materials SET material_type = ?, text = ?, translation_ko = ?, difficulty = ?,
                 source_text = ?, large_category_id = ?, medium_category_id = ?, small_category_id = ?,
                 updated_at = ?
             WHERE id = ?",
            params![
                material.material_type.as_str(),
                material.text,
                material.translation_ko,
                material.difficulty.as_str(),
                material.source.text,
                material.legacy.large_id,
                material.legacy.medium_id,
                material.legacy.small_id,
                now,
                material.id
            ],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Material {} not found", material.id)));
        }

        write_categories(&tx, material.id, &material.paths, &material.index)?;
        let created_at: i64 = tx.query_row(
            "SELECT created_at FROM materials WHERE id = ?",
            params![material.id],
            |row| row.get(0),
        )?;
        tx.commit()?;

        material.created_at = created_at;
        material.updated_at = now;
        log::info!("Updated material {}", material.id);
        Ok(material)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        // Paths and junction rows go with it (ON DELETE CASCADE)
        let changed = conn.execute("DELETE FROM materials WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Material {} not found", id)));
        }
        log::info!("Deleted material {}", id);
        Ok(())
    }
}

/// Trim text, drop blank paths and re-derive the index and legacy fields
fn prepare(entity: &Material) -> DomainResult<Material> {
    let mut material = entity.clone();
    material.text = material.text.trim().to_string();
    if material.text.is_empty() {
        return Err(DomainError::InvalidInput("English text is required".into()));
    }
    material.paths = clean_paths(&material.paths);
    material.index = CategoryIndex::from_paths(&material.paths);
    material.legacy = legacy_mirror(&material.paths);
    Ok(material)
}

fn find_duplicate(
    conn: &Connection,
    material_type: MaterialType,
    text: &str,
    exclude_id: u32,
) -> DomainResult<Option<u32>> {
    let mut stmt = conn.prepare("SELECT id FROM materials WHERE material_type = ? AND text = ? AND id != ? LIMIT 1")?;
    let mut rows = stmt.query(params![material_type.as_str(), text, exclude_id])?;
    let id = match rows.next()? {
        Some(row) => Some(row.get(0)?),
        None => None,
    };
    Ok(id)
}

fn reject_duplicate(conn: &Connection, material: &Material, exclude_id: u32) -> DomainResult<()> {
    if let Some(existing) = find_duplicate(conn, material.material_type, &material.text, exclude_id)? {
        log::warn!("Duplicate {} text (existing id {})", material.material_type.as_str(), existing);
        return Err(DomainError::Conflict(format!(
            "A {} with this text already exists",
            material.material_type.as_str()
        )));
    }
    Ok(())
}

/// Each path must be one chain through the tree: every id exists at its
/// level and sits under the id selected one level up.
fn check_categories(conn: &Connection, paths: &[CategoryPath]) -> DomainResult<()> {
    for path in paths {
        let mut parent: Option<u32> = None;
        for level in CategoryLevel::ALL {
            let Some(id) = path.get(level) else {
                parent = None;
                continue;
            };
            let category = find_category(conn, id)?
                .ok_or_else(|| DomainError::InvalidInput(format!("Category {} does not exist", id)))?;
            if category.level != level {
                return Err(DomainError::InvalidInput(format!(
                    "Category {} is a {} category, not {}",
                    id,
                    category.level.label(),
                    level.label()
                )));
            }
            if let Some(parent_level) = level.parent_level() {
                match parent {
                    None => {
                        return Err(DomainError::InvalidInput(format!(
                            "{} category {} needs its {} category selected",
                            level.label(),
                            id,
                            parent_level.label()
                        )))
                    }
                    Some(parent_id) if category.parent_id != Some(parent_id) => {
                        return Err(DomainError::InvalidInput(format!(
                            "{} category {} is not under {} category {}",
                            level.label(),
                            id,
                            parent_level.label(),
                            parent_id
                        )))
                    }
                    Some(_) => {}
                }
            }
            parent = Some(id);
        }
    }
    Ok(())
}

/// Replace the stored paths and junction rows of one material
pub(super) fn write_categories(
    conn: &Connection,
    material_id: u32,
    paths: &[CategoryPath],
    index: &CategoryIndex,
) -> DomainResult<()> {
    conn.execute("DELETE FROM material_paths WHERE material_id = ?", params![material_id])?;
    conn.execute("DELETE FROM material_categories WHERE material_id = ?", params![material_id])?;

    let mut insert_path = conn.prepare(
        "INSERT INTO material_paths (material_id, position, large_id, medium_id, small_id) VALUES (?, ?, ?, ?, ?)",
    )?;
    for (position, path) in paths.iter().enumerate() {
        insert_path.execute(params![
            material_id,
            position as i64,
            path.large_id,
            path.medium_id,
            path.small_id
        ])?;
    }

    let mut insert_entry = conn.prepare(
        "INSERT INTO material_categories (material_id, level, category_id, position) VALUES (?, ?, ?, ?)",
    )?;
    for (level, category_id, position) in index.entries() {
        insert_entry.execute(params![material_id, level.as_str(), category_id, position as i64])?;
    }
    Ok(())
}

pub(super) fn load_paths(conn: &Connection, material_id: u32) -> DomainResult<Vec<CategoryPath>> {
    let mut stmt = conn.prepare(
        "SELECT large_id, medium_id, small_id FROM material_paths WHERE material_id = ? ORDER BY position",
    )?;
    let mut rows = stmt.query(params![material_id])?;
    let mut paths = Vec::new();
    while let Some(row) = rows.next()? {
        paths.push(CategoryPath::new(row.get(0)?, row.get(1)?, row.get(2)?));
    }
    Ok(paths)
}

pub(super) fn find_material(conn: &Connection, id: u32) -> DomainResult<Option<Material>> {
    let sql = format!("SELECT {} FROM materials m WHERE m.id = ?", MATERIAL_COLUMNS);
    let mut materials = select_materials(conn, &sql, &[rusqlite::types::Value::Integer(id as i64)])?;
    Ok(materials.pop())
}

/// Run a material SELECT (columns as `MATERIAL_COLUMNS`) and attach paths
pub(super) fn select_materials(
    conn: &Connection,
    sql: &str,
    values: &[rusqlite::types::Value],
) -> DomainResult<Vec<Material>> {
    let mut materials = Vec::new();
    {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(values.iter()))?;
        while let Some(row) = rows.next()? {
            materials.push(row_to_material(row)?);
        }
    }
    for material in &mut materials {
        material.paths = load_paths(conn, material.id)?;
        material.index = CategoryIndex::from_paths(&material.paths);
    }
    Ok(materials)
}

/// Convert a database row to Material (paths are loaded separately)
fn row_to_material(row: &rusqlite::Row) -> DomainResult<Material> {
    let material_type: String = row.get(1)?;
    let difficulty: String = row.get(4)?;
    Ok(Material {
        id: row.get(0)?,
        material_type: MaterialType::parse(&material_type)?,
        text: row.get(2)?,
        translation_ko: row.get(3)?,
        difficulty: Difficulty::parse(&difficulty)?,
        source: Source { text: row.get(5)? },
        paths: Vec::new(),
        index: CategoryIndex::default(),
        legacy: CategoryPath::new(row.get(6)?, row.get(7)?, row.get(8)?),
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Flat single-category column of a level
pub(super) fn legacy_column(level: CategoryLevel) -> &'static str {
    match level {
        CategoryLevel::Large => "large_category_id",
        CategoryLevel::Medium => "medium_category_id",
        CategoryLevel::Small => "small_category_id",
    }
}
