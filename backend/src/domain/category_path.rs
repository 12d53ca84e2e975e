//! Category Paths
//!
//! A path is one Large > Medium > Small selection chain. Materials carry any
//! number of paths; the per-level id sets derived from them form the
//! category index used for membership queries.

use serde::{Deserialize, Serialize};
use super::category::CategoryLevel;

/// One selection chain through the taxonomy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryPath {
    pub large_id: Option<u32>,
    pub medium_id: Option<u32>,
    pub small_id: Option<u32>,
}

impl CategoryPath {
    pub const BLANK: CategoryPath = CategoryPath {
        large_id: None,
        medium_id: None,
        small_id: None,
    };

    pub fn new(large_id: Option<u32>, medium_id: Option<u32>, small_id: Option<u32>) -> Self {
        Self { large_id, medium_id, small_id }
    }

    pub fn is_blank(&self) -> bool {
        self.large_id.is_none() && self.medium_id.is_none() && self.small_id.is_none()
    }

    pub fn get(&self, level: CategoryLevel) -> Option<u32> {
        match level {
            CategoryLevel::Large => self.large_id,
            CategoryLevel::Medium => self.medium_id,
            CategoryLevel::Small => self.small_id,
        }
    }

    /// Set one level; deeper levels are cleared
    pub fn select(&mut self, level: CategoryLevel, id: Option<u32>) {
        match level {
            CategoryLevel::Large => {
                self.large_id = id;
                self.medium_id = None;
                self.small_id = None;
            }
            CategoryLevel::Medium => {
                self.medium_id = id;
                self.small_id = None;
            }
            CategoryLevel::Small => {
                self.small_id = id;
            }
        }
    }

    /// Deepest selected level: small, else medium, else large
    pub fn most_specific(&self) -> Option<(CategoryLevel, u32)> {
        if let Some(id) = self.small_id {
            return Some((CategoryLevel::Small, id));
        }
        if let Some(id) = self.medium_id {
            return Some((CategoryLevel::Medium, id));
        }
        self.large_id.map(|id| (CategoryLevel::Large, id))
    }
}

/// Deduplicated per-level ids derived from a material's paths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryIndex {
    pub large_ids: Vec<u32>,
    pub medium_ids: Vec<u32>,
    pub small_ids: Vec<u32>,
}

impl CategoryIndex {
    /// Keeps first-occurrence order
    pub fn from_paths(paths: &[CategoryPath]) -> Self {
        let mut index = CategoryIndex::default();
        for path in paths {
            for level in CategoryLevel::ALL {
                if let Some(id) = path.get(level) {
                    let ids = index.ids_mut(level);
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        index
    }

    pub fn ids(&self, level: CategoryLevel) -> &[u32] {
        match level {
            CategoryLevel::Large => &self.large_ids,
            CategoryLevel::Medium => &self.medium_ids,
            CategoryLevel::Small => &self.small_ids,
        }
    }

    fn ids_mut(&mut self, level: CategoryLevel) -> &mut Vec<u32> {
        match level {
            CategoryLevel::Large => &mut self.large_ids,
            CategoryLevel::Medium => &mut self.medium_ids,
            CategoryLevel::Small => &mut self.small_ids,
        }
    }

    pub fn contains(&self, level: CategoryLevel, id: u32) -> bool {
        self.ids(level).contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.large_ids.is_empty() && self.medium_ids.is_empty() && self.small_ids.is_empty()
    }

    /// (level, id, position within level)
    pub fn entries(&self) -> Vec<(CategoryLevel, u32, usize)> {
        CategoryLevel::ALL
            .iter()
            .flat_map(|level| {
                self.ids(*level)
                    .iter()
                    .enumerate()
                    .map(move |(pos, id)| (*level, *id, pos))
            })
            .collect()
    }
}

/// Drop paths with nothing selected
pub fn clean_paths(paths: &[CategoryPath]) -> Vec<CategoryPath> {
    paths.iter().filter(|p| !p.is_blank()).copied().collect()
}

/// First path, mirrored into the single-category fields older rows use
pub fn legacy_mirror(paths: &[CategoryPath]) -> CategoryPath {
    paths.first().copied().unwrap_or(CategoryPath::BLANK)
}
