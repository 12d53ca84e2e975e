//! Tree Utilities
//!
//! Helper functions for tree rendering.

use std::collections::HashMap;

use phrasebank_lib::domain::{Category, CategoryLevel, CategoryPath, LargeNode, SiblingScope};

/// One line of the category outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub category: Category,
    pub depth: usize,
    /// Sibling group the row belongs to
    pub scope: SiblingScope,
    /// Position inside `scope`
    pub index: usize,
}

/// Outline rows in display order: each Large, its Mediums, each Medium's Smalls
pub fn outline_rows(forest: &[LargeNode]) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    for (li, large) in forest.iter().enumerate() {
        rows.push(TreeRow {
            category: large.category.clone(),
            depth: 0,
            scope: SiblingScope::Root,
            index: li,
        });
        for (mi, medium) in large.children.iter().enumerate() {
            rows.push(TreeRow {
                category: medium.category.clone(),
                depth: 1,
                scope: SiblingScope::Medium { large_id: large.category.id },
                index: mi,
            });
            for (si, small) in medium.children.iter().enumerate() {
                rows.push(TreeRow {
                    category: small.clone(),
                    depth: 2,
                    scope: SiblingScope::Small { medium_id: medium.category.id },
                    index: si,
                });
            }
        }
    }
    rows
}

/// id -> name, per level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryNames {
    large: HashMap<u32, String>,
    medium: HashMap<u32, String>,
    small: HashMap<u32, String>,
}

impl CategoryNames {
    pub fn from_categories(categories: &[Category]) -> Self {
        let mut names = Self::default();
        for category in categories {
            names
                .map_mut(category.level)
                .insert(category.id, category.name.clone());
        }
        names
    }

    fn map_mut(&mut self, level: CategoryLevel) -> &mut HashMap<u32, String> {
        match level {
            CategoryLevel::Large => &mut self.large,
            CategoryLevel::Medium => &mut self.medium,
            CategoryLevel::Small => &mut self.small,
        }
    }

    pub fn get(&self, level: CategoryLevel, id: u32) -> Option<&str> {
        let map = match level {
            CategoryLevel::Large => &self.large,
            CategoryLevel::Medium => &self.medium,
            CategoryLevel::Small => &self.small,
        };
        map.get(&id).map(String::as_str)
    }

    /// "Large › Medium › Small"; unknown ids show as "#id", an empty path as "-"
    pub fn path_label(&self, path: &CategoryPath) -> String {
        let parts: Vec<String> = CategoryLevel::ALL
            .iter()
            .filter_map(|level| {
                path.get(*level).map(|id| {
                    self.get(*level, id)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("#{}", id))
                })
            })
            .collect();
        if parts.is_empty() {
            "-".to_string()
        } else {
            parts.join(" › ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrasebank_lib::domain::build_tree;

    fn make_category(id: u32, level: CategoryLevel, parent_id: Option<u32>, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            level,
            parent_id,
            order: 0,
            created_at: 0,
        }
    }

    fn sample() -> Vec<Category> {
        vec![
            make_category(1, CategoryLevel::Large, None, "Grammar"),
            make_category(2, CategoryLevel::Large, None, "Vocabulary"),
            make_category(3, CategoryLevel::Medium, Some(1), "Tense"),
            make_category(4, CategoryLevel::Small, Some(3), "Present perfect"),
            make_category(5, CategoryLevel::Small, Some(3), "Past perfect"),
        ]
    }

    #[test]
    fn test_outline_rows() {
        let rows = outline_rows(&build_tree(&sample()));
        let shape: Vec<(u32, usize, usize)> = rows.iter().map(|r| (r.category.id, r.depth, r.index)).collect();
        assert_eq!(shape, vec![(1, 0, 0), (3, 1, 0), (4, 2, 0), (5, 2, 1), (2, 0, 1)]);
        assert_eq!(rows[3].scope, SiblingScope::Small { medium_id: 3 });
    }

    #[test]
    fn test_path_label() {
        let names = CategoryNames::from_categories(&sample());
        assert_eq!(
            names.path_label(&CategoryPath::new(Some(1), Some(3), Some(4))),
            "Grammar › Tense › Present perfect"
        );
        assert_eq!(names.path_label(&CategoryPath::new(Some(2), None, Some(99))), "Vocabulary › #99");
        assert_eq!(names.path_label(&CategoryPath::BLANK), "-");
    }
}
