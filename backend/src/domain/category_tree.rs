//! Category Tree
//!
//! Assembles flat category records into Large roots with Medium children
//! with Small children, keeping the input order inside every group.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use super::category::{Category, CategoryLevel};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediumNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<MediumNode>,
}

/// Build the forest. Input is expected sorted by order within each group
/// (the store returns it that way); that order is preserved. Records whose
/// parent is missing are not attached.
pub fn build_tree(categories: &[Category]) -> Vec<LargeNode> {
    // Build parent -> children maps
    let mut mediums_by_parent: HashMap<u32, Vec<&Category>> = HashMap::new();
    let mut smalls_by_parent: HashMap<u32, Vec<&Category>> = HashMap::new();
    for category in categories {
        match (category.level, category.parent_id) {
            (CategoryLevel::Medium, Some(parent)) => {
                mediums_by_parent.entry(parent).or_default().push(category)
            }
            (CategoryLevel::Small, Some(parent)) => {
                smalls_by_parent.entry(parent).or_default().push(category)
            }
            _ => {}
        }
    }

    categories
        .iter()
        .filter(|c| c.level == CategoryLevel::Large)
        .map(|large| LargeNode {
            category: large.clone(),
            children: mediums_by_parent
                .get(&large.id)
                .map(|mediums| {
                    mediums
                        .iter()
                        .map(|medium| MediumNode {
                            category: (*medium).clone(),
                            children: smalls_by_parent
                                .get(&medium.id)
                                .map(|smalls| smalls.iter().map(|s| (*s).clone()).collect())
                                .unwrap_or_default(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}

/// Depth-first flattening: each Large, then its Mediums, each followed by its Smalls
pub fn flatten_tree(forest: &[LargeNode]) -> Vec<Category> {
    let mut result = Vec::new();
    for large in forest {
        result.push(large.category.clone());
        for medium in &large.children {
            result.push(medium.category.clone());
            result.extend(medium.children.iter().cloned());
        }
    }
    result
}

pub fn find_large(forest: &[LargeNode], id: u32) -> Option<&LargeNode> {
    forest.iter().find(|l| l.category.id == id)
}

pub fn find_medium(forest: &[LargeNode], id: u32) -> Option<&MediumNode> {
    forest
        .iter()
        .flat_map(|l| l.children.iter())
        .find(|m| m.category.id == id)
}
