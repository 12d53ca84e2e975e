//! Sibling Ordering
//!
//! Reorder engine for one sibling group: move an element, then renumber the
//! whole group with a fixed stride so later manual inserts fit in the gaps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use super::category::{Category, CategoryLevel};
use super::entity::{DomainError, DomainResult};

/// Default gap between consecutive sort keys
pub const DEFAULT_ORDER_STRIDE: i64 = 100;

/// One sibling group. Its droppable id is `L-ROOT`, `M-<large id>` or `S-<medium id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiblingScope {
    Root,
    Medium { large_id: u32 },
    Small { medium_id: u32 },
}

impl SiblingScope {
    /// Group holding the children of `parent`; Small categories have none
    pub fn children_of(parent: &Category) -> Option<SiblingScope> {
        match parent.level {
            CategoryLevel::Large => Some(SiblingScope::Medium { large_id: parent.id }),
            CategoryLevel::Medium => Some(SiblingScope::Small { medium_id: parent.id }),
            CategoryLevel::Small => None,
        }
    }

    /// Group the category belongs to
    pub fn of(category: &Category) -> DomainResult<SiblingScope> {
        match (category.level, category.parent_id) {
            (CategoryLevel::Large, None) => Ok(SiblingScope::Root),
            (CategoryLevel::Medium, Some(large_id)) => Ok(SiblingScope::Medium { large_id }),
            (CategoryLevel::Small, Some(medium_id)) => Ok(SiblingScope::Small { medium_id }),
            _ => Err(DomainError::InvalidInput(format!(
                "Category {} has an inconsistent parent",
                category.id
            ))),
        }
    }

    pub fn level(&self) -> CategoryLevel {
        match self {
            SiblingScope::Root => CategoryLevel::Large,
            SiblingScope::Medium { .. } => CategoryLevel::Medium,
            SiblingScope::Small { .. } => CategoryLevel::Small,
        }
    }

    pub fn parent_id(&self) -> Option<u32> {
        match self {
            SiblingScope::Root => None,
            SiblingScope::Medium { large_id } => Some(*large_id),
            SiblingScope::Small { medium_id } => Some(*medium_id),
        }
    }

    pub fn droppable_id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SiblingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiblingScope::Root => write!(f, "L-ROOT"),
            SiblingScope::Medium { large_id } => write!(f, "M-{}", large_id),
            SiblingScope::Small { medium_id } => write!(f, "S-{}", medium_id),
        }
    }
}

impl FromStr for SiblingScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "L-ROOT" {
            return Ok(SiblingScope::Root);
        }
        let invalid = || DomainError::InvalidInput(format!("Unknown sibling group '{}'", s));
        let (prefix, id) = s.split_once('-').ok_or_else(invalid)?;
        let id: u32 = id.parse().map_err(|_| invalid())?;
        match prefix {
            "M" => Ok(SiblingScope::Medium { large_id: id }),
            "S" => Ok(SiblingScope::Small { medium_id: id }),
            _ => Err(invalid()),
        }
    }
}

/// New sort keys for a group, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderPlan {
    pub scope: SiblingScope,
    /// (category id, order)
    pub assignments: Vec<(u32, i64)>,
}

/// Remove at `from`, reinsert at `to`. Returns false when either index is out of range.
pub fn move_element<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    let moved = items.remove(from);
    items.insert(to, moved);
    true
}

/// 0, stride, 2 * stride, ... in sequence order
pub fn normalize_order(ids: &[u32], stride: i64) -> Vec<(u32, i64)> {
    ids.iter()
        .enumerate()
        .map(|(pos, id)| (*id, pos as i64 * stride))
        .collect()
}

/// Plan a move inside `scope`.
///
/// `sibling_ids` is the group in its current display order. `moved_id` must be
/// the element at `from`, otherwise the caller's view is stale. Equal indices
/// yield `Ok(None)`.
pub fn plan_reorder(
    scope: SiblingScope,
    sibling_ids: &[u32],
    moved_id: u32,
    from: usize,
    to: usize,
    stride: i64,
) -> DomainResult<Option<ReorderPlan>> {
    if stride <= 0 {
        return Err(DomainError::InvalidInput("Order stride must be positive".into()));
    }
    if from == to {
        return Ok(None);
    }
    match sibling_ids.get(from) {
        Some(id) if *id == moved_id => {}
        Some(_) => {
            return Err(DomainError::Conflict(format!(
                "Category {} is no longer at position {} in {}; reload and retry",
                moved_id, from, scope
            )))
        }
        None => {
            return Err(DomainError::InvalidInput(format!(
                "Position {} is outside {} ({} entries)",
                from,
                scope,
                sibling_ids.len()
            )))
        }
    }
    let mut ids = sibling_ids.to_vec();
    if !move_element(&mut ids, from, to) {
        return Err(DomainError::InvalidInput(format!(
            "Position {} is outside {} ({} entries)",
            to,
            scope,
            sibling_ids.len()
        )));
    }
    Ok(Some(ReorderPlan {
        scope,
        assignments: normalize_order(&ids, stride),
    }))
}
