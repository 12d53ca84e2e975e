//! Category Entity
//!
//! Node of the three-level taxonomy (Large > Medium > Small).

use serde::{Deserialize, Serialize};
use super::entity::{DomainError, DomainResult, Entity};

/// Taxonomy level. Stored and transferred as "L" / "M" / "S".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryLevel {
    #[serde(rename = "L")]
    Large,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "S")]
    Small,
}

impl CategoryLevel {
    pub const ALL: [CategoryLevel; 3] = [CategoryLevel::Large, CategoryLevel::Medium, CategoryLevel::Small];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryLevel::Large => "L",
            CategoryLevel::Medium => "M",
            CategoryLevel::Small => "S",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "L" => Ok(CategoryLevel::Large),
            "M" => Ok(CategoryLevel::Medium),
            "S" => Ok(CategoryLevel::Small),
            other => Err(DomainError::InvalidInput(format!("Unknown category level '{}'", other))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryLevel::Large => "Large",
            CategoryLevel::Medium => "Medium",
            CategoryLevel::Small => "Small",
        }
    }

    /// Level a parent must have (None for roots)
    pub fn parent_level(&self) -> Option<CategoryLevel> {
        match self {
            CategoryLevel::Large => None,
            CategoryLevel::Medium => Some(CategoryLevel::Large),
            CategoryLevel::Small => Some(CategoryLevel::Medium),
        }
    }
}

/// A category node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: u32,
    pub name: String,
    pub level: CategoryLevel,
    /// None for Large categories
    pub parent_id: Option<u32>,
    /// Sort key within the sibling group; gaps allowed
    pub order: i64,
    /// Creation time (ms since epoch)
    pub created_at: i64,
}

impl Category {
    /// New Large (root) category
    pub fn new_large(name: impl Into<String>, order: i64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            level: CategoryLevel::Large,
            parent_id: None,
            order,
            created_at: 0,
        }
    }

    /// New Medium or Small category under `parent_id`
    pub fn new_child(name: impl Into<String>, level: CategoryLevel, parent_id: u32, order: i64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            level,
            parent_id: Some(parent_id),
            order,
            created_at: 0,
        }
    }

    /// Name present and parent presence matches the level
    pub fn validate_shape(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("Category name is required".into()));
        }
        match (self.level.parent_level(), self.parent_id) {
            (None, None) | (Some(_), Some(_)) => Ok(()),
            (None, Some(_)) => Err(DomainError::InvalidInput(
                "Large categories cannot have a parent".into(),
            )),
            (Some(level), None) => Err(DomainError::InvalidInput(format!(
                "{} categories need a {} parent",
                self.level.label(),
                level.label()
            ))),
        }
    }

    /// Parent must sit exactly one level above
    pub fn validate_parent(&self, parent: &Category) -> DomainResult<()> {
        if self.level.parent_level() != Some(parent.level) {
            return Err(DomainError::InvalidInput(format!(
                "{} category cannot be placed under {} category {}",
                self.level.label(),
                parent.level.label(),
                parent.id
            )));
        }
        Ok(())
    }
}

impl Entity for Category {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_round_trip() {
        for level in CategoryLevel::ALL {
            assert_eq!(CategoryLevel::parse(level.as_str()).unwrap(), level);
        }
        assert!(CategoryLevel::parse("X").is_err());
    }

    #[test]
    fn test_level_serializes_as_letter() {
        let json = serde_json::to_string(&CategoryLevel::Medium).unwrap();
        assert_eq!(json, "\"M\"");
    }

    #[test]
    fn test_shape_validation() {
        assert!(Category::new_large("Grammar", 0).validate_shape().is_ok());

        let mut orphan = Category::new_child("Tense", CategoryLevel::Medium, 1, 0);
        orphan.parent_id = None;
        assert!(matches!(orphan.validate_shape(), Err(DomainError::InvalidInput(_))));

        let mut rooted = Category::new_large("Grammar", 0);
        rooted.parent_id = Some(3);
        assert!(rooted.validate_shape().is_err());

        assert!(Category::new_large("   ", 0).validate_shape().is_err());
    }

    #[test]
    fn test_parent_validation() {
        let mut large = Category::new_large("Grammar", 0);
        large.id = 1;
        let mut medium = Category::new_child("Tense", CategoryLevel::Medium, 1, 0);
        medium.id = 2;
        let small = Category::new_child("Perfect", CategoryLevel::Small, 2, 0);

        assert!(medium.validate_parent(&large).is_ok());
        assert!(small.validate_parent(&medium).is_ok());
        assert!(small.validate_parent(&large).is_err());
    }
}
