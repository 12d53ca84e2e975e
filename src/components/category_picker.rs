//! Category Picker
//!
//! Cascading Large / Medium / Small selection bound to the loaded tree.

use phrasebank_lib::domain::{find_large, find_medium, Category, CategoryLevel, CategoryPath, LargeNode};

use crate::tree::CategoryNames;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryPicker {
    pub path: CategoryPath,
}

impl CategoryPicker {
    pub fn new(path: CategoryPath) -> Self {
        Self { path }
    }

    /// Choices for one level given the current selection
    pub fn options<'a>(&self, forest: &'a [LargeNode], level: CategoryLevel) -> Vec<&'a Category> {
        match level {
            CategoryLevel::Large => forest.iter().map(|l| &l.category).collect(),
            CategoryLevel::Medium => self
                .path
                .large_id
                .and_then(|id| find_large(forest, id))
                .map(|l| l.children.iter().map(|m| &m.category).collect())
                .unwrap_or_default(),
            CategoryLevel::Small => self
                .path
                .medium_id
                .and_then(|id| find_medium(forest, id))
                .map(|m| m.children.iter().collect())
                .unwrap_or_default(),
        }
    }

    /// Small selector is hidden while the selected Medium has no Smalls
    pub fn small_visible(&self, forest: &[LargeNode]) -> bool {
        !self.options(forest, CategoryLevel::Small).is_empty()
    }

    /// Select (or clear) one level; deeper levels are cleared.
    /// An id that is not among the level's current options is refused.
    pub fn select(&mut self, forest: &[LargeNode], level: CategoryLevel, id: Option<u32>) -> bool {
        if let Some(id) = id {
            if !self.options(forest, level).iter().any(|c| c.id == id) {
                return false;
            }
        }
        self.path.select(level, id);
        true
    }

    /// Drop selections that no longer belong to their parent.
    /// Returns true if anything was cleared.
    pub fn reconcile(&mut self, forest: &[LargeNode]) -> bool {
        let before = self.path;
        if let Some(large_id) = self.path.large_id {
            if find_large(forest, large_id).is_none() {
                self.path.select(CategoryLevel::Large, None);
            }
        }
        for level in [CategoryLevel::Medium, CategoryLevel::Small] {
            if let Some(id) = self.path.get(level) {
                if !self.options(forest, level).iter().any(|c| c.id == id) {
                    self.path.select(level, None);
                }
            }
        }
        before != self.path
    }

    /// One line per visible selector, marking the selected option
    pub fn render(&self, forest: &[LargeNode], names: &CategoryNames) -> String {
        let mut lines = Vec::new();
        for level in CategoryLevel::ALL {
            if level == CategoryLevel::Small && !self.small_visible(forest) {
                continue;
            }
            let options = self.options(forest, level);
            if level != CategoryLevel::Large && options.is_empty() {
                continue;
            }
            let choices: Vec<String> = options
                .iter()
                .map(|c| {
                    if self.path.get(level) == Some(c.id) {
                        format!("[{}:{}]", c.id, c.name)
                    } else {
                        format!("{}:{}", c.id, c.name)
                    }
                })
                .collect();
            lines.push(format!("  {}: {}", level.label(), choices.join("  ")));
        }
        lines.push(format!("  = {}", names.path_label(&self.path)));
        lines.join("\n")
    }
}
