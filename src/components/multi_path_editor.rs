//! Multi-Path Editor
//!
//! Ordered list of category pickers. Never empty: the last remaining path
//! is reset to blank instead of removed.

use phrasebank_lib::domain::{CategoryLevel, CategoryPath, LargeNode};

use super::category_picker::CategoryPicker;
use crate::tree::CategoryNames;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiPathEditor {
    pickers: Vec<CategoryPicker>,
}

impl Default for MultiPathEditor {
    fn default() -> Self {
        Self {
            pickers: vec![CategoryPicker::default()],
        }
    }
}

impl MultiPathEditor {
    /// Start from stored paths; an empty list yields one blank path
    pub fn from_paths(paths: &[CategoryPath]) -> Self {
        if paths.is_empty() {
            return Self::default();
        }
        Self {
            pickers: paths.iter().copied().map(CategoryPicker::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pickers.len()
    }

    pub fn paths(&self) -> Vec<CategoryPath> {
        self.pickers.iter().map(|p| p.path).collect()
    }

    pub fn add_path(&mut self) {
        self.pickers.push(CategoryPicker::default());
    }

    pub fn remove_path(&mut self, index: usize) {
        if index >= self.pickers.len() {
            return;
        }
        if self.pickers.len() == 1 {
            self.pickers[0] = CategoryPicker::default();
        } else {
            self.pickers.remove(index);
        }
    }

    /// Returns false for an unknown path index or an id the picker refuses
    pub fn select(&mut self, forest: &[LargeNode], index: usize, level: CategoryLevel, id: Option<u32>) -> bool {
        match self.pickers.get_mut(index) {
            Some(picker) => picker.select(forest, level, id),
            None => false,
        }
    }

    pub fn reconcile(&mut self, forest: &[LargeNode]) {
        for picker in &mut self.pickers {
            picker.reconcile(forest);
        }
    }

    pub fn render(&self, forest: &[LargeNode], names: &CategoryNames) -> String {
        self.pickers
            .iter()
            .enumerate()
            .map(|(i, picker)| format!("Path {}\n{}", i + 1, picker.render(forest, names)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
