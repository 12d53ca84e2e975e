//! Material Entity
//!
//! A sentence or passage with its Korean translation, difficulty, source
//! label and category paths.

use serde::{Deserialize, Serialize};
use super::category_path::{clean_paths, legacy_mirror, CategoryIndex, CategoryPath};
use super::entity::{DomainError, DomainResult, Entity};

/// Material kind; text uniqueness is scoped to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    #[default]
    Sentence,
    Passage,
}

impl MaterialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialType::Sentence => "sentence",
            MaterialType::Passage => "passage",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "sentence" => Ok(MaterialType::Sentence),
            "passage" => Ok(MaterialType::Passage),
            other => Err(DomainError::InvalidInput(format!("Unknown material type '{}'", other))),
        }
    }
}

/// A (easy) / B (medium) / C (hard)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    A,
    #[default]
    B,
    C,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::A => "A",
            Difficulty::B => "B",
            Difficulty::C => "C",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "A" => Ok(Difficulty::A),
            "B" => Ok(Difficulty::B),
            "C" => Ok(Difficulty::C),
            other => Err(DomainError::InvalidInput(format!("Unknown difficulty '{}'", other))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::A => "A (easy)",
            Difficulty::B => "B (medium)",
            Difficulty::C => "C (hard)",
        }
    }
}

/// Free-form source label, e.g. "G2-2023-09-29"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub text: Option<String>,
}

/// A curated sentence or passage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// Unique identifier
    pub id: u32,
    pub material_type: MaterialType,
    /// English text, unique per type
    pub text: String,
    pub translation_ko: String,
    pub difficulty: Difficulty,
    pub source: Source,
    /// Category paths in user order; empty for rows written before paths existed
    pub paths: Vec<CategoryPath>,
    /// Derived from `paths` on every write
    #[serde(flatten)]
    pub index: CategoryIndex,
    /// Single-category fields mirroring the first path
    pub legacy: CategoryPath,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Material {
    /// Build from a validated draft; ids and timestamps are set by the store
    pub fn from_draft(draft: &NormalizedDraft) -> Self {
        Self {
            id: 0,
            material_type: draft.material_type,
            text: draft.text.clone(),
            translation_ko: draft.translation_ko.clone(),
            difficulty: draft.difficulty,
            source: draft.source.clone(),
            paths: draft.paths.clone(),
            index: draft.index.clone(),
            legacy: draft.legacy,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Paths to display: the stored paths, else the legacy fields when set
    pub fn display_paths(&self) -> Vec<CategoryPath> {
        if !self.paths.is_empty() {
            return self.paths.clone();
        }
        if self.legacy.is_blank() {
            Vec::new()
        } else {
            vec![self.legacy]
        }
    }

    /// Paths to load into an editor; always at least one
    pub fn editable_paths(&self) -> Vec<CategoryPath> {
        if self.paths.is_empty() {
            vec![self.legacy]
        } else {
            self.paths.clone()
        }
    }

    /// Case-insensitive substring match over text, translation and source.
    /// An empty query matches everything.
    pub fn matches_text(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.text.to_lowercase().contains(&needle)
            || self.translation_ko.to_lowercase().contains(&needle)
            || self
                .source
                .text
                .as_deref()
                .map(|s| s.to_lowercase().contains(&needle))
                .unwrap_or(false)
    }
}

impl Entity for Material {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Editor input before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialDraft {
    pub material_type: MaterialType,
    pub text: String,
    pub translation_ko: String,
    pub difficulty: Difficulty,
    pub source_text: String,
    pub paths: Vec<CategoryPath>,
}

impl Default for MaterialDraft {
    fn default() -> Self {
        Self {
            material_type: MaterialType::Sentence,
            text: String::new(),
            translation_ko: String::new(),
            difficulty: Difficulty::B,
            source_text: String::new(),
            paths: vec![CategoryPath::BLANK],
        }
    }
}

/// Trimmed draft with cleaned paths and derived index / legacy fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDraft {
    pub material_type: MaterialType,
    pub text: String,
    pub translation_ko: String,
    pub difficulty: Difficulty,
    pub source: Source,
    pub paths: Vec<CategoryPath>,
    pub index: CategoryIndex,
    pub legacy: CategoryPath,
}

impl MaterialDraft {
    pub fn from_material(material: &Material) -> Self {
        Self {
            material_type: material.material_type,
            text: material.text.clone(),
            translation_ko: material.translation_ko.clone(),
            difficulty: material.difficulty,
            source_text: material.source.text.clone().unwrap_or_default(),
            paths: material.editable_paths(),
        }
    }

    /// Validate and derive everything stored alongside the paths
    pub fn normalize(&self) -> DomainResult<NormalizedDraft> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(DomainError::InvalidInput("English text is required".into()));
        }
        let source_text = self.source_text.trim();
        let paths = clean_paths(&self.paths);
        Ok(NormalizedDraft {
            material_type: self.material_type,
            text: text.to_string(),
            translation_ko: self.translation_ko.trim().to_string(),
            difficulty: self.difficulty,
            source: Source {
                text: if source_text.is_empty() { None } else { Some(source_text.to_string()) },
            },
            index: CategoryIndex::from_paths(&paths),
            legacy: legacy_mirror(&paths),
            paths,
        })
    }
}
