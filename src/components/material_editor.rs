//! Material Editor
//!
//! Create / edit form: text fields, difficulty, type and the multi-path
//! category editor.

use phrasebank_lib::commands;
use phrasebank_lib::domain::{Difficulty, LargeNode, Material, MaterialDraft, MaterialType};

use super::multi_path_editor::MultiPathEditor;
use crate::context::AppContext;
use crate::store::Notice;
use crate::tree::CategoryNames;

#[derive(Debug, Clone, Default)]
pub struct MaterialEditor {
    /// None while creating
    pub editing_id: Option<u32>,
    pub material_type: MaterialType,
    pub text: String,
    pub translation_ko: String,
    pub difficulty: Difficulty,
    pub source_text: String,
    pub paths: MultiPathEditor,
    pub notice: Option<Notice>,
}

impl MaterialEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit an existing material; items without paths start from their flat fields
    pub fn from_material(material: &Material) -> Self {
        let draft = MaterialDraft::from_material(material);
        Self {
            editing_id: Some(material.id),
            material_type: draft.material_type,
            text: draft.text,
            translation_ko: draft.translation_ko,
            difficulty: draft.difficulty,
            source_text: draft.source_text,
            paths: MultiPathEditor::from_paths(&draft.paths),
            notice: None,
        }
    }

    pub async fn load(ctx: &AppContext, id: u32) -> Result<Self, Notice> {
        let material = commands::get_material(&ctx.state, id).await?;
        Ok(Self::from_material(&material))
    }

    pub fn draft(&self) -> MaterialDraft {
        MaterialDraft {
            material_type: self.material_type,
            text: self.text.clone(),
            translation_ko: self.translation_ko.clone(),
            difficulty: self.difficulty,
            source_text: self.source_text.clone(),
            paths: self.paths.paths(),
        }
    }

    /// Set a form field by name: text, ko, source, type, difficulty
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), Notice> {
        match field {
            "text" => self.text = value.to_string(),
            "ko" | "translation" => self.translation_ko = value.to_string(),
            "source" => self.source_text = value.to_string(),
            "type" => self.material_type = MaterialType::parse(value.trim())?,
            "difficulty" | "D" => self.difficulty = Difficulty::parse(value.trim())?,
            other => return Err(Notice::Alert(format!("Unknown field '{}'", other))),
        }
        Ok(())
    }

    /// Save; a successful create clears the form for the next entry
    pub async fn save(&mut self, ctx: &AppContext) -> Result<Material, Notice> {
        match commands::save_material(&ctx.state, self.editing_id, self.draft()).await {
            Ok(material) => {
                if self.editing_id.is_none() {
                    let material_type = self.material_type;
                    *self = Self::new();
                    self.material_type = material_type;
                }
                self.notice = None;
                Ok(material)
            }
            Err(e) => {
                let notice = Notice::from(&e);
                self.notice = Some(notice.clone());
                Err(notice)
            }
        }
    }

    pub fn render(&self, forest: &[LargeNode], names: &CategoryNames) -> String {
        let mut out = vec![
            match self.editing_id {
                Some(id) => format!("Edit material #{}", id),
                None => "New material".to_string(),
            },
            format!("  type: {}   difficulty: {}", self.material_type.as_str(), self.difficulty.label()),
            format!("  text: {}", self.text),
            format!("  ko: {}", self.translation_ko),
            format!("  source: {}", self.source_text),
            self.paths.render(forest, names),
        ];
        if let Some(notice) = &self.notice {
            out.push(format!("! {}", notice.text()));
        }
        out.join("\n")
    }
}
