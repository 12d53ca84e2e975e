//! Materials List (`/materials`)
//!
//! All materials with optional type / difficulty / category filters and a
//! free-text filter over the fetched rows.

use phrasebank_lib::domain::{LargeNode, Material};

use super::category_picker::CategoryPicker;
use super::filter::FilterState;
use super::material_feed::MaterialFeed;
use crate::context::AppContext;
use crate::tree::CategoryNames;

/// One material as a card
pub fn render_card(material: &Material, names: &CategoryNames) -> String {
    let mut lines = vec![
        format!(
            "#{} [{}] {}",
            material.id,
            material.material_type.as_str(),
            material.text
        ),
        format!("    {}", material.translation_ko),
        format!("    difficulty {}", material.difficulty.label()),
    ];
    for path in material.display_paths() {
        lines.push(format!("    {}", names.path_label(&path)));
    }
    if let Some(source) = &material.source.text {
        lines.push(format!("    source: {}", source));
    }
    lines.join("\n")
}

/// Feed lines shared by both list views
pub fn render_feed(feed: &MaterialFeed, names: &CategoryNames) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(notice) = &feed.notice {
        out.push(format!("! {}", notice.text()));
    }
    let visible = feed.visible();
    if visible.is_empty() {
        out.push("(no materials)".to_string());
    }
    for material in visible {
        out.push(render_card(material, names));
    }
    if feed.has_more {
        out.push("-- more: type `more` --".to_string());
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct MaterialsList {
    pub feed: MaterialFeed,
    pub picker: CategoryPicker,
}

impl MaterialsList {
    /// Open with filters taken from the route query
    pub async fn open(ctx: &AppContext, query: &str) -> Self {
        let filter = FilterState::from_query_string(query);
        let mut view = Self {
            picker: CategoryPicker::new(filter.path),
            feed: MaterialFeed::new(filter),
        };
        view.feed.reload(ctx).await;
        view
    }

    /// Apply a new filter, reloading only when the server-side part changed
    pub async fn apply_filter(&mut self, ctx: &AppContext, filter: FilterState) {
        self.picker = CategoryPicker::new(filter.path);
        if self.feed.set_filter(filter) {
            self.feed.reload(ctx).await;
        }
    }

    /// After a tree reload, clear selections that no longer exist
    pub async fn reconcile(&mut self, ctx: &AppContext, forest: &[LargeNode]) {
        if self.picker.reconcile(forest) {
            let mut filter = self.feed.filter.clone();
            filter.path = self.picker.path;
            self.apply_filter(ctx, filter).await;
        }
    }

    pub fn render(&self, forest: &[LargeNode], names: &CategoryNames) -> String {
        let mut out = vec![
            format!(
                "Materials  type={} D={} q={:?}",
                self.feed.filter.material_type.map(|t| t.as_str()).unwrap_or("all"),
                self.feed.filter.difficulty.map(|d| d.as_str()).unwrap_or("all"),
                self.feed.filter.q
            ),
            self.picker.render(forest, names),
        ];
        out.extend(render_feed(&self.feed, names));
        out.join("\n")
    }
}
