//! By-Category View (`/by-category`)
//!
//! Same feed as the materials list, but the filter lives in the URL query
//! and the material type defaults to sentences.

use phrasebank_lib::domain::{LargeNode, MaterialType};
use tokio::time::Instant;

use super::category_picker::CategoryPicker;
use super::filter::{Debounced, FilterState, UrlSync};
use super::material_feed::MaterialFeed;
use super::materials_list::render_feed;
use crate::context::AppContext;
use crate::tree::CategoryNames;

#[derive(Debug, Clone)]
pub struct CategoryMaterials {
    pub feed: MaterialFeed,
    pub picker: CategoryPicker,
    url: UrlSync,
    /// Query string the address bar currently shows
    pub location: String,
    search: Debounced<String>,
}

impl CategoryMaterials {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            feed: MaterialFeed::default(),
            picker: CategoryPicker::default(),
            url: UrlSync::default(),
            location: String::new(),
            search: Debounced::new(std::time::Duration::from_millis(ctx.config().search_debounce_ms)),
        }
    }

    fn with_default_type(mut filter: FilterState) -> FilterState {
        if filter.material_type.is_none() {
            filter.material_type = Some(MaterialType::Sentence);
        }
        filter
    }

    /// URL changed (route entry, back/forward). Ignored when it shows the
    /// filter already applied.
    pub async fn on_url(&mut self, ctx: &AppContext, query: &str) {
        let Some(filter) = self.url.from_url(query) else {
            return;
        };
        let filter = Self::with_default_type(filter);
        self.location = query.trim_start_matches('?').to_string();
        self.picker = CategoryPicker::new(filter.path);
        let refetch = self.feed.set_filter(filter) || self.feed.items.is_empty();
        // The defaulted type may differ from what the URL said
        self.push_url();
        if refetch {
            self.feed.reload(ctx).await;
        }
    }

    /// Filter changed from the controls
    pub async fn set_filter(&mut self, ctx: &AppContext, filter: FilterState) {
        let filter = Self::with_default_type(filter);
        self.picker = CategoryPicker::new(filter.path);
        let refetch = self.feed.set_filter(filter);
        self.push_url();
        if refetch {
            self.feed.reload(ctx).await;
        }
    }

    fn push_url(&mut self) {
        if let Some(query) = self.url.to_url(&self.feed.filter) {
            log::debug!("by-category url -> ?{}", query);
            self.location = query;
        }
    }

    /// Keystroke in the search box; applied once typing pauses
    pub fn type_search(&mut self, text: &str, now: Instant) {
        self.search.set(text.to_string(), now);
    }

    /// Apply the search text if its quiet period has passed. Returns true if applied.
    pub async fn flush_search(&mut self, ctx: &AppContext, now: Instant) -> bool {
        let Some(q) = self.search.take_ready(now) else {
            return false;
        };
        let mut filter = self.feed.filter.clone();
        filter.q = q;
        self.set_filter(ctx, filter).await;
        true
    }

    /// Wait out the debounce for whatever was typed last
    pub async fn settle_search(&mut self, ctx: &AppContext) {
        if self.search.is_pending() {
            tokio::time::sleep(self.search.delay()).await;
            self.flush_search(ctx, Instant::now()).await;
        }
    }

    pub async fn reconcile(&mut self, ctx: &AppContext, forest: &[LargeNode]) {
        if self.picker.reconcile(forest) {
            let mut filter = self.feed.filter.clone();
            filter.path = self.picker.path;
            self.set_filter(ctx, filter).await;
        }
    }

    pub fn render(&self, forest: &[LargeNode], names: &CategoryNames) -> String {
        let mut out = vec![
            format!("By category  /by-category?{}", self.location),
            self.picker.render(forest, names),
        ];
        out.extend(render_feed(&self.feed, names));
        out.join("\n")
    }
}
