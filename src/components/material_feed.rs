//! Material Feed
//!
//! Paginated result set behind both list views. Every load carries a
//! request token; a response whose token is no longer the latest is dropped.

use phrasebank_lib::commands;
use phrasebank_lib::domain::{DomainError, Material};
use phrasebank_lib::repository::{MaterialCursor, MaterialPage, MaterialQuery};

use super::filter::FilterState;
use crate::context::{AppContext, RequestGuard};
use crate::store::Notice;

/// Whether a page replaces the items or extends them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Replace,
    Append,
}

#[derive(Debug, Clone, Default)]
pub struct MaterialFeed {
    pub filter: FilterState,
    pub items: Vec<Material>,
    next_cursor: Option<MaterialCursor>,
    pub has_more: bool,
    pub loading: bool,
    requests: RequestGuard,
    pub notice: Option<Notice>,
}

impl MaterialFeed {
    pub fn new(filter: FilterState) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Start a load; returns the token and query to run
    pub fn begin(&mut self, ctx: &AppContext, mode: LoadMode) -> Option<(u64, MaterialQuery)> {
        let mut query = self.filter.to_query(ctx.config().page_size);
        if mode == LoadMode::Append {
            query.cursor = Some(self.next_cursor.filter(|_| self.has_more)?);
        }
        self.loading = true;
        Some((self.requests.begin(ctx), query))
    }

    /// Apply a response. Returns false if it was stale and ignored.
    pub fn apply(&mut self, token: u64, mode: LoadMode, result: Result<MaterialPage, DomainError>) -> bool {
        if !self.requests.is_current(token) {
            log::debug!("Dropping stale material page (token {})", token);
            return false;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                match mode {
                    LoadMode::Replace => self.items = page.items,
                    LoadMode::Append => self.items.extend(page.items),
                }
                self.next_cursor = page.next_cursor;
                self.has_more = page.has_more;
                self.notice = None;
            }
            Err(e) => self.notice = Some(Notice::from(&e)),
        }
        true
    }

    async fn run(&mut self, ctx: &AppContext, mode: LoadMode) {
        if let Some((token, query)) = self.begin(ctx, mode) {
            let result = commands::query_materials(&ctx.state, query).await;
            self.apply(token, mode, result);
        }
    }

    /// First page for the current filter
    pub async fn reload(&mut self, ctx: &AppContext) {
        self.next_cursor = None;
        self.run(ctx, LoadMode::Replace).await;
    }

    /// Next page after the last retrieved record; no-op when nothing is left
    pub async fn load_more(&mut self, ctx: &AppContext) {
        self.run(ctx, LoadMode::Append).await;
    }

    /// Replace the filter. Returns true when the server-side part changed and
    /// the feed must reload; free-text changes only affect `visible`.
    pub fn set_filter(&mut self, filter: FilterState) -> bool {
        let refetch = !self.filter.same_scope(&filter);
        self.filter = filter;
        refetch
    }

    /// Fetched items matching the free-text filter
    pub fn visible(&self) -> Vec<&Material> {
        self.items.iter().filter(|m| m.matches_text(&self.filter.q)).collect()
    }

    pub async fn delete(&mut self, ctx: &AppContext, id: u32) -> Result<(), Notice> {
        if let Err(e) = commands::delete_material(&ctx.state, id).await {
            let notice = Notice::from(&e);
            self.notice = Some(notice.clone());
            return Err(notice);
        }
        self.items.retain(|m| m.id != id);
        Ok(())
    }
}
