//! Global Application State Store
//!
//! Cached category tree shared by the pickers and list views, and the
//! notices views raise.

use phrasebank_lib::commands;
use phrasebank_lib::domain::{build_tree, Category, DomainError, LargeNode};

use crate::context::AppContext;
use crate::tree::CategoryNames;

/// Message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Blocking alert: validation, conflict, integrity
    Alert(String),
    /// Next to the form that caused it (sign-in)
    Inline(String),
    /// Generic failure banner; details only go to the log
    Banner(String),
}

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Alert(msg) | Notice::Inline(msg) | Notice::Banner(msg) => msg,
        }
    }
}

impl From<&DomainError> for Notice {
    fn from(err: &DomainError) -> Self {
        match err {
            DomainError::Unauthorized(msg) => Notice::Inline(msg.clone()),
            DomainError::Internal(_) => {
                log::error!("{}", err);
                Notice::Banner(GENERIC_FAILURE.to_string())
            }
            other => Notice::Alert(other.message().to_string()),
        }
    }
}

impl From<DomainError> for Notice {
    fn from(err: DomainError) -> Self {
        Notice::from(&err)
    }
}

/// Category tree as last loaded
#[derive(Debug, Clone, Default)]
pub struct AppStore {
    pub categories: Vec<Category>,
    pub forest: Vec<LargeNode>,
    pub names: CategoryNames,
    /// Reload version the tree was loaded at; None before the first load
    loaded_version: Option<u64>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.forest = build_tree(&categories);
        self.names = CategoryNames::from_categories(&categories);
        self.categories = categories;
    }

    /// Reload the tree if the context was bumped since the last load.
    /// Returns true when a reload happened.
    pub async fn refresh(&mut self, ctx: &AppContext) -> Result<bool, Notice> {
        let version = ctx.reload_version();
        if self.loaded_version == Some(version) {
            return Ok(false);
        }
        let categories = commands::list_categories(&ctx.state).await?;
        log::debug!("Loaded {} categories (version {})", categories.len(), version);
        self.set_categories(categories);
        self.loaded_version = Some(version);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrasebank_lib::domain::CategoryLevel;
    use phrasebank_lib::AppState;
    use std::sync::Arc;

    #[test]
    fn test_notice_mapping() {
        assert_eq!(
            Notice::from(DomainError::Integrity("has child categories".into())),
            Notice::Alert("has child categories".into())
        );
        assert_eq!(
            Notice::from(DomainError::Unauthorized("Invalid email or password".into())),
            Notice::Inline("Invalid email or password".into())
        );
        assert_eq!(
            Notice::from(DomainError::Internal("disk I/O error".into())),
            Notice::Banner(GENERIC_FAILURE.into())
        );
    }

    #[tokio::test]
    async fn test_refresh_follows_reload_version() {
        let ctx = AppContext::new(Arc::new(AppState::in_memory().await.unwrap()));
        let mut store = AppStore::new();
        assert!(store.refresh(&ctx).await.unwrap());
        assert!(!store.refresh(&ctx).await.unwrap());

        commands::create_category(&ctx.state, "Grammar".into(), CategoryLevel::Large, None, None)
            .await
            .unwrap();
        ctx.reload();
        assert!(store.refresh(&ctx).await.unwrap());
        assert_eq!(store.forest.len(), 1);
    }
}
