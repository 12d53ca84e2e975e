//! Phrasebank Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: Data access abstractions and implementations
//! - commands: Async handlers called by the views
//! - config: Application configuration

use tokio::sync::Mutex;

pub mod domain;
pub mod repository;
pub mod commands;
pub mod config;

use config::AppConfig;
use domain::{DomainResult, Session};
use repository::{init_db, CategoryRepository, DbState, MaterialRepository, UserRepository};

/// Application state shared across commands
pub struct AppState {
    pub db_state: DbState,
    pub config: AppConfig,
    pub category_repo: CategoryRepository,
    pub material_repo: MaterialRepository,
    pub user_repo: UserRepository,
    pub session: Mutex<Option<Session>>,
}

impl AppState {
    /// Open the database named by `config` and wire the repositories to it
    pub async fn open(config: AppConfig) -> DomainResult<Self> {
        config.validate()?;
        let db_state = init_db(&config.db_path).await?;

        Ok(Self {
            category_repo: CategoryRepository::new(db_state.conn.clone()),
            material_repo: MaterialRepository::new(db_state.conn.clone()),
            user_repo: UserRepository::new(db_state.conn.clone()),
            session: Mutex::new(None),
            db_state,
            config,
        })
    }

    /// Default configuration over a private in-memory database
    pub async fn in_memory() -> DomainResult<Self> {
        Self::open(AppConfig::in_memory()).await
    }
}
