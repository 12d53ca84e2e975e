//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
mod db;
mod category;
mod material;
mod user_repo;

#[cfg(test)]
mod tests;

pub use traits::Repository;
pub use db::{init_db, DbState, SharedConnection};
pub(crate) use db::now_millis;
pub use category::{CategoryRepository, CategoryHierarchyOperations, CategoryPositioningOperations};
pub use material::{
    MaterialCategoryOperations, MaterialCursor, MaterialPage, MaterialQuery, MaterialQueryOperations,
    MaterialRepository,
};
pub use user_repo::UserRepository;
