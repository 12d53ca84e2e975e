//! Category Repository Module
//!
//! - category_repo: Core CRUD operations and the guarded delete
//! - category_hierarchy: Sibling group queries
//! - category_positioning: Sort key management and reordering

mod category_repo;
mod category_hierarchy;
mod category_positioning;

pub use category_repo::CategoryRepository;
pub(crate) use category_repo::find_category;

// Re-export all operation traits so they can be used by importing CategoryRepository
pub use category_hierarchy::CategoryHierarchyOperations;
pub use category_positioning::CategoryPositioningOperations;
