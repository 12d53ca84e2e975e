//! Material Repository Module
//!
//! - material_repo: Core CRUD operations (paths and junction rows included)
//! - material_query: Filtered, cursor-paginated listing
//! - material_category: Category references and legacy backfill

mod material_repo;
mod material_query;
mod material_category;

pub use material_repo::MaterialRepository;
pub use material_query::{MaterialCursor, MaterialPage, MaterialQuery};
pub(crate) use material_category::count_material_references;

pub use material_query::MaterialQueryOperations;
pub use material_category::MaterialCategoryOperations;
