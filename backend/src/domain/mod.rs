//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO storage dependencies.

mod entity;
mod category;
mod category_path;
mod category_tree;
mod material;
mod ordering;
mod user;

pub use entity::{Entity, DomainError, DomainResult};
pub use category::{Category, CategoryLevel};
pub use category_path::{clean_paths, legacy_mirror, CategoryIndex, CategoryPath};
pub use category_tree::{build_tree, find_large, find_medium, flatten_tree, LargeNode, MediumNode};
pub use material::{Difficulty, Material, MaterialDraft, MaterialType, NormalizedDraft, Source};
pub use ordering::{move_element, normalize_order, plan_reorder, ReorderPlan, SiblingScope, DEFAULT_ORDER_STRIDE};
pub use user::{Credentials, Session, User};
