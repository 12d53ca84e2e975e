//! Commands Layer
//!
//! Async handlers that bridge the views to the repositories.

mod auth_cmd;
mod category_cmd;
mod material_cmd;

pub use auth_cmd::*;
pub use category_cmd::*;
pub use material_cmd::*;
