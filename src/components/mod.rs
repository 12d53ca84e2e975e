//! UI Components
//!
//! Headless views: state plus the actions that change it, rendered as text.

mod category_picker;
mod multi_path_editor;
mod filter;
mod material_feed;
mod material_editor;
mod materials_list;
mod category_materials;
mod categories_page;
mod login;

pub use category_picker::CategoryPicker;
pub use filter::FilterState;
pub use material_editor::MaterialEditor;
pub use materials_list::MaterialsList;
pub use category_materials::CategoryMaterials;
pub use categories_page::CategoriesPage;
pub use login::LoginForm;
