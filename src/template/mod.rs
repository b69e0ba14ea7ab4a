mod catalog;
mod compose;
mod engine;
mod types;

pub use catalog::{content_path, TemplateCatalog, TEMPLATE_CONTENT_FOLDER, TEMPLATE_DESCRIPTOR};
pub use compose::compose_new_item;
pub use engine::{GenerationEngine, TemplateEngine, TemplateError};
pub use types::{
    results_key, GenInfo, GenerationResult, GenerationStatus, ItemTemplateContext, SelectedItem,
    TemplateInfo, TemplateType, UserSelection,
};
