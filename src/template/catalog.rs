use super::engine::TemplateError;
use super::types::TemplateInfo;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Name of the descriptor inside each template folder
pub const TEMPLATE_DESCRIPTOR: &str = "template.json";

/// Name of the folder holding a template's files
pub const TEMPLATE_CONTENT_FOLDER: &str = "content";

/// Templates available for generation, keyed by identity
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, TemplateInfo>,
}

impl TemplateCatalog {
    /// Load every `<templates_path>/<folder>/template.json`.
    ///
    /// Folders without a descriptor are ignored; malformed descriptors are
    /// skipped with a warning.
    pub async fn load(templates_path: &Path) -> Result<Self, TemplateError> {
        if !templates_path.is_dir() {
            return Err(TemplateError::TemplatesNotFound(
                templates_path.display().to_string(),
            ));
        }

        let mut catalog = Self::default();
        let mut entries = fs::read_dir(templates_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }

            let descriptor = entry.path().join(TEMPLATE_DESCRIPTOR);
            if !descriptor.exists() {
                continue;
            }

            let content = fs::read_to_string(&descriptor).await?;
            let mut info: TemplateInfo = match serde_json::from_str(&content) {
                Ok(info) => info,
                Err(e) => {
                    warn!(path = %descriptor.display(), error = %e, "Skipping malformed template");
                    continue;
                }
            };
            info.source = entry.path();
            catalog.insert(info);
        }

        Ok(catalog)
    }

    pub fn insert(&mut self, info: TemplateInfo) {
        self.templates.insert(info.identity.clone(), info);
    }

    pub fn get(&self, identity: &str) -> Option<&TemplateInfo> {
        self.templates.get(identity)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateInfo> {
        self.templates.values()
    }
}

/// Folder holding the files a template renders
pub fn content_path(info: &TemplateInfo) -> PathBuf {
    info.source.join(TEMPLATE_CONTENT_FOLDER)
}
