use async_trait::async_trait;
use handlebars::Handlebars;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::catalog::{content_path, TemplateCatalog};
use super::compose::compose_new_item;
use super::types::{
    GenInfo, GenerationResult, GenerationStatus, ItemTemplateContext, TemplateInfo, UserSelection,
};
use crate::reconciliation::markers::{failed_marker_for, is_postaction_marker, merge_target};
use crate::session::GenerationSession;
use crate::utils::to_relative_string;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Render error: {0}")]
    RenderError(#[from] handlebars::RenderError),

    #[error("Template '{0}' not found")]
    TemplateNotFound(String),

    #[error("Templates folder not found: {0}")]
    TemplatesNotFound(String),

    #[error("A name is required for template '{0}'")]
    NameRequired(String),

    #[error("Item name '{0}' is not a valid file name")]
    InvalidItemName(String),

    #[error("Generated path '{0}' is outside the output folder")]
    PathOutsideOutput(String),

    #[error("Item '{0}' was requested more than once")]
    DuplicateItem(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Produces generated files for a session's output directory
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// Build the ordered list of items to generate for a selection
    fn compose(&self, selection: &UserSelection) -> Result<Vec<GenInfo>, TemplateError>;

    /// Write every item into the session output directory.
    ///
    /// Results are keyed by `{identity}_{name}`. Engines register merge-eligible
    /// project files and warnings on the session.
    async fn generate(
        &self,
        session: &mut GenerationSession,
        items: &[GenInfo],
    ) -> Result<HashMap<String, GenerationResult>, TemplateError>;
}

/// Handlebars-backed engine rendering template folders from a catalog
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
    catalog: TemplateCatalog,
}

impl TemplateEngine {
    pub fn new(catalog: TemplateCatalog) -> Self {
        let mut handlebars = Handlebars::new();
        // Generated files are source code, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        Self {
            handlebars,
            catalog,
        }
    }

    /// Load the catalog from disk and build an engine over it
    pub async fn from_path(templates_path: &Path) -> Result<Self, TemplateError> {
        let catalog = TemplateCatalog::load(templates_path).await?;
        info!(
            path = %templates_path.display(),
            count = catalog.len(),
            "Loaded template catalog"
        );
        Ok(Self::new(catalog))
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Render a single template string
    pub fn render(
        &self,
        template: &str,
        context: &ItemTemplateContext,
    ) -> Result<String, TemplateError> {
        self.handlebars
            .render_template(template, context)
            .map_err(TemplateError::from)
    }

    async fn generate_item(
        &self,
        session: &mut GenerationSession,
        template: &TemplateInfo,
        context: &ItemTemplateContext,
    ) -> Result<Vec<String>, TemplateError> {
        let content_root = content_path(template);
        let mut outputs = Vec::new();

        if !content_root.is_dir() {
            debug!(template = %template.identity, "Template has no content folder");
            return Ok(outputs);
        }

        let output_root = session.output_path().to_path_buf();

        for entry in WalkDir::new(&content_root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = match entry.path().strip_prefix(&content_root) {
                Ok(relative) => to_relative_string(relative),
                Err(_) => continue,
            };

            let rendered_relative = self.render(&relative, context)?;
            let destination = output_root.join(contained_relative_path(&rendered_relative)?);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).await?;
            }

            let bytes = fs::read(entry.path()).await?;
            match String::from_utf8(bytes) {
                Ok(text) => {
                    let rendered = self.render(&text, context)?;
                    fs::write(&destination, &rendered).await?;
                    if is_postaction_marker(&rendered_relative) {
                        if let Some(target) = apply_merge(session, &destination, &rendered).await? {
                            outputs.push(target);
                        }
                        continue;
                    }
                }
                Err(raw) => {
                    fs::write(&destination, raw.into_bytes()).await?;
                }
            }

            outputs.push(rendered_relative);
        }

        Ok(outputs)
    }
}

#[async_trait]
impl GenerationEngine for TemplateEngine {
    fn compose(&self, selection: &UserSelection) -> Result<Vec<GenInfo>, TemplateError> {
        compose_new_item(selection, &self.catalog)
    }

    async fn generate(
        &self,
        session: &mut GenerationSession,
        items: &[GenInfo],
    ) -> Result<HashMap<String, GenerationResult>, TemplateError> {
        fs::create_dir_all(session.output_path()).await?;

        let mut results = HashMap::new();

        for item in items {
            let (template, key) = match (&item.template, item.results_key()) {
                (Some(template), Some(key)) => (template, key),
                _ => continue,
            };

            let context = ItemTemplateContext {
                item_name: item.name.clone(),
                project_name: session.project_name().to_string(),
                project_type: session.project_type().to_string(),
                framework: session.framework().to_string(),
            };

            let outputs = self.generate_item(session, template, &context).await?;
            info!(
                template = %template.identity,
                name = %item.name,
                files = outputs.len(),
                "Generated item"
            );

            session.record_item(item.clone());
            results.insert(
                key,
                GenerationResult {
                    status: GenerationStatus::Success,
                    primary_outputs: outputs,
                    message: None,
                },
            );
        }

        Ok(results)
    }
}

/// Check that a rendered path stays inside the folder it is joined onto
fn contained_relative_path(rendered: &str) -> Result<PathBuf, TemplateError> {
    let path = PathBuf::from(rendered);
    let mut has_file = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => has_file = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(TemplateError::PathOutsideOutput(rendered.to_string()));
            }
        }
    }
    if !has_file {
        return Err(TemplateError::PathOutsideOutput(rendered.to_string()));
    }
    Ok(path)
}

/// Append a marker's snippet to its merge target inside the output tree.
///
/// The base is the target already generated in this session, or else the
/// project's copy, which then becomes merge-eligible. With neither available
/// the marker is renamed to a failed marker for the finish post-actions.
/// Returns the output-relative target on success.
async fn apply_merge(
    session: &mut GenerationSession,
    marker: &Path,
    snippet: &str,
) -> Result<Option<String>, TemplateError> {
    let target = match merge_target(marker) {
        Some(target) => target,
        None => return Ok(None),
    };
    let relative: PathBuf = match target.strip_prefix(session.output_path()) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => return Ok(None),
    };
    let relative_str = to_relative_string(&relative);
    let project_file = session.project_path().join(&relative);

    let base = if target.exists() {
        Some(fs::read_to_string(&target).await?)
    } else if project_file.exists() {
        Some(fs::read_to_string(&project_file).await?)
    } else {
        None
    };

    let base = match base {
        Some(base) => base,
        None => {
            if let Some(failed) = failed_marker_for(marker) {
                fs::rename(marker, &failed).await?;
            }
            warn!(path = %relative_str, "Merge target missing in output and project");
            return Ok(None);
        }
    };

    if project_file.exists() {
        session.add_merge_file(project_file);
    }

    let merged = merge_snippet(&base, snippet);
    fs::write(&target, merged).await?;
    Ok(Some(relative_str))
}

/// Append `snippet` unless the base already contains it
fn merge_snippet(base: &str, snippet: &str) -> String {
    let snippet = snippet.trim_end_matches(['\r', '\n']);
    if snippet.is_empty() || base.contains(snippet) {
        return base.to_string();
    }

    let mut merged = base.to_string();
    if !merged.is_empty() && !merged.ends_with('\n') {
        merged.push('\n');
    }
    merged.push_str(snippet);
    merged.push('\n');
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ItemTemplateContext {
        ItemTemplateContext {
            item_name: "Settings".to_string(),
            project_name: "App1".to_string(),
            project_type: "Blank".to_string(),
            framework: "MVVMBasic".to_string(),
        }
    }

    #[test]
    fn test_render_does_not_escape() {
        let engine = TemplateEngine::new(TemplateCatalog::default());
        let rendered = engine
            .render("List<{{item_name}}> in {{project_name}} & co", &context())
            .unwrap();
        assert_eq!(rendered, "List<Settings> in App1 & co");
    }

    #[test]
    fn test_render_paths() {
        let engine = TemplateEngine::new(TemplateCatalog::default());
        let rendered = engine
            .render("Views/{{item_name}}Page.xaml", &context())
            .unwrap();
        assert_eq!(rendered, "Views/SettingsPage.xaml");
    }

    #[test]
    fn test_contained_relative_path() {
        assert_eq!(
            contained_relative_path("Views/MainPage.xaml").unwrap(),
            PathBuf::from("Views/MainPage.xaml")
        );
        assert!(contained_relative_path("./App.xaml").is_ok());
        for escaping in ["../App.xaml", "Views/../../App.xaml", "/etc/passwd", "", "."] {
            assert!(
                matches!(
                    contained_relative_path(escaping),
                    Err(TemplateError::PathOutsideOutput(_))
                ),
                "{} should be rejected",
                escaping
            );
        }
    }

    #[test]
    fn test_merge_snippet() {
        assert_eq!(merge_snippet("a\n", "b\n"), "a\nb\n");
        assert_eq!(merge_snippet("a", "b"), "a\nb\n");
        assert_eq!(merge_snippet("a\nb\n", "b"), "a\nb\n");
        assert_eq!(merge_snippet("", "b"), "b\n");
    }
}
