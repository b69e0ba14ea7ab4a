use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of item a template produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Project,
    Page,
    Feature,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::Project => "project",
            TemplateType::Page => "page",
            TemplateType::Feature => "feature",
        }
    }
}

impl std::fmt::Display for TemplateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A template as described by its `template.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    pub identity: String,
    pub name: String,
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    /// Item name used when the template is pulled in as a dependency
    #[serde(default)]
    pub default_name: String,
    /// Identities of templates that must be generated alongside this one
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Folder the template was loaded from
    #[serde(skip)]
    pub source: PathBuf,
}

/// One requested template instantiation
#[derive(Debug, Clone, PartialEq)]
pub struct GenInfo {
    pub name: String,
    pub template: Option<TemplateInfo>,
}

impl GenInfo {
    pub fn new(name: impl Into<String>, template: TemplateInfo) -> Self {
        Self {
            name: name.into(),
            template: Some(template),
        }
    }

    pub fn template_type(&self) -> Option<TemplateType> {
        self.template.as_ref().map(|t| t.template_type)
    }

    /// Key of this item in the generation results: `{identity}_{name}`
    pub fn results_key(&self) -> Option<String> {
        self.template
            .as_ref()
            .map(|t| results_key(&t.identity, &self.name))
    }
}

pub fn results_key(identity: &str, name: &str) -> String {
    format!("{}_{}", identity, name)
}

/// An item picked in the new-item dialog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedItem {
    pub name: String,
    pub template_id: String,
}

/// What the user asked to generate
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSelection {
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub framework: String,
    #[serde(default)]
    pub items: Vec<SelectedItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Success,
    Failed,
}

/// Engine outcome for one generated item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub status: GenerationStatus,
    /// Output-relative paths written for this item
    pub primary_outputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Placeholders available to template paths and contents:
/// {{item_name}}, {{project_name}}, {{project_type}}, {{framework}}
#[derive(Debug, Clone, Serialize)]
pub struct ItemTemplateContext {
    pub item_name: String,
    pub project_name: String,
    pub project_type: String,
    pub framework: String,
}
