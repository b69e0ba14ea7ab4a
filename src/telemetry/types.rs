use crate::template::{GenerationStatus, TemplateType};
use serde::Serialize;

/// Telemetry for a generated project-level item
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGenEvent {
    pub template_identity: String,
    pub template_name: String,
    pub project_type: String,
    pub framework: String,
    pub status: GenerationStatus,
    pub pages_added: usize,
    pub features_added: usize,
    pub time_spent_secs: f64,
    pub timestamp: String,
}

/// Telemetry for any other generated item
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemGenEvent {
    pub template_identity: String,
    pub template_name: String,
    pub template_type: TemplateType,
    pub project_type: String,
    pub framework: String,
    pub status: GenerationStatus,
    pub timestamp: String,
}

/// Tagged form written by file sinks
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TelemetryEvent<'a> {
    ProjectGen(&'a ProjectGenEvent),
    ItemGen(&'a ItemGenEvent),
}
