#![allow(dead_code)]

use async_trait::async_trait;
use itemgen::reconciliation::ReconciliationResult;
use itemgen::shell::{Shell, ShellError};
use itemgen::telemetry::{ItemGenEvent, ProjectGenEvent, TelemetryError, TelemetrySink};
use itemgen::template::{TemplateType, UserSelection};
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;
use tokio::fs;

/// Create a temporary directory for testing
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write a file, creating parent directories
pub async fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .expect("Should create parent dir");
    }
    fs::write(&path, content).await.expect("Should write file");
}

pub async fn read_file(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative))
        .await
        .expect("Should read file")
}

/// Write a template folder with a descriptor and content files
pub async fn write_template(
    templates: &Path,
    folder: &str,
    descriptor: &str,
    files: &[(&str, &str)],
) {
    write_file(templates, &format!("{}/template.json", folder), descriptor).await;
    for (relative, content) in files {
        write_file(templates, &format!("{}/content/{}", folder, relative), content).await;
    }
}

/// Shell that records what the controller asked of it
#[derive(Default)]
pub struct RecordingShell {
    pub selection: Option<UserSelection>,
    pub fail_dialog: bool,
    pub cancels: Mutex<Vec<bool>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingShell {
    pub fn with_selection(selection: UserSelection) -> Self {
        Self {
            selection: Some(selection),
            ..Default::default()
        }
    }

    pub fn cancels(&self) -> Vec<bool> {
        self.cancels.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl Shell for RecordingShell {
    async fn show_new_item_dialog(
        &self,
        _template_type: TemplateType,
    ) -> Result<Option<UserSelection>, ShellError> {
        if self.fail_dialog {
            return Err(ShellError::DialogFailed("window closed".into()));
        }
        Ok(self.selection.clone())
    }

    fn cancel_wizard(&self, user_cancelled: bool) {
        self.cancels.lock().unwrap().push(user_cancelled);
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Telemetry sink that keeps every event
#[derive(Default)]
pub struct RecordingSink {
    pub projects: Mutex<Vec<ProjectGenEvent>>,
    pub items: Mutex<Vec<ItemGenEvent>>,
}

#[async_trait]
impl TelemetrySink for RecordingSink {
    async fn track_project_gen(&self, event: ProjectGenEvent) -> Result<(), TelemetryError> {
        self.projects.lock().unwrap().push(event);
        Ok(())
    }

    async fn track_item_gen(&self, event: ItemGenEvent) -> Result<(), TelemetryError> {
        self.items.lock().unwrap().push(event);
        Ok(())
    }
}

/// Telemetry sink whose backend is always down
pub struct FailingSink;

#[async_trait]
impl TelemetrySink for FailingSink {
    async fn track_project_gen(&self, _event: ProjectGenEvent) -> Result<(), TelemetryError> {
        Err(TelemetryError::Backend("unreachable".into()))
    }

    async fn track_item_gen(&self, _event: ItemGenEvent) -> Result<(), TelemetryError> {
        Err(TelemetryError::Backend("unreachable".into()))
    }
}

/// Every path across the three lists, checking none repeats
pub fn assert_disjoint(result: &ReconciliationResult) {
    let mut seen = std::collections::HashSet::new();
    for path in result
        .new_files
        .iter()
        .chain(result.modified_files.iter())
        .chain(result.conflicting_files.iter())
    {
        assert!(seen.insert(path.clone()), "{} appears more than once", path);
    }
}
