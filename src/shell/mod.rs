//! Seam to the host that owns the wizard UI.

use crate::reconciliation::{ReconciliationDecisions, ReconciliationResult};
use crate::template::{TemplateType, UserSelection};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid selection: {0}")]
    InvalidSelection(#[from] serde_json::Error),

    #[error("Dialog failed: {0}")]
    DialogFailed(String),
}

/// Host shell driving the new-item wizard
#[async_trait]
pub trait Shell: Send + Sync {
    /// Show the new-item dialog. `None` means the user cancelled.
    async fn show_new_item_dialog(
        &self,
        template_type: TemplateType,
    ) -> Result<Option<UserSelection>, ShellError>;

    /// Ask which conflicting files to keep. Accepting everything is the default.
    async fn confirm_conflicts(
        &self,
        _result: &ReconciliationResult,
    ) -> Result<ReconciliationDecisions, ShellError> {
        Ok(ReconciliationDecisions::default())
    }

    /// Tell the host to back out of the wizard
    fn cancel_wizard(&self, user_cancelled: bool);

    fn show_error(&self, message: &str);
}

/// Shell for command-line use: the selection comes from a JSON file
#[derive(Debug, Clone, Default)]
pub struct CliShell {
    selection_path: Option<PathBuf>,
    keep: HashSet<String>,
}

impl CliShell {
    pub fn new(selection_path: Option<PathBuf>) -> Self {
        Self {
            selection_path,
            keep: HashSet::new(),
        }
    }

    /// Conflicting files whose project version must be kept
    pub fn with_kept_files(mut self, keep: impl IntoIterator<Item = String>) -> Self {
        self.keep = keep.into_iter().collect();
        self
    }
}

#[async_trait]
impl Shell for CliShell {
    async fn show_new_item_dialog(
        &self,
        template_type: TemplateType,
    ) -> Result<Option<UserSelection>, ShellError> {
        let path = match &self.selection_path {
            Some(path) => path,
            None => return Ok(None),
        };

        let content = fs::read_to_string(path).await?;
        let selection: UserSelection = serde_json::from_str(&content)?;
        info!(
            template_type = %template_type,
            items = selection.items.len(),
            "Loaded selection from {}",
            path.display()
        );

        if selection.items.is_empty() {
            return Ok(None);
        }
        Ok(Some(selection))
    }

    async fn confirm_conflicts(
        &self,
        result: &ReconciliationResult,
    ) -> Result<ReconciliationDecisions, ShellError> {
        for path in &result.conflicting_files {
            if self.keep.contains(path) {
                info!(path = %path, "Keeping project version");
            } else {
                warn!(path = %path, "Overwriting project file");
            }
        }
        Ok(ReconciliationDecisions {
            skip: self.keep.clone(),
        })
    }

    fn cancel_wizard(&self, user_cancelled: bool) {
        if user_cancelled {
            info!("Wizard cancelled by user");
        } else {
            warn!("Wizard cancelled after an error");
        }
    }

    fn show_error(&self, message: &str) {
        error!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_selection_file_means_cancel() {
        let shell = CliShell::new(None);
        let selection = shell.show_new_item_dialog(TemplateType::Page).await.unwrap();
        assert!(selection.is_none());
    }

    #[tokio::test]
    async fn test_reads_selection_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.json");
        fs::write(
            &path,
            r#"{"projectType":"Blank","framework":"MVVMBasic","items":[{"name":"Map","templateId":"Page.Map"}]}"#,
        )
        .await
        .unwrap();

        let shell = CliShell::new(Some(path));
        let selection = shell
            .show_new_item_dialog(TemplateType::Page)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(selection.framework, "MVVMBasic");
        assert_eq!(selection.items[0].template_id, "Page.Map");
    }

    #[tokio::test]
    async fn test_malformed_selection_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.json");
        fs::write(&path, "not json").await.unwrap();

        let shell = CliShell::new(Some(path));
        let result = shell.show_new_item_dialog(TemplateType::Page).await;
        assert!(matches!(result, Err(ShellError::InvalidSelection(_))));
    }

    #[tokio::test]
    async fn test_kept_files_become_skip_decisions() {
        let shell = CliShell::new(None).with_kept_files(vec!["App.xaml".to_string()]);
        let result = ReconciliationResult {
            conflicting_files: vec!["App.xaml".into()],
            ..Default::default()
        };
        let decisions = shell.confirm_conflicts(&result).await.unwrap();
        assert!(decisions.skip.contains("App.xaml"));
    }
}
