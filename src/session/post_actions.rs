use super::types::GenerationSession;
use crate::reconciliation::markers::is_failed_marker;
use crate::utils::to_relative_string;
use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PostActionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Post-action '{0}' failed: {1}")]
    Failed(String, String),
}

/// Step run once generated files are in the project
#[async_trait]
pub trait FinishPostAction: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, session: &mut GenerationSession) -> Result<(), PostActionError>;
}

/// Turns failed merge markers left in the output into session warnings
#[derive(Debug, Default)]
pub struct ReportFailedMergesPostAction;

#[async_trait]
impl FinishPostAction for ReportFailedMergesPostAction {
    fn name(&self) -> &str {
        "report-failed-merges"
    }

    async fn execute(&self, session: &mut GenerationSession) -> Result<(), PostActionError> {
        let output = session.output_path().to_path_buf();
        if !output.is_dir() {
            return Ok(());
        }

        let mut failed = Vec::new();
        for entry in WalkDir::new(&output).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&output) {
                let relative = to_relative_string(relative);
                if is_failed_marker(&relative) {
                    failed.push(relative);
                }
            }
        }

        for marker in failed {
            warn!(marker = %marker, "Merge instructions were not applied");
            session.add_warning(format!(
                "Merge instructions in {} were not applied and need to be applied manually",
                marker
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::fs;

    #[tokio::test]
    async fn test_reports_failed_markers() {
        let temp_root = tempfile::tempdir().unwrap();
        let mut session = GenerationSession::with_temp_root("/work/App1", temp_root.path());
        let output = session.output_path().to_path_buf();
        fs::create_dir_all(output.join("Views")).await.unwrap();
        fs::write(output.join("Views/Shell_failedpostaction.xaml"), "x")
            .await
            .unwrap();
        fs::write(output.join("Views/Shell.xaml"), "x").await.unwrap();

        ReportFailedMergesPostAction
            .execute(&mut session)
            .await
            .unwrap();

        assert_eq!(session.warnings().len(), 1);
        assert!(session.warnings()[0].contains("Views/Shell_failedpostaction.xaml"));
    }
}
