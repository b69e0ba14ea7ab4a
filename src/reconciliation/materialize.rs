use super::types::{CopyFailure, MaterializeReport, ReconciliationResult};
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error(
        "{} files could not be copied into the project ({} copied): {}",
        .failures.len(),
        .copied.len(),
        summarize(.failures)
    )]
    CopyFailed {
        copied: Vec<String>,
        failures: Vec<CopyFailure>,
    },
}

fn summarize(failures: &[CopyFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.path, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Copy classified files from `output_dir` into `project_dir`.
///
/// Conflicting and modified files go first, then new files. The output
/// version always overwrites the project version. Every file is attempted;
/// failures are collected and nothing already written is rolled back.
pub async fn materialize(
    result: &ReconciliationResult,
    output_dir: &Path,
    project_dir: &Path,
) -> Result<MaterializeReport, MaterializeError> {
    let mut copied = Vec::new();
    let mut failures = Vec::new();

    for relative in result.overwritten_files().chain(result.new_files.iter()) {
        match copy_file(output_dir, project_dir, relative).await {
            Ok(()) => {
                debug!(path = %relative, "Copied into project");
                copied.push(relative.clone());
            }
            Err(e) => {
                error!(path = %relative, error = %e, "Failed to copy into project");
                failures.push(CopyFailure {
                    path: relative.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(MaterializeReport { copied })
    } else {
        Err(MaterializeError::CopyFailed { copied, failures })
    }
}

async fn copy_file(
    output_dir: &Path,
    project_dir: &Path,
    relative: &str,
) -> Result<(), std::io::Error> {
    let source = output_dir.join(relative);
    let destination = project_dir.join(relative);

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await?;
    }

    fs::copy(&source, &destination).await?;
    Ok(())
}
