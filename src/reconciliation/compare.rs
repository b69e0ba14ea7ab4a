use super::markers::is_engine_marker;
use super::types::ReconciliationResult;
use crate::utils::{files_are_equal, to_relative_string};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Output directory not found: {0}")]
    OutputNotFound(String),
}

/// Classify every generated file under `output_dir` against `project_dir`.
///
/// - missing in the project: new
/// - byte-identical: left out
/// - different and in `merge_files`: modified
/// - different otherwise: conflicting
///
/// `merge_files` holds absolute paths under `project_dir`.
pub async fn reconcile(
    output_dir: &Path,
    project_dir: &Path,
    merge_files: &HashSet<PathBuf>,
) -> Result<ReconciliationResult, CompareError> {
    if !output_dir.is_dir() {
        return Err(CompareError::OutputNotFound(
            output_dir.display().to_string(),
        ));
    }

    let mut result = ReconciliationResult::default();

    for relative in scan_output_files(output_dir)? {
        let relative_str = to_relative_string(&relative);
        let source = output_dir.join(&relative);
        let destination = project_dir.join(&relative);

        if !destination.exists() {
            result.new_files.push(relative_str);
            continue;
        }

        if files_are_equal(&source, &destination).await? {
            debug!(path = %relative_str, "Unchanged");
            continue;
        }

        if merge_files.contains(&destination) {
            result.modified_files.push(relative_str);
        } else {
            result.conflicting_files.push(relative_str);
        }
    }

    result.new_files.sort();
    result.modified_files.sort();
    result.conflicting_files.sort();

    debug!(
        new = result.new_files.len(),
        modified = result.modified_files.len(),
        conflicting = result.conflicting_files.len(),
        "Reconciled output with project"
    );

    Ok(result)
}

/// Relative paths of all user-facing files in the output tree
fn scan_output_files(output_dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();

    for entry in WalkDir::new(output_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(output_dir) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };

        if is_engine_marker(&to_relative_string(&relative)) {
            continue;
        }

        files.push(relative);
    }

    Ok(files)
}
