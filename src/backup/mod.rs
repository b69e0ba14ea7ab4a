//! Snapshot of project files overwritten by a sync, so the last sync can be undone.
//!
//! Backups live in `<backup root>/<project id>/`, one per project. Each sync
//! replaces the previous backup.

use crate::reconciliation::ReconciliationResult;
use crate::utils::{get_global_dir, now_iso, project_id};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

const BACKUP_FILE: &str = "backup.json";
const BACKUP_FILES_FOLDER: &str = "files";

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to determine home directory")]
    HomeDirNotFound,

    #[error("No backup found for project {0}")]
    NoBackup(String),
}

/// Contents of `backup.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    pub created_at: String,
    pub project_path: String,
    pub result: ReconciliationResult,
}

/// What an undo changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndoReport {
    pub restored: Vec<String>,
    pub removed: Vec<String>,
}

/// Default backup root (~/.itemgen/backups)
pub fn default_backup_root() -> Result<PathBuf, BackupError> {
    get_global_dir()
        .map(|dir| dir.join("backups"))
        .ok_or(BackupError::HomeDirNotFound)
}

/// Folder holding the backup of one project
pub fn get_backup_dir(backup_root: &Path, project_path: &Path) -> PathBuf {
    backup_root.join(project_id(project_path))
}

/// Copy every project file the sync will overwrite into a fresh backup folder
pub async fn backup_project_files(
    backup_root: &Path,
    project_path: &Path,
    result: &ReconciliationResult,
) -> Result<PathBuf, BackupError> {
    let backup_dir = get_backup_dir(backup_root, project_path);

    if backup_dir.exists() {
        fs::remove_dir_all(&backup_dir).await?;
    }
    fs::create_dir_all(&backup_dir).await?;

    let files_dir = backup_dir.join(BACKUP_FILES_FOLDER);
    for relative in result.overwritten_files() {
        let original = project_path.join(relative);
        let backup = files_dir.join(relative);
        if let Some(parent) = backup.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&original, &backup).await?;
    }

    let record = BackupRecord {
        created_at: now_iso(),
        project_path: project_path.to_string_lossy().to_string(),
        result: result.clone(),
    };

    // Write atomically using temp file + rename
    let record_path = backup_dir.join(BACKUP_FILE);
    let temp_path = record_path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(&record)?;
    fs::write(&temp_path, &content).await?;
    fs::rename(&temp_path, &record_path).await?;

    info!(
        path = %backup_dir.display(),
        files = result.modified_files.len() + result.conflicting_files.len(),
        "Backed up project files"
    );

    Ok(backup_dir)
}

/// Read the last backup for a project, if any
pub async fn read_last_backup(
    backup_root: &Path,
    project_path: &Path,
) -> Result<Option<BackupRecord>, BackupError> {
    let record_path = get_backup_dir(backup_root, project_path).join(BACKUP_FILE);

    if !record_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&record_path).await?;
    let record: BackupRecord = serde_json::from_str(&content)?;
    Ok(Some(record))
}

/// Restore overwritten files and delete the files the last sync added.
///
/// The backup is removed afterwards, so a second undo reports `NoBackup`.
pub async fn undo_last_action(
    backup_root: &Path,
    project_path: &Path,
) -> Result<UndoReport, BackupError> {
    let record = read_last_backup(backup_root, project_path)
        .await?
        .ok_or_else(|| BackupError::NoBackup(project_path.display().to_string()))?;

    let backup_dir = get_backup_dir(backup_root, project_path);
    let files_dir = backup_dir.join(BACKUP_FILES_FOLDER);
    let mut report = UndoReport::default();

    for relative in record.result.overwritten_files() {
        let backup = files_dir.join(relative);
        let original = project_path.join(relative);
        fs::copy(&backup, &original).await?;
        report.restored.push(relative.clone());
    }

    for relative in &record.result.new_files {
        let added = project_path.join(relative);
        match fs::remove_file(&added).await {
            Ok(()) => report.removed.push(relative.clone()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %relative, "Added file already gone");
            }
            Err(e) => return Err(e.into()),
        }
    }

    fs::remove_dir_all(&backup_dir).await?;

    info!(
        restored = report.restored.len(),
        removed = report.removed.len(),
        "Undid last sync"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_dir_is_per_project() {
        let root = Path::new("/backups");
        let a = get_backup_dir(root, Path::new("/work/a"));
        let b = get_backup_dir(root, Path::new("/work/b"));
        assert_ne!(a, b);
        assert!(a.starts_with(root));
    }

    #[tokio::test]
    async fn test_no_backup_yet() {
        let root = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        assert!(read_last_backup(root.path(), project.path())
            .await
            .unwrap()
            .is_none());

        let result = undo_last_action(root.path(), project.path()).await;
        assert!(matches!(result, Err(BackupError::NoBackup(_))));
    }
}
