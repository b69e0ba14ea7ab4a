use crate::utils::get_itemgen_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Per-project itemgen configuration, stored in `.itemgen/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemgenConfig {
    /// Folder holding the template catalog. Falls back to the CLI flag when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_path: Option<PathBuf>,
    /// Project-relative paths that receive merges instead of being reported as conflicts
    #[serde(default)]
    pub merge_files: Vec<String>,
    /// Snapshot overwritten project files before a sync so it can be undone
    #[serde(default)]
    pub backup_enabled: bool,
    /// Append telemetry events as JSON lines to this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry_file: Option<PathBuf>,
}

impl ItemgenConfig {
    /// Resolve `merge_files` into absolute paths under the project
    pub fn merge_paths(&self, project_path: &Path) -> Vec<PathBuf> {
        self.merge_files
            .iter()
            .map(|f| project_path.join(f))
            .collect()
    }
}

/// Path of the configuration file for a project
pub fn get_config_path(project_path: &Path) -> PathBuf {
    get_itemgen_path(project_path).join("config.json")
}

/// Read the configuration file
pub async fn read_config(project_path: &Path) -> Result<Option<ItemgenConfig>, ConfigError> {
    let config_path = get_config_path(project_path);

    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&config_path).await?;
    let config: ItemgenConfig = serde_json::from_str(&content)?;
    Ok(Some(config))
}

/// Write the configuration file
pub async fn write_config(project_path: &Path, config: &ItemgenConfig) -> Result<(), ConfigError> {
    let config_path = get_config_path(project_path);
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(&config_path, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: ItemgenConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ItemgenConfig::default());
        assert!(!config.backup_enabled);
    }

    #[test]
    fn test_camel_case_fields() {
        let config: ItemgenConfig = serde_json::from_str(
            r#"{"mergeFiles": ["App.xaml.cs"], "backupEnabled": true}"#,
        )
        .unwrap();
        assert_eq!(config.merge_files, vec!["App.xaml.cs".to_string()]);
        assert!(config.backup_enabled);

        let merge = config.merge_paths(Path::new("/p"));
        assert_eq!(merge, vec![PathBuf::from("/p/App.xaml.cs")]);
    }

    #[tokio::test]
    async fn test_read_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_config(dir.path()).await.unwrap().is_none());

        let config = ItemgenConfig {
            backup_enabled: true,
            ..Default::default()
        };
        write_config(dir.path(), &config).await.unwrap();

        let loaded = read_config(dir.path()).await.unwrap();
        assert_eq!(loaded, Some(config));
    }
}
