mod hash;

pub use hash::{compute_hash, files_are_equal, project_id};

use std::path::{Path, PathBuf};

/// The name of the per-project itemgen folder
pub const ITEMGEN_FOLDER: &str = ".itemgen";

/// The name of the app manifest read for project configuration
pub const APP_MANIFEST_FILE: &str = "Package.appxmanifest";

/// Folder under the temp root that holds generation output
pub const TEMP_GENERATION_FOLDER: &str = "itemgen";

/// Get the path to the .itemgen folder
pub fn get_itemgen_path(project_path: &Path) -> PathBuf {
    project_path.join(ITEMGEN_FOLDER)
}

/// Get the path to the global itemgen directory (~/.itemgen)
pub fn get_global_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(|home| PathBuf::from(home).join(ITEMGEN_FOLDER))
}

/// Render a relative path with forward slashes, independent of platform
pub fn to_relative_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Get current timestamp in ISO 8601 format
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}
