//! Engine-internal marker files.
//!
//! A post-action marker (`App_postaction.xaml.cs`) carries merge instructions
//! for its target (`App.xaml.cs`). When a merge cannot be applied the engine
//! leaves a failed marker (`App_failedpostaction.xaml.cs`) instead. Neither
//! kind is user-facing output.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

pub const POSTACTION_SUFFIX: &str = "postaction";
pub const FAILED_POSTACTION_SUFFIX: &str = "failedpostaction";

static POSTACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\$\S*)?(_postaction|_gpostaction)\.").expect("postaction regex is valid")
});

static FAILED_POSTACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\$\S*)?(_failedpostaction|_failedgpostaction)(\d)?\.")
        .expect("failed postaction regex is valid")
});

pub fn is_postaction_marker(path: &str) -> bool {
    POSTACTION_RE.is_match(path)
}

pub fn is_failed_marker(path: &str) -> bool {
    FAILED_POSTACTION_RE.is_match(path)
}

/// True for any file the reconciler must never report
pub fn is_engine_marker(path: &str) -> bool {
    is_postaction_marker(path) || is_failed_marker(path)
}

/// The file a post-action marker merges into, next to the marker itself
pub fn merge_target(marker: &Path) -> Option<PathBuf> {
    let file_name = marker.file_name()?.to_str()?;
    if !POSTACTION_RE.is_match(file_name) {
        return None;
    }
    let target = POSTACTION_RE.replace(file_name, ".");
    Some(marker.with_file_name(target.as_ref()))
}

/// Name of the failed marker left behind when `marker` cannot be merged
pub fn failed_marker_for(marker: &Path) -> Option<PathBuf> {
    let file_name = marker.file_name()?.to_str()?;
    if !POSTACTION_RE.is_match(file_name) {
        return None;
    }
    let failed = POSTACTION_RE.replace(file_name, format!("_{}.", FAILED_POSTACTION_SUFFIX));
    Some(marker.with_file_name(failed.as_ref()))
}
