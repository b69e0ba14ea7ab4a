use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;

/// Compute SHA-256 hash of a string
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stable identifier for a project, derived from its canonical path
pub fn project_id(project_path: &Path) -> String {
    let canonical = project_path
        .canonicalize()
        .unwrap_or_else(|_| project_path.to_path_buf());
    compute_hash(&canonical.to_string_lossy())
}

/// Byte-exact comparison of two files.
///
/// Files of different length are unequal without reading their content.
pub async fn files_are_equal(left: &Path, right: &Path) -> Result<bool, std::io::Error> {
    let left_len = fs::metadata(left).await?.len();
    let right_len = fs::metadata(right).await?.len();
    if left_len != right_len {
        return Ok(false);
    }

    let left_bytes = fs::read(left).await?;
    let right_bytes = fs::read(right).await?;
    Ok(left_bytes == right_bytes)
}
