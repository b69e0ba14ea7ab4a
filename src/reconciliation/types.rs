use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Classification of generated files against the project tree.
///
/// Paths are project-relative with forward slashes, sorted, and appear in at
/// most one of the three lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    /// Generated files with no counterpart in the project
    pub new_files: Vec<String>,
    /// Changed files the project accepts merges for
    pub modified_files: Vec<String>,
    /// Changed files that overwrite project content
    pub conflicting_files: Vec<String>,
}

impl ReconciliationResult {
    pub fn is_empty(&self) -> bool {
        self.new_files.is_empty()
            && self.modified_files.is_empty()
            && self.conflicting_files.is_empty()
    }

    /// Check if the user should confirm before syncing
    pub fn needs_decisions(&self) -> bool {
        !self.conflicting_files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.new_files.len() + self.modified_files.len() + self.conflicting_files.len()
    }

    /// Files that already exist in the project and will be overwritten
    pub fn overwritten_files(&self) -> impl Iterator<Item = &String> {
        self.conflicting_files.iter().chain(self.modified_files.iter())
    }

    /// Drop the conflicting files the user chose to keep as they are
    pub fn apply_decisions(mut self, decisions: &ReconciliationDecisions) -> Self {
        if !decisions.skip.is_empty() {
            self.conflicting_files
                .retain(|path| !decisions.skip.contains(path));
        }
        self
    }
}

/// User decisions for conflicting files
#[derive(Debug, Clone, Default)]
pub struct ReconciliationDecisions {
    /// Conflicting paths whose project version is kept
    pub skip: HashSet<String>,
}

/// Files written by a successful materialization, in copy order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    pub copied: Vec<String>,
}

/// A single file that could not be copied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFailure {
    pub path: String,
    pub error: String,
}
