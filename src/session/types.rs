use crate::reconciliation::ReconciliationResult;
use crate::template::{GenInfo, GenerationResult};
use crate::utils::TEMP_GENERATION_FOLDER;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Lifecycle of a generation session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Generating,
    Reconciling,
    Materializing,
    CleaningUp,
    /// Terminal; reached from any non-idle state on an unrecoverable error
    Aborted,
}

impl SessionState {
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Generating)
                | (Generating, Reconciling)
                | (Reconciling, Materializing)
                | (Materializing, CleaningUp)
                | (CleaningUp, Idle)
                | (Generating | Reconciling | Materializing | CleaningUp, Aborted)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// State owned by one new-item wizard invocation.
///
/// The session owns its output directory and never owns the project directory.
#[derive(Debug, Clone)]
pub struct GenerationSession {
    output_path: PathBuf,
    project_path: PathBuf,
    temp_root: PathBuf,
    project_type: String,
    framework: String,
    merge_files: HashSet<PathBuf>,
    warnings: Vec<String>,
    items: Vec<GenInfo>,
    completed_generation: Option<CompletedGeneration>,
    state: SessionState,
}

/// Engine results held back until the items have landed in the project
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompletedGeneration {
    pub items: Vec<GenInfo>,
    pub results: HashMap<String, GenerationResult>,
    pub elapsed_secs: f64,
}

impl GenerationSession {
    /// Start a session whose output lives in a fresh folder under the system temp dir
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self::with_temp_root(project_path, std::env::temp_dir())
    }

    /// Start a session whose output lives under `temp_root`
    pub fn with_temp_root(project_path: impl Into<PathBuf>, temp_root: impl Into<PathBuf>) -> Self {
        let project_path = project_path.into();
        let temp_root = temp_root.into();
        let project_name = project_name_of(&project_path);
        let output_path = temp_root
            .join(TEMP_GENERATION_FOLDER)
            .join(uuid::Uuid::new_v4().to_string())
            .join(project_name);

        Self {
            output_path,
            project_path,
            temp_root,
            project_type: String::new(),
            framework: String::new(),
            merge_files: HashSet::new(),
            warnings: Vec::new(),
            items: Vec::new(),
            completed_generation: None,
            state: SessionState::Idle,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Point the session at another output folder
    pub fn set_output_path(&mut self, output_path: impl Into<PathBuf>) {
        self.output_path = output_path.into();
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    pub fn project_name(&self) -> String {
        project_name_of(&self.project_path)
    }

    pub fn project_type(&self) -> &str {
        &self.project_type
    }

    pub fn framework(&self) -> &str {
        &self.framework
    }

    pub fn set_project_configuration(&mut self, project_type: String, framework: String) {
        self.project_type = project_type;
        self.framework = framework;
    }

    /// Mark an absolute project path as accepting merges
    pub fn add_merge_file(&mut self, path: impl Into<PathBuf>) {
        self.merge_files.insert(path.into());
    }

    pub fn merge_files(&self) -> &HashSet<PathBuf> {
        &self.merge_files
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn record_item(&mut self, item: GenInfo) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[GenInfo] {
        &self.items
    }

    pub(crate) fn set_completed_generation(&mut self, generation: CompletedGeneration) {
        self.completed_generation = Some(generation);
    }

    pub(crate) fn take_completed_generation(&mut self) -> Option<CompletedGeneration> {
        self.completed_generation.take()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    /// Drop warnings, merge-eligible paths and generated items
    pub fn clear(&mut self) {
        self.warnings.clear();
        self.merge_files.clear();
        self.items.clear();
        self.completed_generation = None;
    }

    /// True only when the output folder resolves to a location strictly inside
    /// both the session temp root and the system temp dir
    pub fn output_is_under_temp_root(&self) -> bool {
        let output = match self.output_path.canonicalize() {
            Ok(output) => output,
            Err(_) => return false,
        };
        strictly_under(&output, &self.temp_root) && strictly_under(&output, &std::env::temp_dir())
    }
}

fn strictly_under(path: &Path, root: &Path) -> bool {
    match root.canonicalize() {
        Ok(root) => path != root && path.starts_with(&root),
        Err(_) => false,
    }
}

fn project_name_of(project_path: &Path) -> String {
    project_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "Project".to_string())
}

/// How a wizard step ended
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome<T> {
    Completed(T),
    UserCancelled,
    Failed(String),
}

impl<T> SessionOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, SessionOutcome::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            SessionOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }
}

/// What the generation step produced
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub items: Vec<GenInfo>,
    pub elapsed_secs: f64,
}

/// What a finished sync did to the project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub result: ReconciliationResult,
    pub copied: Vec<String>,
    pub warnings: Vec<String>,
    pub backup_path: Option<PathBuf>,
    /// Telemetry events dispatched once the items were in the project
    pub telemetry_events: usize,
}
