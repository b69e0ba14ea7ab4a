pub mod backup;
pub mod config;
pub mod manifest;
pub mod reconciliation;
pub mod session;
pub mod shell;
pub mod telemetry;
pub mod template;
pub mod utils;

// Re-export commonly used types
pub use backup::{
    backup_project_files, read_last_backup, undo_last_action, BackupError, BackupRecord,
    UndoReport,
};
pub use config::{read_config, write_config, ConfigError, ItemgenConfig};
pub use manifest::{read_project_configuration, ManifestError, ProjectConfiguration};
pub use reconciliation::{
    materialize, reconcile, CompareError, MaterializeError, MaterializeReport,
    ReconciliationDecisions, ReconciliationResult,
};
pub use session::{
    FinishPostAction, GenerationReport, GenerationSession, NewItemController, SessionError,
    SessionOutcome, SessionState, SessionSummary,
};
pub use shell::{CliShell, Shell, ShellError};
pub use telemetry::{JsonlSink, TelemetryReporter, TelemetrySink, TracingSink};
pub use template::{
    GenInfo, GenerationEngine, GenerationResult, TemplateCatalog, TemplateEngine, TemplateError,
    TemplateInfo, TemplateType, UserSelection,
};
