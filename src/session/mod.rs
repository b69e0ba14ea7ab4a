//! One end-to-end run of generate, reconcile, materialize and clean up.
//!
//! A [`GenerationSession`] holds all per-run state and is passed explicitly to
//! the [`NewItemController`] operations; nothing is kept in globals.

mod controller;
mod post_actions;
mod types;

pub use controller::NewItemController;
pub use post_actions::{FinishPostAction, PostActionError, ReportFailedMergesPostAction};
pub use types::{
    GenerationReport, GenerationSession, SessionOutcome, SessionState, SessionSummary,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition { from: SessionState, to: SessionState },

    #[error("Generation failed: {0}")]
    TemplateError(#[from] crate::template::TemplateError),

    #[error("Comparison failed: {0}")]
    CompareError(#[from] crate::reconciliation::CompareError),

    #[error("Sync failed: {0}")]
    MaterializeError(#[from] crate::reconciliation::MaterializeError),

    #[error("Backup failed: {0}")]
    BackupError(#[from] crate::backup::BackupError),

    #[error("Shell error: {0}")]
    ShellError(#[from] crate::shell::ShellError),

    #[error("Manifest error: {0}")]
    ManifestError(#[from] crate::manifest::ManifestError),

    #[error("{0}")]
    PostActionError(#[from] PostActionError),
}
