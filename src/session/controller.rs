use super::post_actions::{FinishPostAction, ReportFailedMergesPostAction};
use super::types::{
    CompletedGeneration, GenerationReport, GenerationSession, SessionOutcome, SessionState,
    SessionSummary,
};
use super::SessionError;
use crate::backup::backup_project_files;
use crate::manifest::read_project_configuration;
use crate::reconciliation::{materialize, reconcile, ReconciliationResult};
use crate::shell::Shell;
use crate::telemetry::TelemetryReporter;
use crate::template::{GenerationEngine, TemplateType, UserSelection};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Drives the new-item wizard: generate into a temp folder, reconcile the
/// output with the project, copy it in and clean up.
pub struct NewItemController {
    engine: Arc<dyn GenerationEngine>,
    shell: Arc<dyn Shell>,
    telemetry: Arc<TelemetryReporter>,
    post_actions: Vec<Arc<dyn FinishPostAction>>,
    backup_root: Option<PathBuf>,
}

impl NewItemController {
    pub fn new(
        engine: Arc<dyn GenerationEngine>,
        shell: Arc<dyn Shell>,
        telemetry: Arc<TelemetryReporter>,
    ) -> Self {
        Self {
            engine,
            shell,
            telemetry,
            post_actions: vec![Arc::new(ReportFailedMergesPostAction)],
            backup_root: None,
        }
    }

    /// Run `action` after the default finish post-actions
    pub fn with_post_action(mut self, action: Arc<dyn FinishPostAction>) -> Self {
        self.post_actions.push(action);
        self
    }

    /// Back up overwritten project files under `backup_root` before each sync
    pub fn with_backup_root(mut self, backup_root: PathBuf) -> Self {
        self.backup_root = Some(backup_root);
        self
    }

    pub fn telemetry(&self) -> &TelemetryReporter {
        &self.telemetry
    }

    /// Show the new-item dialog. Returns `None` after cancelling the wizard.
    pub async fn get_user_selection(&self, template_type: TemplateType) -> Option<UserSelection> {
        match self.shell.show_new_item_dialog(template_type).await {
            Ok(Some(selection)) => Some(selection),
            Ok(None) => {
                self.shell.cancel_wizard(true);
                None
            }
            Err(e) => {
                error!(error = %e, "New item dialog failed");
                self.shell.show_error(&e.to_string());
                self.shell.cancel_wizard(true);
                None
            }
        }
    }

    /// Generate the selected items into the session output folder.
    ///
    /// Telemetry for the items is held on the session and dispatched by
    /// [`Self::sync_new_item`] once they are in the project.
    ///
    /// On failure the session is aborted and cleaned up, the error is shown
    /// and the wizard is cancelled.
    pub async fn generate_new_item(
        &self,
        session: &mut GenerationSession,
        selection: &UserSelection,
    ) -> SessionOutcome<GenerationReport> {
        match self.try_generate_new_item(session, selection).await {
            Ok(report) => SessionOutcome::Completed(report),
            Err(e) => SessionOutcome::Failed(self.abort(session, e).await),
        }
    }

    pub async fn try_generate_new_item(
        &self,
        session: &mut GenerationSession,
        selection: &UserSelection,
    ) -> Result<GenerationReport, SessionError> {
        transition(session, SessionState::Generating)?;

        let (project_type, framework) = self.resolve_project_configuration(session, selection).await?;
        session.set_project_configuration(project_type, framework);

        let items = self.engine.compose(selection)?;
        let chrono = Instant::now();

        let results = self.engine.generate(session, &items).await?;

        let elapsed_secs = chrono.elapsed().as_secs_f64();
        info!(
            items = items.len(),
            elapsed_secs,
            output = %session.output_path().display(),
            "Generation finished"
        );

        session.set_completed_generation(CompletedGeneration {
            items: items.clone(),
            results,
            elapsed_secs,
        });

        Ok(GenerationReport {
            items,
            elapsed_secs,
        })
    }

    /// Classify the session output against the project
    pub async fn compare_output_and_project(
        &self,
        session: &GenerationSession,
    ) -> Result<ReconciliationResult, SessionError> {
        let result = reconcile(
            session.output_path(),
            session.project_path(),
            session.merge_files(),
        )
        .await?;
        Ok(result)
    }

    /// Copy the generated output into the project and clean up.
    ///
    /// On failure the session is aborted, the error is shown and the wizard is
    /// cancelled. Files already copied stay in the project.
    pub async fn sync_new_item(
        &self,
        session: &mut GenerationSession,
    ) -> SessionOutcome<SessionSummary> {
        match self.try_sync_new_item(session).await {
            Ok(summary) => SessionOutcome::Completed(summary),
            Err(e) => SessionOutcome::Failed(self.abort(session, e).await),
        }
    }

    pub async fn try_sync_new_item(
        &self,
        session: &mut GenerationSession,
    ) -> Result<SessionSummary, SessionError> {
        transition(session, SessionState::Reconciling)?;
        let result = self.compare_output_and_project(session).await?;

        let decisions = if result.needs_decisions() {
            self.shell.confirm_conflicts(&result).await?
        } else {
            Default::default()
        };
        let result = result.apply_decisions(&decisions);

        let backup_path = match &self.backup_root {
            Some(root) => Some(backup_project_files(root, session.project_path(), &result).await?),
            None => None,
        };

        transition(session, SessionState::Materializing)?;
        let report = materialize(&result, session.output_path(), session.project_path()).await?;

        for action in &self.post_actions {
            debug!(post_action = action.name(), "Running finish post-action");
            action.execute(session).await?;
        }

        let telemetry_events = match session.take_completed_generation() {
            Some(generation) => self.telemetry.track_generation(
                &generation.items,
                &generation.results,
                generation.elapsed_secs,
                session.project_type(),
                session.framework(),
            ),
            None => 0,
        };

        let mut warnings = session.warnings().to_vec();
        transition(session, SessionState::CleaningUp)?;
        if let Some(warning) = self.cleanup_temp_generation(session).await {
            warnings.push(warning);
        }

        info!(
            new = result.new_files.len(),
            modified = result.modified_files.len(),
            conflicting = result.conflicting_files.len(),
            "Synced generated items into project"
        );

        Ok(SessionSummary {
            result,
            copied: report.copied,
            warnings,
            backup_path,
            telemetry_events,
        })
    }

    /// Generate then sync
    pub async fn run(
        &self,
        session: &mut GenerationSession,
        selection: &UserSelection,
    ) -> SessionOutcome<SessionSummary> {
        match self.generate_new_item(session, selection).await {
            SessionOutcome::Completed(_) => self.sync_new_item(session).await,
            SessionOutcome::UserCancelled => SessionOutcome::UserCancelled,
            SessionOutcome::Failed(reason) => SessionOutcome::Failed(reason),
        }
    }

    /// Ask the shell for a selection, then generate and sync it
    pub async fn run_wizard(
        &self,
        session: &mut GenerationSession,
        template_type: TemplateType,
    ) -> SessionOutcome<SessionSummary> {
        match self.get_user_selection(template_type).await {
            Some(selection) => self.run(session, &selection).await,
            None => SessionOutcome::UserCancelled,
        }
    }

    /// Clear session state and delete the output folder.
    ///
    /// The folder is only deleted when it lies under the session temp root.
    /// Returns a warning instead of failing when it cannot be deleted.
    pub async fn cleanup_temp_generation(&self, session: &mut GenerationSession) -> Option<String> {
        let aborted = session.state() == SessionState::Aborted;
        if !aborted {
            session.set_state(SessionState::CleaningUp);
        }

        session.clear();

        let directory = session.output_path().to_path_buf();
        let warning = if !directory.exists() {
            None
        } else if !session.output_is_under_temp_root() {
            let msg = format!(
                "The folder {} is not under the temp folder {} and was not deleted",
                directory.display(),
                session.temp_root().display()
            );
            warn!("{}", msg);
            Some(msg)
        } else {
            match fs::remove_dir_all(&directory).await {
                Ok(()) => {
                    remove_empty_parent(session).await;
                    None
                }
                Err(e) => {
                    let msg = format!(
                        "The folder {} can't be deleted. Error: {}",
                        directory.display(),
                        e
                    );
                    warn!("{}", msg);
                    Some(msg)
                }
            }
        };

        if !aborted {
            session.set_state(SessionState::Idle);
        }
        warning
    }

    async fn resolve_project_configuration(
        &self,
        session: &GenerationSession,
        selection: &UserSelection,
    ) -> Result<(String, String), SessionError> {
        if !selection.project_type.is_empty() && !selection.framework.is_empty() {
            return Ok((selection.project_type.clone(), selection.framework.clone()));
        }

        let manifest = read_project_configuration(session.project_path()).await?;
        let pick = |selected: &str, fallback: String| {
            if selected.is_empty() {
                fallback
            } else {
                selected.to_string()
            }
        };
        Ok((
            pick(&selection.project_type, manifest.project_type),
            pick(&selection.framework, manifest.framework),
        ))
    }

    /// Move to `Aborted`, surface the error, cancel the wizard and clean up
    async fn abort(&self, session: &mut GenerationSession, e: SessionError) -> String {
        let message = e.to_string();
        error!(state = %session.state(), error = %message, "Session aborted");

        if session.state().can_transition_to(SessionState::Aborted) {
            session.set_state(SessionState::Aborted);
        }

        self.shell.show_error(&message);
        self.shell.cancel_wizard(false);
        self.cleanup_temp_generation(session).await;
        message
    }
}

fn transition(session: &mut GenerationSession, next: SessionState) -> Result<(), SessionError> {
    let current = session.state();
    if !current.can_transition_to(next) {
        return Err(SessionError::InvalidTransition {
            from: current,
            to: next,
        });
    }
    session.set_state(next);
    Ok(())
}

/// Drop the per-session folder above the output folder once it is empty
async fn remove_empty_parent(session: &GenerationSession) {
    let parent = match session.output_path().parent() {
        Some(parent) => parent.to_path_buf(),
        None => return,
    };
    let root = match session.temp_root().canonicalize() {
        Ok(root) => root,
        Err(_) => return,
    };
    if let Ok(parent) = parent.canonicalize() {
        if parent != root && parent.starts_with(&root) {
            if let Err(e) = fs::remove_dir(&parent).await {
                debug!(path = %parent.display(), error = %e, "Session folder left in place");
            }
        }
    }
}
