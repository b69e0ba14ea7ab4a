//! Generation telemetry.
//!
//! Events are dispatched on background tasks so the wizard never waits on a
//! telemetry backend. Failures are logged and dropped. Call
//! [`TelemetryReporter::shutdown`] before exit to flush pending events.

mod sink;
mod types;

pub use sink::{JsonlSink, TelemetrySink, TracingSink};
pub use types::{ItemGenEvent, ProjectGenEvent, TelemetryEvent};

use crate::template::{GenInfo, GenerationResult, TemplateType};
use crate::utils::now_iso;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Telemetry backend error: {0}")]
    Backend(String),
}

/// Fire-and-forget telemetry dispatcher
pub struct TelemetryReporter {
    sink: Arc<dyn TelemetrySink>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TelemetryReporter {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            sink,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawn one telemetry task per generated item.
    ///
    /// Project items carry page and feature counts and the elapsed time.
    /// Items without a template are skipped. Returns how many events were
    /// dispatched; errors never reach the caller.
    pub fn track_generation(
        &self,
        items: &[GenInfo],
        results: &HashMap<String, GenerationResult>,
        time_spent_secs: f64,
        project_type: &str,
        framework: &str,
    ) -> usize {
        let pages_added = count_of(items, TemplateType::Page);
        let features_added = count_of(items, TemplateType::Feature);
        let mut dispatched = 0;

        for item in items {
            let (template, key) = match (&item.template, item.results_key()) {
                (Some(template), Some(key)) => (template, key),
                _ => continue,
            };

            let result = match results.get(&key) {
                Some(result) => result,
                None => {
                    error!(key = %key, "Exception tracking telemetry for template generation: missing result");
                    continue;
                }
            };

            let sink = Arc::clone(&self.sink);
            let handle = if template.template_type == TemplateType::Project {
                let event = ProjectGenEvent {
                    template_identity: template.identity.clone(),
                    template_name: template.name.clone(),
                    project_type: project_type.to_string(),
                    framework: framework.to_string(),
                    status: result.status,
                    pages_added,
                    features_added,
                    time_spent_secs,
                    timestamp: now_iso(),
                };
                tokio::spawn(async move {
                    if let Err(e) = sink.track_project_gen(event).await {
                        warn!(key = %key, error = %e, "Failed to track project generation");
                    }
                })
            } else {
                let event = ItemGenEvent {
                    template_identity: template.identity.clone(),
                    template_name: template.name.clone(),
                    template_type: template.template_type,
                    project_type: project_type.to_string(),
                    framework: framework.to_string(),
                    status: result.status,
                    timestamp: now_iso(),
                };
                tokio::spawn(async move {
                    if let Err(e) = sink.track_item_gen(event).await {
                        warn!(key = %key, error = %e, "Failed to track item generation");
                    }
                })
            };

            self.tasks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(handle);
            dispatched += 1;
        }

        dispatched
    }

    /// Number of dispatched tasks not yet joined
    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Wait for every dispatched telemetry task
    pub async fn shutdown(&self) {
        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect();

        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Telemetry task did not complete");
            }
        }
    }
}

fn count_of(items: &[GenInfo], template_type: TemplateType) -> usize {
    items
        .iter()
        .filter(|i| i.template_type() == Some(template_type))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{GenerationStatus, TemplateInfo};
    use async_trait::async_trait;
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingSink {
        projects: tokio::sync::Mutex<Vec<ProjectGenEvent>>,
        items: tokio::sync::Mutex<Vec<ItemGenEvent>>,
    }

    #[async_trait]
    impl TelemetrySink for RecordingSink {
        async fn track_project_gen(&self, event: ProjectGenEvent) -> Result<(), TelemetryError> {
            self.projects.lock().await.push(event);
            Ok(())
        }

        async fn track_item_gen(&self, event: ItemGenEvent) -> Result<(), TelemetryError> {
            self.items.lock().await.push(event);
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl TelemetrySink for FailingSink {
        async fn track_project_gen(&self, _event: ProjectGenEvent) -> Result<(), TelemetryError> {
            Err(TelemetryError::Backend("offline".into()))
        }

        async fn track_item_gen(&self, _event: ItemGenEvent) -> Result<(), TelemetryError> {
            Err(TelemetryError::Backend("offline".into()))
        }
    }

    fn gen_info(identity: &str, name: &str, template_type: TemplateType) -> GenInfo {
        GenInfo::new(
            name,
            TemplateInfo {
                identity: identity.to_string(),
                name: identity.to_string(),
                template_type,
                default_name: String::new(),
                dependencies: vec![],
                source: PathBuf::new(),
            },
        )
    }

    fn success() -> GenerationResult {
        GenerationResult {
            status: GenerationStatus::Success,
            primary_outputs: vec![],
            message: None,
        }
    }

    fn results_for(items: &[GenInfo]) -> HashMap<String, GenerationResult> {
        items
            .iter()
            .filter_map(|i| i.results_key())
            .map(|k| (k, success()))
            .collect()
    }

    #[tokio::test]
    async fn test_project_and_item_events() {
        let sink = Arc::new(RecordingSink::default());
        let reporter = TelemetryReporter::new(sink.clone());
        let items = vec![
            gen_info("Proj.Blank", "App1", TemplateType::Project),
            gen_info("Page.Map", "Map", TemplateType::Page),
            gen_info("Page.Blank", "Main", TemplateType::Page),
            gen_info("Feature.Storage", "Storage", TemplateType::Feature),
            GenInfo {
                name: "NoTemplate".into(),
                template: None,
            },
        ];

        let dispatched =
            reporter.track_generation(&items, &results_for(&items), 1.5, "Blank", "MVVMBasic");
        assert_eq!(dispatched, 4);
        reporter.shutdown().await;
        assert_eq!(reporter.pending(), 0);

        let projects = sink.projects.lock().await;
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].pages_added, 2);
        assert_eq!(projects[0].features_added, 1);
        assert_eq!(projects[0].time_spent_secs, 1.5);
        assert_eq!(sink.items.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_result_is_skipped() {
        let sink = Arc::new(RecordingSink::default());
        let reporter = TelemetryReporter::new(sink.clone());
        let items = vec![gen_info("Page.Map", "Map", TemplateType::Page)];

        let dispatched = reporter.track_generation(&items, &HashMap::new(), 0.0, "", "");
        assert_eq!(dispatched, 0);
        reporter.shutdown().await;
        assert!(sink.items.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_sink_is_swallowed() {
        let reporter = TelemetryReporter::new(Arc::new(FailingSink));
        let items = vec![gen_info("Page.Map", "Map", TemplateType::Page)];

        let dispatched = reporter.track_generation(&items, &results_for(&items), 0.0, "", "");
        assert_eq!(dispatched, 1);
        reporter.shutdown().await;
    }

    #[tokio::test]
    async fn test_jsonl_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry/events.jsonl");
        let reporter = TelemetryReporter::new(Arc::new(JsonlSink::new(&path)));
        let items = vec![
            gen_info("Page.Map", "Map", TemplateType::Page),
            gen_info("Page.Blank", "Main", TemplateType::Page),
        ];

        reporter.track_generation(&items, &results_for(&items), 0.0, "Blank", "MVVMBasic");
        reporter.shutdown().await;

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["event"], "itemGen");
            assert_eq!(value["framework"], "MVVMBasic");
        }
    }
}
