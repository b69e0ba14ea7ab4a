use super::types::{ItemGenEvent, ProjectGenEvent, TelemetryEvent};
use super::TelemetryError;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

/// Destination for generation telemetry
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn track_project_gen(&self, event: ProjectGenEvent) -> Result<(), TelemetryError>;

    async fn track_item_gen(&self, event: ItemGenEvent) -> Result<(), TelemetryError>;
}

/// Emits telemetry as structured tracing events
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl TelemetrySink for TracingSink {
    async fn track_project_gen(&self, event: ProjectGenEvent) -> Result<(), TelemetryError> {
        info!(
            target: "itemgen::telemetry",
            template = %event.template_identity,
            project_type = %event.project_type,
            framework = %event.framework,
            pages_added = event.pages_added,
            features_added = event.features_added,
            time_spent_secs = event.time_spent_secs,
            "Project generated"
        );
        Ok(())
    }

    async fn track_item_gen(&self, event: ItemGenEvent) -> Result<(), TelemetryError> {
        info!(
            target: "itemgen::telemetry",
            template = %event.template_identity,
            template_type = %event.template_type,
            project_type = %event.project_type,
            framework = %event.framework,
            "Item generated"
        );
        Ok(())
    }
}

/// Appends one JSON object per event to a file
pub struct JsonlSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn append(&self, event: TelemetryEvent<'_>) -> Result<(), TelemetryError> {
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl TelemetrySink for JsonlSink {
    async fn track_project_gen(&self, event: ProjectGenEvent) -> Result<(), TelemetryError> {
        self.append(TelemetryEvent::ProjectGen(&event)).await
    }

    async fn track_item_gen(&self, event: ItemGenEvent) -> Result<(), TelemetryError> {
        self.append(TelemetryEvent::ItemGen(&event)).await
    }
}
