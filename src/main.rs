use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use itemgen::backup::default_backup_root;
use itemgen::{
    read_config, reconcile, undo_last_action, CliShell, GenerationSession, ItemgenConfig,
    JsonlSink, NewItemController, ReconciliationResult, SessionOutcome, TelemetryReporter,
    TelemetrySink, TemplateEngine, TemplateType, TracingSink,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Itemgen - add pages and features to an existing project from templates
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the selected items and copy them into the project
    Sync {
        /// Project to add the items to
        #[arg(short, long, env = "ITEMGEN_PROJECT")]
        project: PathBuf,

        /// JSON file describing the selected items
        #[arg(short, long)]
        selection: PathBuf,

        /// Template catalog folder (overrides the project config)
        #[arg(short, long, env = "ITEMGEN_TEMPLATES")]
        templates: Option<PathBuf>,

        /// Kind of item being added
        #[arg(long, value_enum, default_value = "page")]
        item_type: ItemType,

        /// Conflicting files whose project version is kept
        #[arg(long)]
        keep: Vec<String>,
    },

    /// Generate the selected items and show how they compare with the project
    Generate {
        #[arg(short, long, env = "ITEMGEN_PROJECT")]
        project: PathBuf,

        #[arg(short, long)]
        selection: PathBuf,

        #[arg(short, long, env = "ITEMGEN_TEMPLATES")]
        templates: Option<PathBuf>,
    },

    /// Compare an output folder with a project folder
    Compare {
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long)]
        project: PathBuf,

        /// Project-relative files that accept merges
        #[arg(short, long)]
        merge: Vec<String>,
    },

    /// Restore the files overwritten by the last sync
    Undo {
        #[arg(short, long, env = "ITEMGEN_PROJECT")]
        project: PathBuf,
    },

    /// Print the effective project configuration
    Config {
        #[arg(short, long, env = "ITEMGEN_PROJECT")]
        project: PathBuf,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum ItemType {
    Page,
    Feature,
}

impl From<ItemType> for TemplateType {
    fn from(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Page => TemplateType::Page,
            ItemType::Feature => TemplateType::Feature,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Sync {
            project,
            selection,
            templates,
            item_type,
            keep,
        } => {
            let config = load_config(&project).await?;
            let shell = CliShell::new(Some(selection)).with_kept_files(keep);
            let (controller, telemetry) = build_controller(&project, &config, templates, shell).await?;
            let mut session = new_session(&project, &config);

            let outcome = controller.run_wizard(&mut session, item_type.into()).await;
            telemetry.shutdown().await;

            match outcome {
                SessionOutcome::Completed(summary) => {
                    print_result(&summary.result);
                    for warning in &summary.warnings {
                        println!("warning: {}", warning);
                    }
                    if let Some(backup) = summary.backup_path {
                        println!("backup: {}", backup.display());
                    }
                }
                SessionOutcome::UserCancelled => println!("Cancelled"),
                SessionOutcome::Failed(reason) => bail!(reason),
            }
        }
        Command::Generate {
            project,
            selection,
            templates,
        } => {
            let config = load_config(&project).await?;
            let shell = CliShell::new(Some(selection));
            let (controller, telemetry) = build_controller(&project, &config, templates, shell).await?;
            let mut session = new_session(&project, &config);

            let selection = controller
                .get_user_selection(TemplateType::Page)
                .await
                .context("No items selected")?;

            let outcome = controller.generate_new_item(&mut session, &selection).await;
            telemetry.shutdown().await;

            match outcome {
                SessionOutcome::Completed(_) => {
                    let result = controller.compare_output_and_project(&session).await?;
                    println!("output: {}", session.output_path().display());
                    print_result(&result);
                }
                SessionOutcome::UserCancelled => println!("Cancelled"),
                SessionOutcome::Failed(reason) => bail!(reason),
            }
        }
        Command::Compare {
            output,
            project,
            merge,
        } => {
            let merge_files: HashSet<PathBuf> = merge.iter().map(|m| project.join(m)).collect();
            let result = reconcile(&output, &project, &merge_files).await?;
            print_result(&result);
        }
        Command::Undo { project } => {
            let backup_root = default_backup_root()?;
            let report = undo_last_action(&backup_root, &project).await?;
            for path in &report.restored {
                println!("restored {}", path);
            }
            for path in &report.removed {
                println!("removed  {}", path);
            }
        }
        Command::Config { project } => {
            let config = load_config(&project).await?;
            let project_config = itemgen::read_project_configuration(&project).await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            println!("{}", serde_json::to_string_pretty(&project_config)?);
        }
    }

    Ok(())
}

async fn load_config(project: &Path) -> anyhow::Result<ItemgenConfig> {
    let config = read_config(project)
        .await
        .with_context(|| format!("Failed to read config for {}", project.display()))?
        .unwrap_or_default();
    Ok(config)
}

async fn build_controller(
    project: &Path,
    config: &ItemgenConfig,
    templates: Option<PathBuf>,
    shell: CliShell,
) -> anyhow::Result<(NewItemController, Arc<TelemetryReporter>)> {
    let templates = templates
        .or_else(|| config.templates_path.clone().map(|p| project.join(p)))
        .context("No template folder given; pass --templates or set templatesPath")?;

    let engine = TemplateEngine::from_path(&templates).await?;
    info!(templates = engine.catalog().len(), "Template engine ready");

    let sink: Arc<dyn TelemetrySink> = match &config.telemetry_file {
        Some(path) => Arc::new(JsonlSink::new(project.join(path))),
        None => Arc::new(TracingSink),
    };
    let telemetry = Arc::new(TelemetryReporter::new(sink));

    let mut controller =
        NewItemController::new(Arc::new(engine), Arc::new(shell), Arc::clone(&telemetry));
    if config.backup_enabled {
        controller = controller.with_backup_root(default_backup_root()?);
    }

    Ok((controller, telemetry))
}

fn new_session(project: &Path, config: &ItemgenConfig) -> GenerationSession {
    let mut session = GenerationSession::new(project);
    for path in config.merge_paths(project) {
        session.add_merge_file(path);
    }
    session
}

fn print_result(result: &ReconciliationResult) {
    if result.is_empty() {
        println!("No changes");
        return;
    }
    for path in &result.new_files {
        println!("new       {}", path);
    }
    for path in &result.modified_files {
        println!("modified  {}", path);
    }
    for path in &result.conflicting_files {
        println!("conflict  {}", path);
    }
}
