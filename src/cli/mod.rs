//! # Command Line Interface
//!
//! Runs the box and entry pipelines against a local JSON state file. Every
//! command loads the state into in-memory stores; mutating commands write it
//! back on success.

pub mod output;
pub mod state;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::domain::{
    BoxTemplate, Entry, ExportFormat, ExportOptions, OperationContext, TypeValidator,
};
use crate::observability::init_logging;
use crate::secrets::SecretReference;
use crate::services::{
    BoxService, EntryService, EntryUseCase, EventDispatcher, EventPublisher, ExportService,
    NotifyingEntryService, TypeValidatorService, WebhookEventPublisher,
};
use crate::storage::{CachedTypeValidatorRepository, TypeValidatorRepository};

use state::{StateFile, Workspace};

#[derive(Parser, Debug)]
#[command(name = "nbox")]
#[command(about = "Configuration entries, secrets and box templates")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the JSON state file
    #[arg(long, global = true, default_value = "nbox-state.json", value_name = "FILE")]
    pub state: PathBuf,

    /// Acting user recorded in tracking and events
    #[arg(long, global = true, value_name = "NAME")]
    pub user: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a box template
    #[command(
        after_help = "EXAMPLES:\n    nbox build widget-x development task_definition.json --arg cpu=256"
    )]
    Build {
        service: String,
        stage: String,
        template: String,

        /// Extra `:token` replacement, repeatable
        #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        args: Vec<(String, String)>,
    },

    /// List the placeholder variables of a box template
    Vars { service: String, stage: String, template: String },

    /// List the prefixes a build would look up
    Prefixes {
        service: String,
        stage: String,
        template: String,

        #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        args: Vec<(String, String)>,
    },

    /// Upsert entries from a JSON file holding a list of entries
    Upsert {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show one entry and its write history
    Get { key: String },

    /// Delete one entry
    Delete { key: String },

    /// Export entries under a prefix
    Export {
        #[arg(long, default_value = "")]
        prefix: String,

        /// json, yaml, dotenv or ecs
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Write the export into this directory instead of printing it
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// List the environment prefixes offered to clients
    Environments,

    /// Type validator management
    Validator {
        #[command(subcommand)]
        command: ValidatorCommands,
    },

    /// Box template management
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ValidatorCommands {
    /// List built-in and custom validators
    List {
        /// Output format (json or yaml)
        #[arg(short, long, default_value = "json", value_parser = ["json", "yaml"])]
        output: String,
    },
    /// Create or replace a custom validator
    Set { name: String, regex: String },
    /// Delete a custom validator
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// Store a template from a file
    Set {
        service: String,
        stage: String,
        name: String,
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List stored templates
    List,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) =
        raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    Ok((key.trim().to_string(), value.to_string()))
}

/// Services wired over one loaded workspace.
struct App {
    workspace: Workspace,
    boxes: BoxService,
    entries: NotifyingEntryService<EntryService>,
    validators: TypeValidatorService,
    exports: ExportService,
    events: EventDispatcher,
    environments: Vec<String>,
}

impl App {
    fn new(workspace: Workspace, config: &AppConfig) -> Self {
        let mut publishers: Vec<Arc<dyn EventPublisher>> = Vec::new();
        if !config.events.webhook_urls.is_empty() {
            publishers.push(Arc::new(WebhookEventPublisher::from_config(&config.events)));
        }
        let events = EventDispatcher::new(publishers);

        let validator_store: Arc<dyn TypeValidatorRepository> =
            match config.store.validator_cache_ttl() {
                Some(ttl) => Arc::new(CachedTypeValidatorRepository::new(
                    workspace.validators.as_ref().clone(),
                    ttl,
                )) as Arc<dyn TypeValidatorRepository>,
                None => workspace.validators.clone() as Arc<dyn TypeValidatorRepository>,
            };

        let entry_service = EntryService::new(
            workspace.entries.clone(),
            workspace.secrets.clone(),
            validator_store,
            SecretReference::from_config(&config.store),
        );

        Self {
            boxes: BoxService::new(workspace.templates.clone(), workspace.entries.clone())
                .with_events(events.clone()),
            entries: NotifyingEntryService::new(entry_service, events.clone()),
            validators: TypeValidatorService::new(workspace.validators.clone()),
            exports: ExportService::new(
                workspace.entries.clone(),
                config.store.instance_name.clone(),
            ),
            events,
            environments: config.store.environments(),
            workspace,
        }
    }
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }
    config.validate().context("Invalid configuration")?;
    init_logging(&config.observability)?;
    crate::observability::log_config_info(&config);

    let output = execute(cli, &config).await?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

/// Runs one command and returns what it would print.
pub async fn execute(cli: Cli, config: &AppConfig) -> Result<String> {
    let state = StateFile::read(&cli.state)?;
    let workspace = Workspace::load(state, &config.store).await?;
    let app = App::new(workspace, config);

    let mut ctx = OperationContext::new();
    if let Some(user) = &cli.user {
        ctx = ctx.with_username(user.clone());
    }

    let (output, mutated) = handle_command(cli.command, &app, &ctx).await?;

    if mutated {
        app.workspace.snapshot().await.write(&cli.state)?;
    }
    app.events.flush().await;
    Ok(output)
}

async fn handle_command(
    command: Commands,
    app: &App,
    ctx: &OperationContext,
) -> Result<(String, bool)> {
    match command {
        Commands::Build { service, stage, template, args } => {
            let args: HashMap<String, String> = args.into_iter().collect();
            let document = app.boxes.build_box(ctx, &service, &stage, &template, &args).await?;
            Ok((document, false))
        }

        Commands::Vars { service, stage, template } => {
            let vars = app.boxes.list_vars(ctx, &service, &stage, &template).await?;
            Ok((vars.join("\n"), false))
        }

        Commands::Prefixes { service, stage, template, args } => {
            let args: HashMap<String, String> = args.into_iter().collect();
            let prefixes = app.boxes.prefixes(ctx, &service, &stage, &template, &args).await?;
            Ok((prefixes.into_iter().collect::<Vec<_>>().join("\n"), false))
        }

        Commands::Upsert { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read file: {}", file.display()))?;
            let entries: Vec<Entry> = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse entries from: {}", file.display()))?;

            let mut results = app.entries.upsert(ctx, entries).await;
            results.sort_by(|a, b| a.key.cmp(&b.key));
            let mutated = results.iter().any(|r| !r.is_error());
            Ok((output::to_json(&results)?, mutated))
        }

        Commands::Get { key } => {
            let entry = app.entries.inner().retrieve(ctx, &key).await?;
            let tracking = app.entries.inner().tracking(ctx, &key).await?;
            let view = serde_json::json!({ "entry": entry, "tracking": tracking });
            Ok((output::to_json(&view)?, false))
        }

        Commands::Delete { key } => {
            app.entries.delete(ctx, &key).await?;
            Ok((format!("Deleted '{}'", key), true))
        }

        Commands::Export { prefix, format, output_dir } => {
            let format: ExportFormat = format.parse()?;
            let result = app.exports.export(ctx, ExportOptions::new(prefix.clone(), format)).await?;

            match output_dir {
                Some(dir) => {
                    let path = dir.join(app.exports.filename(format, &prefix));
                    std::fs::write(&path, &result.content)
                        .with_context(|| format!("Failed to write export: {}", path.display()))?;
                    let summary = format!(
                        "{} ({} entries, sha256 {})",
                        path.display(),
                        result.entries,
                        result.checksum
                    );
                    Ok((summary, false))
                }
                None => Ok((String::from_utf8_lossy(&result.content).into_owned(), false)),
            }
        }

        Commands::Environments => Ok((output::to_json(&app.environments)?, false)),

        Commands::Validator { command } => handle_validator_command(command, app, ctx).await,

        Commands::Template { command } => match command {
            TemplateCommands::Set { service, stage, name, file } => {
                let body = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read template: {}", file.display()))?;
                let template = BoxTemplate::new(service, stage, name, body);
                let location = template.location();
                let action = app.boxes.upsert_box(ctx, template).await?;
                Ok((format!("{} {}", action, location), true))
            }
            TemplateCommands::List => {
                let templates = app.boxes.list_boxes(ctx).await?;
                let locations: Vec<String> = templates.iter().map(BoxTemplate::location).collect();
                Ok((locations.join("\n"), false))
            }
        },
    }
}

async fn handle_validator_command(
    command: ValidatorCommands,
    app: &App,
    ctx: &OperationContext,
) -> Result<(String, bool)> {
    match command {
        ValidatorCommands::List { output } => {
            let validators = app.validators.list(ctx).await?;
            Ok((output::render(&validators, &output)?, false))
        }
        ValidatorCommands::Set { name, regex } => {
            let action = app.validators.upsert(ctx, TypeValidator::new(name.clone(), regex)).await?;
            Ok((format!("{} {}", action, name.trim()), true))
        }
        ValidatorCommands::Delete { name } => {
            app.validators.delete(ctx, &name).await?;
            Ok((format!("Deleted '{}'", name), true))
        }
    }
}
