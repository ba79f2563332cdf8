//! CLI: parse, route, and present. No domain orchestration here; commands
//! dispatch into the library and format what comes back.

use crate::batch::{BatchRunner, StopReason};
use crate::config::business::BusinessContextLayer;
use crate::config::{BriefsmithConfig, ConfigLoader};
use crate::error::BriefError;
use crate::import;
use crate::provider::profile;
use crate::state::{AppState, StateRuntime};
use crate::store::{BriefStore, SledBriefStore};
use crate::types::MapId;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Briefsmith CLI - batch content brief generation for topical maps
#[derive(Parser)]
#[command(name = "briefsmith")]
#[command(about = "Generate structured content briefs for topical maps using LLM providers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate briefs for every topic in a list that lacks one
    Generate {
        /// Topic list file (one topic per line, or CSV with title first)
        topics: PathBuf,
        /// Map to generate into (defaults to the configured active map)
        #[arg(long)]
        map: Option<String>,
        /// Provider profile name
        #[arg(long)]
        provider: String,
        /// Override the configured site domain
        #[arg(long)]
        domain: Option<String>,
        /// Override the configured audience
        #[arg(long)]
        audience: Option<String>,
        /// Override the configured tone
        #[arg(long)]
        tone: Option<String>,
        /// Override the configured language
        #[arg(long)]
        language: Option<String>,
    },
    /// Parse a topic list and show what a generate run would process
    Topics {
        /// Topic list file
        file: PathBuf,
    },
    /// Inspect persisted briefs
    Briefs {
        #[command(subcommand)]
        command: BriefsCommands,
    },
    /// Manage provider profiles
    Provider {
        #[command(subcommand)]
        command: ProviderCommands,
    },
}

#[derive(Subcommand)]
pub enum BriefsCommands {
    /// List briefs for a map
    List {
        #[arg(long)]
        map: Option<String>,
    },
    /// Show one brief as JSON
    Show { id: u64 },
    /// Export a map's briefs as JSON
    Export {
        #[arg(long)]
        map: Option<String>,
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ProviderCommands {
    /// List configured provider profiles
    List,
    /// Show one provider profile (api key redacted)
    Show { name: String },
    /// Validate a provider profile without calling it
    Validate { name: String },
}

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &BriefError) -> String {
    e.to_string()
}

/// Workspace-scoped execution context for CLI commands.
pub struct RunContext {
    workspace: PathBuf,
    config: BriefsmithConfig,
}

impl RunContext {
    pub fn new(workspace: PathBuf) -> Result<Self, BriefError> {
        let config = ConfigLoader::load(&workspace)?;
        Ok(Self { workspace, config })
    }

    pub fn config(&self) -> &BriefsmithConfig {
        &self.config
    }

    fn open_store(&self) -> Result<SledBriefStore, BriefError> {
        let path = self.workspace.join(&self.config.system.storage.store_path);
        Ok(SledBriefStore::open(path)?)
    }

    fn resolve_map(&self, map: Option<&str>) -> Option<MapId> {
        map.map(MapId::new)
            .or_else(|| self.config.active_map.as_deref().map(MapId::new))
    }

    pub fn execute(&self, command: &Commands) -> Result<String, BriefError> {
        match command {
            Commands::Generate {
                topics,
                map,
                provider,
                domain,
                audience,
                tone,
                language,
            } => self.run_generate(
                topics,
                map.as_deref(),
                provider,
                BusinessContextLayer {
                    domain: domain.clone(),
                    audience: audience.clone(),
                    tone: tone.clone(),
                    language: language.clone(),
                },
            ),
            Commands::Topics { file } => {
                let topics = import::load_topics(file)?;
                let mut table = Table::new();
                table.set_header(vec!["ID", "Title"]);
                for topic in &topics {
                    table.add_row(vec![topic.id.as_str(), topic.title.as_str()]);
                }
                Ok(format!("{} topics\n{}", topics.len(), table))
            }
            Commands::Briefs { command } => self.execute_briefs(command),
            Commands::Provider { command } => self.execute_provider(command),
        }
    }

    fn run_generate(
        &self,
        topics_file: &PathBuf,
        map: Option<&str>,
        provider_name: &str,
        cli_layer: BusinessContextLayer,
    ) -> Result<String, BriefError> {
        let topics = import::load_topics(topics_file)?;
        let profile = profile::load_profile(provider_name)?;
        let provider = profile.create_client(provider_name)?;
        let store = Arc::new(self.open_store()?);
        let business = self.config.business_context(Some(&cli_layer));

        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| BriefError::ProviderError(format!("Failed to create runtime: {}", e)))?;

        let state = Arc::new(AppState::new());
        let map_id = self.resolve_map(map);
        state.set_active_map(map_id.clone());
        if let Some(map_id) = &map_id {
            let existing = runtime.block_on(store.list_for_map(map_id))?;
            state.hydrate(existing);
        }

        let sink = Arc::new(StateRuntime::new(Arc::clone(&state)));
        let runner = BatchRunner::new(
            provider,
            Arc::clone(&store) as Arc<dyn BriefStore>,
            sink,
            Arc::clone(&state),
            business,
        );

        info!(provider = provider_name, topics = topics.len(), "generate invoked");
        let summary = runtime.block_on(runner.run(&topics))?;

        let headline = match summary.stop {
            StopReason::NothingToDo => "Nothing to generate".yellow().to_string(),
            StopReason::Cancelled => "Batch cancelled".yellow().to_string(),
            StopReason::ContextChanged => "Batch aborted (map changed)".red().to_string(),
            StopReason::Exhausted if summary.failed > 0 => {
                "Batch finished with failures".red().to_string()
            }
            StopReason::Exhausted => "Batch complete".green().to_string(),
        };
        let mut out = format!(
            "{}: {} generated, {} failed, {} of {} topics eligible",
            headline, summary.completed, summary.failed, summary.eligible, summary.requested
        );
        if let Some(notification) = state.notification() {
            out.push('\n');
            out.push_str(&notification);
        }
        Ok(out)
    }

    fn execute_briefs(&self, command: &BriefsCommands) -> Result<String, BriefError> {
        let store = self.open_store()?;
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| BriefError::ProviderError(format!("Failed to create runtime: {}", e)))?;
        match command {
            BriefsCommands::List { map } => {
                let map_id = self.resolve_map(map.as_deref()).ok_or_else(|| {
                    BriefError::MissingContext("no map selected; pass --map".to_string())
                })?;
                let records = runtime.block_on(store.list_for_map(&map_id))?;
                let mut table = Table::new();
                table.set_header(vec!["ID", "Topic", "Title", "Slug"]);
                for record in &records {
                    table.add_row(vec![
                        record.id.to_string(),
                        record.topic_id.to_string(),
                        record.title.clone(),
                        record.slug.clone(),
                    ]);
                }
                Ok(format!("{} briefs in '{}'\n{}", records.len(), map_id, table))
            }
            BriefsCommands::Show { id } => {
                let record = runtime
                    .block_on(store.get(*id))?
                    .ok_or(BriefError::Storage(crate::error::StorageError::BriefNotFound(*id)))?;
                serde_json::to_string_pretty(&record)
                    .map_err(|e| BriefError::ConfigError(format!("serialization failed: {}", e)))
            }
            BriefsCommands::Export { map, out } => {
                let map_id = self.resolve_map(map.as_deref()).ok_or_else(|| {
                    BriefError::MissingContext("no map selected; pass --map".to_string())
                })?;
                let records = runtime.block_on(store.list_for_map(&map_id))?;
                let json = serde_json::to_string_pretty(&records)
                    .map_err(|e| BriefError::ConfigError(format!("serialization failed: {}", e)))?;
                match out {
                    Some(path) => {
                        std::fs::write(path, &json).map_err(|e| {
                            BriefError::ConfigError(format!(
                                "cannot write {}: {}",
                                path.display(),
                                e
                            ))
                        })?;
                        Ok(format!("Exported {} briefs to {}", records.len(), path.display()))
                    }
                    None => Ok(json),
                }
            }
        }
    }

    fn execute_provider(&self, command: &ProviderCommands) -> Result<String, BriefError> {
        match command {
            ProviderCommands::List => {
                let names = profile::list_profiles()?;
                if names.is_empty() {
                    return Ok("No provider profiles configured".to_string());
                }
                let mut table = Table::new();
                table.set_header(vec!["Name", "Type", "Model"]);
                for name in &names {
                    let loaded = profile::load_profile(name)?;
                    table.add_row(vec![
                        name.clone(),
                        format!("{:?}", loaded.provider_type),
                        loaded.model.clone(),
                    ]);
                }
                Ok(table.to_string())
            }
            ProviderCommands::Show { name } => {
                let mut loaded = profile::load_profile(name)?;
                if loaded.api_key.is_some() {
                    loaded.api_key = Some("<redacted>".to_string());
                }
                toml::to_string_pretty(&loaded)
                    .map_err(|e| BriefError::ConfigError(format!("serialization failed: {}", e)))
            }
            ProviderCommands::Validate { name } => {
                let loaded = profile::load_profile(name)?;
                match loaded.validate() {
                    Ok(()) => Ok(format!("{} provider '{}' is valid", "OK".green(), name)),
                    Err(message) => Err(BriefError::ProviderNotConfigured(format!(
                        "{}: {}",
                        name, message
                    ))),
                }
            }
        }
    }
}
