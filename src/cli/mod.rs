pub mod commands;
pub mod utils;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::auth::TokenSession;
use crate::config;
use crate::database::{DatabaseManager, PgStore};
use crate::editor::UploadPolicy;
use crate::settings::SettingsStore;
use crate::shell::AdminShell;
use crate::store::{BlobStore, DataStore, HttpBlobStore};

#[derive(Parser)]
#[command(name = "rekord")]
#[command(about = "RekordIT admin CLI - edit site content, the team roster and the recruitment status")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "REKORD_ACCESS_TOKEN",
        hide_env_values = true,
        help = "Access token of the signed-in team member"
    )]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List the admin tabs available to you")]
    Tabs,

    #[command(about = "Show every section of a tab")]
    List {
        #[arg(help = "Tab id, e.g. faqs or internship")]
        tab: String,
        #[arg(long, help = "Only rows whose filter column has this value")]
        filter: Option<String>,
    },

    #[command(about = "Add a record to a collection")]
    Add {
        #[arg(help = "Collection name, e.g. job_offers")]
        collection: String,
        #[arg(long = "set", value_parser = parse_assignment, help = "Field value as key=value (repeatable)")]
        set: Vec<(String, String)>,
        #[arg(long = "image", value_parser = parse_assignment, help = "Upload an image as key=path (repeatable)")]
        image: Vec<(String, String)>,
    },

    #[command(about = "Edit a record")]
    Edit {
        #[arg(help = "Collection name")]
        collection: String,
        #[arg(help = "Record ID")]
        id: String,
        #[arg(long = "set", value_parser = parse_assignment, help = "Field value as key=value (repeatable)")]
        set: Vec<(String, String)>,
        #[arg(long = "image", value_parser = parse_assignment, help = "Upload an image as key=path (repeatable)")]
        image: Vec<(String, String)>,
    },

    #[command(about = "Delete a record")]
    Delete {
        #[arg(help = "Collection name")]
        collection: String,
        #[arg(help = "Record ID")]
        id: String,
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    #[command(about = "Team roster management (administrators only)")]
    Team {
        #[command(subcommand)]
        cmd: commands::team::TeamCommands,
    },

    #[command(about = "Recruitment open/closed status")]
    Recruitment {
        #[command(subcommand)]
        cmd: commands::recruitment::RecruitmentCommands,
    },
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Everything a command needs once the user is signed in
pub struct CliContext {
    pub shell: AdminShell,
    pub blobs: Arc<dyn BlobStore>,
    pub upload: UploadPolicy,
    pub format: OutputFormat,
}

impl CliContext {
    pub async fn connect(token: &str, format: OutputFormat) -> anyhow::Result<Self> {
        let config = config::config();

        let pool = DatabaseManager::connect(&config.database).await?;
        let store: Arc<dyn DataStore> = Arc::new(PgStore::new(pool));

        let auth = TokenSession::new(config.security.jwt_secret.clone());
        auth.sign_in(token).map_err(|e| anyhow::anyhow!(e.user_message()))?;
        auth.refresh_role(store.as_ref()).await.map_err(|e| anyhow::anyhow!(e.user_message()))?;

        let settings = Arc::new(SettingsStore::new(Arc::clone(&store)));
        if let Err(e) = settings.refresh().await {
            tracing::warn!("Could not read recruitment status: {}", e);
        }

        let shell = AdminShell::open(&auth, store, settings).map_err(utils::fail)?;
        let blobs: Arc<dyn BlobStore> = Arc::new(HttpBlobStore::from_config(&config.storage)?);

        Ok(Self { shell, blobs, upload: UploadPolicy::from_config(&config.storage), format })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = OutputFormat::from_cli(&cli);
    let token = cli
        .token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .context("No access token; pass --token or set REKORD_ACCESS_TOKEN")?;
    let mut ctx = CliContext::connect(token.trim(), format).await?;

    match cli.command {
        Commands::Tabs => commands::content::tabs(&ctx),
        Commands::List { tab, filter } => commands::content::list(&mut ctx, &tab, filter.as_deref()).await,
        Commands::Add { collection, set, image } => commands::content::add(&ctx, &collection, set, image).await,
        Commands::Edit { collection, id, set, image } => {
            commands::content::edit(&ctx, &collection, &id, set, image).await
        }
        Commands::Delete { collection, id, yes } => commands::content::delete(&ctx, &collection, &id, yes).await,
        Commands::Team { cmd } => commands::team::handle(cmd, &ctx).await,
        Commands::Recruitment { cmd } => commands::recruitment::handle(cmd, &ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_split_on_first_equals() {
        assert_eq!(parse_assignment("url=https://a.pl/?x=1").unwrap(), ("url".into(), "https://a.pl/?x=1".into()));
        assert_eq!(parse_assignment("title=").unwrap(), ("title".into(), String::new()));
        assert!(parse_assignment("=value").is_err());
        assert!(parse_assignment("novalue").is_err());
    }

    #[test]
    fn parses_repeatable_sets() {
        let cli = Cli::try_parse_from([
            "rekord", "--token", "t", "add", "job_offers", "--set", "title=Dev", "--set", "tags=A; B",
        ])
        .unwrap();
        match cli.command {
            Commands::Add { collection, set, image } => {
                assert_eq!(collection, "job_offers");
                assert_eq!(set.len(), 2);
                assert!(image.is_empty());
            }
            _ => panic!("expected add"),
        }
    }
}
