//! Main module for the muse CLI.
//!
//! Parses the command line, loads the configuration, builds the API clients once
//! and dispatches to the library.
//!
//! ```sh
//! muse init
//! muse index
//! muse related "what I think about gardens"
//! muse poem
//! ```

use clap::Parser;
use once_cell::sync::OnceCell;
use std::{error::Error, fs, path::Path};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use subtext_muse::{
    api,
    commands::{Cli, Commands},
    config::{self, MuseConfig},
    config_dir,
    embeddings::OpenAiEmbedder,
    index::{IndexOptions, update_index},
    notes::NoteStore,
    pretty::{format_related, print_pretty},
    prompts::build_prompt,
    search::find_related,
    template, templates_dir,
};

static TRACING: OnceCell<()> = OnceCell::new();

fn main() -> Result<(), Box<dyn Error>> {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();
    });
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run())
}

/// Main asynchronous function of the muse CLI.
///
/// # Errors
///
/// Configuration problems, note store I/O and any API failure. Nothing is retried.
async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => config_dir()?.join("config.yaml"),
    };
    let templates = templates_dir(&config_path);

    if let Commands::Init = cli.command {
        debug!("Initializing configuration");
        return init(&config_path, &templates);
    }

    let muse_config = config::load_config_or_default(&config_path)?;
    let store = NoteStore::new(&muse_config.notes_dir, muse_config.note_suffix.clone());

    match &cli.command {
        Commands::Index { max_notes } => {
            let embedder = OpenAiEmbedder::from_config(&muse_config)?;
            let options = IndexOptions {
                max_notes: max_notes.unwrap_or(usize::MAX),
                policy: muse_config.stale_policy,
                progress: true,
            };
            let report = update_index(&store, &embedder, &muse_config.cache_path, &options).await?;
            println!(
                "{} notes scanned: {} embedded, {} already cached, {} too short ({} removed)",
                report.scanned, report.embedded, report.cached, report.too_short, report.purged
            );
        }
        Commands::Related {
            query,
            count,
            threshold,
        } => {
            let embedder = OpenAiEmbedder::from_config(&muse_config)?;
            let query = query.join(" ");
            debug!("Searching for notes related to {query:?}");
            let results =
                find_related(&embedder, &muse_config.cache_path, &query, *count, *threshold)
                    .await?;
            if results.is_empty() {
                println!("No related notes found.");
            } else {
                println!("{}", format_related(&results));
            }
        }
        command => {
            let Some((kind, args)) = command.prompt() else {
                return Ok(());
            };
            let template = template::resolve_template(&templates, kind.template_name())?;
            let prompt = build_prompt(&kind, &store, &template, &mut rand::rng())?;
            let Some(prompt) = prompt else {
                return Ok(());
            };

            println!("{}", prompt.user_message);
            println!("---");
            if args.dry_run {
                return Ok(());
            }

            let client = api::create_client(&muse_config)?;
            let answer = api::ask(&client, &muse_config, &prompt).await?;
            print_pretty(&answer);
        }
    }

    Ok(())
}

/// Writes a default `config.yaml` (unless one exists) and the default prompt templates.
fn init(config_path: &Path, templates: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if config_path.exists() {
        info!("Keeping existing config file: {}", config_path.display());
    } else {
        info!("Creating config file: {}", config_path.display());
        let config = MuseConfig {
            api_key: "CHANGEME".to_string(),
            ..MuseConfig::default()
        };
        fs::write(config_path, serde_yaml::to_string(&config)?)?;
    }

    template::write_default_templates(templates)?;
    println!("Configuration written to {}", config_path.display());
    Ok(())
}
