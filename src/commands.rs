//! This module defines the command-line interface for the application using `clap`.
//!
//! It provides a `Cli` struct that represents the parsed command-line arguments,
//! and a `Commands` enum that represents the available subcommands and their
//! options.
//!
//! # Examples
//!
//! ```sh
//! muse index
//! muse related slow reading habits
//! muse reword --voice "a ship's captain"
//! muse connect --dry-run
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::prompts::{DEFAULT_VOICE, PromptKind};

/// Represents the parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true, color = clap::ColorChoice::Auto)]
pub struct Cli {
    /// Path to config.yaml. Defaults to the per-platform config directory.
    #[arg(short = 'c', long = "config", global = true, env = "MUSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// The parsed subcommand and its options.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every prompt command.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct PromptArgs {
    /// Print the prompt and stop without calling the API.
    #[arg(long)]
    pub dry_run: bool,
}

/// Represents the available subcommands and their options.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed every note that is not cached yet and rewrite the cache.
    #[clap(name = "index")]
    Index {
        /// Stop after scanning this many notes.
        #[arg(short = 'm', long = "max-notes")]
        max_notes: Option<usize>,
    },

    /// List cached notes similar to the query.
    ///
    /// All remaining words are joined into one query. Words may start with `-`.
    #[clap(name = "related", alias = "r")]
    Related {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        query: Vec<String>,

        /// Maximum number of results.
        #[arg(short = 'n', long = "count", default_value_t = 5)]
        count: usize,

        /// Only show notes scoring strictly above this.
        #[arg(short = 't', long = "threshold", default_value_t = 0.75)]
        threshold: f32,
    },

    /// Suggest new titles from a sample of existing ones.
    Titles(PromptArgs),

    /// Reword a random note in someone else's voice.
    Reword {
        #[arg(long, default_value = DEFAULT_VOICE)]
        voice: String,

        #[command(flatten)]
        prompt: PromptArgs,
    },

    /// Write a haiku from a few random titles.
    Haiku(PromptArgs),

    /// Add /slashlinks to a random note.
    Slashlinks(PromptArgs),

    /// Connect the ideas of two random notes.
    Connect(PromptArgs),

    /// Compress a random note into a single sentence poem.
    Poem(PromptArgs),

    /// Write a default config.yaml and the prompt templates to the config directory.
    Init,
}

impl Commands {
    /// The prompt kind and options for prompt subcommands, `None` for the rest.
    pub fn prompt(&self) -> Option<(PromptKind, &PromptArgs)> {
        match self {
            Commands::Titles(args) => Some((PromptKind::Titles, args)),
            Commands::Reword { voice, prompt } => Some((
                PromptKind::Reword {
                    voice: voice.clone(),
                },
                prompt,
            )),
            Commands::Haiku(args) => Some((PromptKind::Haiku, args)),
            Commands::Slashlinks(args) => Some((PromptKind::Slashlinks, args)),
            Commands::Connect(args) => Some((PromptKind::Connect, args)),
            Commands::Poem(args) => Some((PromptKind::Poem, args)),
            Commands::Index { .. } | Commands::Related { .. } | Commands::Init => None,
        }
    }
}
