//! # Subtext Muse (library root)
//!
//! Plumbing for the `muse` CLI, which augments a folder of Subtext notes with an
//! OpenAI compatible API:
//!
//! - Reading and cleaning notes (`notes`).
//! - An embedding cache on disk (`cache`) filled by the index builder (`index`)
//!   through an [`Embedder`](embeddings::Embedder) (`embeddings`).
//! - Related-note search over that cache (`search`, `similarity`).
//! - Prompt commands built from random notes (`prompts`, `template`) and sent to a
//!   chat model (`api`).
//! - CLI parsing, configuration and terminal output (`commands`, `config`, `pretty`).
//!
//! ## Typical flow
//!
//! ```text
//! muse index                 # embed new notes, rewrite embeddings.json
//! muse related tending ideas # rank cached notes against the query
//! muse poem                  # one random note -> single sentence poem
//! ```

use directories::ProjectDirs;
use std::error::Error;
use std::path::{Path, PathBuf};

pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod notes;
pub mod pretty;
pub mod prompts;
pub mod search;
pub mod similarity;
pub mod template;

/// Return the per-platform configuration directory used by muse.
///
/// This uses [`directories::ProjectDirs`] with the application triple
/// `("com", "subtext-muse", "muse")`, e.g. `~/.config/muse` on Linux.
///
/// The directory is **not** created by this function.
///
/// # Errors
/// Returns an error if the platform configuration directory cannot be determined.
pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
    let proj_dirs = ProjectDirs::from("com", "subtext-muse", "muse")
        .ok_or("Unable to determine config directory")?;
    Ok(proj_dirs.config_dir().to_path_buf())
}

/// Templates live in a `templates/` folder next to the config file.
pub fn templates_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join("templates"),
        _ => PathBuf::from("templates"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_dir_sits_next_to_config() {
        assert_eq!(
            templates_dir(Path::new("/home/me/.config/muse/config.yaml")),
            PathBuf::from("/home/me/.config/muse/templates")
        );
        assert_eq!(templates_dir(Path::new("config.yaml")), PathBuf::from("templates"));
    }
}
