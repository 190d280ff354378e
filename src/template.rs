//! # Template loading and structure
//!
//! Each prompt command has a small **chat template**: an optional system prompt
//! and the instruction that closes the prompt. Built-in defaults ship with the
//! binary; a YAML file in the config directory overrides one:
//!
//! ```text
//! <config_dir>/templates/<name>.yaml
//! ```
//!
//! ```yaml
//! # ~/.config/muse/templates/poem.yaml
//! system_prompt: "You are a terse poet."
//! instruction: "Capture the ideas of this note in a single haiku."
//! ```
//!
//! `muse init` writes every default template out so they can be edited in place.

use serde::{Deserialize, Serialize};
use std::{error::Error, fs, path::Path};

/// A reusable chat template.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatTemplate {
    /// Sent as the system message when present.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// The closing instruction appended after the note material.
    pub instruction: String,
}

/// Names of every template the prompt commands look up.
pub const TEMPLATE_NAMES: &[&str] = &["titles", "reword", "haiku", "slashlinks", "connect", "poem"];

/// The built-in template for `name`, if there is one.
///
/// `reword` contains a `{voice}` placeholder that the command fills in.
pub fn default_template(name: &str) -> Option<ChatTemplate> {
    let instruction = match name {
        "titles" => "Suggest 10 more titles that could appear in this author's notes.",
        "reword" => "Reword this note in the voice of {voice}.",
        "haiku" => "Write a haiku inspired by these titles.",
        "slashlinks" => {
            "Key terms in these notes appear in the form of slashlinks, e.g. /hello-world. \
             Replace key terms with slashlinks in the above note."
        }
        "connect" => {
            "Extend the author's thinking by finding the connection between these ideas."
        }
        "poem" => "Capture the ideas of this note in a single sentence poem.",
        _ => return None,
    };
    Some(ChatTemplate {
        system_prompt: None,
        instruction: instruction.to_string(),
    })
}

/// Load `<templates_dir>/<name>.yaml`.
///
/// ### Errors
/// The file is missing or unreadable, or is not a valid `ChatTemplate`.
pub fn load_template(templates_dir: &Path, name: &str) -> Result<ChatTemplate, Box<dyn Error>> {
    let path = templates_dir.join(format!("{name}.yaml"));
    tracing::info!("Loading template: {}", path.display());

    let content = fs::read_to_string(path)?;
    let template: ChatTemplate = serde_yaml::from_str(&content)?;
    Ok(template)
}

/// The user's override for `name` if one exists, else the built-in default.
///
/// A present but invalid override is an error rather than a silent fallback.
pub fn resolve_template(templates_dir: &Path, name: &str) -> Result<ChatTemplate, Box<dyn Error>> {
    if templates_dir.join(format!("{name}.yaml")).exists() {
        return load_template(templates_dir, name);
    }
    default_template(name).ok_or_else(|| format!("unknown template: {name}").into())
}

/// Write every default template into `templates_dir`, leaving existing files alone.
pub fn write_default_templates(templates_dir: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(templates_dir)?;
    for name in TEMPLATE_NAMES {
        let path = templates_dir.join(format!("{name}.yaml"));
        if path.exists() {
            tracing::info!("Keeping existing template: {}", path.display());
            continue;
        }
        if let Some(template) = default_template(name) {
            tracing::info!("Creating template file: {}", path.display());
            fs::write(path, serde_yaml::to_string(&template)?)?;
        }
    }
    Ok(())
}
