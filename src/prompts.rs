//! # Prompt builders
//!
//! Turn randomly picked notes into chat prompts. Each [`PromptKind`] samples from the
//! note store, lays the material out and closes with its template's instruction.
//!
//! Prompts built from note bodies refuse to run on trivial notes: the builder logs a
//! warning and returns `Ok(None)` so no request is made.

use rand::Rng;
use rand::seq::IndexedRandom;
use std::error::Error;
use tracing::warn;

use crate::notes::{Note, NoteStore};
use crate::template::ChatTemplate;

/// How many titles `titles` shows the model.
pub const TITLES_SAMPLE: usize = 25;

/// How many titles `haiku` shows the model.
pub const HAIKU_SAMPLE: usize = 3;

/// Default voice for `reword`.
pub const DEFAULT_VOICE: &str = "Kanye West";

const TITLE_LIST_INTRO: &str =
    "The following is a list of notes from an author's personal notebook:";

/// The prompt commands.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptKind {
    /// Suggest more titles in the style of a sample of existing ones.
    Titles,
    /// Rewrite one note in someone else's voice.
    Reword { voice: String },
    /// A haiku from a few titles.
    Haiku,
    /// Mark key terms in one note as `/slashlinks`.
    Slashlinks,
    /// Find the connection between two notes.
    Connect,
    /// One note as a single sentence poem.
    Poem,
}

impl PromptKind {
    /// The template this kind closes with.
    pub fn template_name(&self) -> &'static str {
        match self {
            PromptKind::Titles => "titles",
            PromptKind::Reword { .. } => "reword",
            PromptKind::Haiku => "haiku",
            PromptKind::Slashlinks => "slashlinks",
            PromptKind::Connect => "connect",
            PromptKind::Poem => "poem",
        }
    }
}

/// A ready-to-send chat prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system_prompt: Option<String>,
    pub user_message: String,
}

/// Build the prompt for `kind`, or `None` if the sampled note is too short.
///
/// # Errors
/// The store cannot be listed or read, or it holds no notes.
pub fn build_prompt<R: Rng + ?Sized>(
    kind: &PromptKind,
    store: &NoteStore,
    template: &ChatTemplate,
    rng: &mut R,
) -> Result<Option<Prompt>, Box<dyn Error>> {
    let keys = store.list_keys()?;
    if keys.is_empty() {
        return Err(format!("no notes found in {}", store.dir().display()).into());
    }

    let instruction = match kind {
        PromptKind::Reword { voice } => template.instruction.replace("{voice}", voice),
        _ => template.instruction.clone(),
    };

    let body = match kind {
        PromptKind::Titles => title_list(&keys, TITLES_SAMPLE, rng),
        PromptKind::Haiku => title_list(&keys, HAIKU_SAMPLE, rng),
        PromptKind::Reword { .. } | PromptKind::Slashlinks | PromptKind::Poem => {
            let key = keys.choose(rng).ok_or("no notes to choose from")?;
            let note = store.read(key)?;
            if note.is_trivial() {
                warn!("Note {key} too short, skipping");
                return Ok(None);
            }
            format!(
                "The following is a note from an author's personal notebook. {}\n\n{}",
                layout_hint(store),
                note_block(store, &note)
            )
        }
        PromptKind::Connect => {
            let picked: Vec<&String> = keys.choose_multiple(rng, 2).collect();
            let notes = picked
                .iter()
                .map(|key| store.read(key))
                .collect::<Result<Vec<Note>, _>>()?;
            if notes.iter().any(Note::is_trivial) {
                warn!("Note too short, skipping");
                return Ok(None);
            }
            let blocks: Vec<String> = notes.iter().map(|n| note_block(store, n)).collect();
            let intro = if notes.len() == 1 {
                "The following is a note from an author's personal notebook."
            } else {
                "The following are two notes from an author's personal notebook."
            };
            format!("{intro} {}\n\n{}", layout_hint(store), blocks.join("\n\n"))
        }
    };

    Ok(Some(Prompt {
        system_prompt: template.system_prompt.clone(),
        user_message: format!("{body}\n\n{instruction}"),
    }))
}

fn title_list<R: Rng + ?Sized>(keys: &[String], n: usize, rng: &mut R) -> String {
    let selected: Vec<&str> = keys.choose_multiple(rng, n).map(String::as_str).collect();
    format!("{TITLE_LIST_INTRO}\n\n{}", selected.join("\n"))
}

fn layout_hint(store: &NoteStore) -> String {
    format!(
        "The title is on the first line and ends with the suffix {}, \
         the remainder of the document is the body:",
        store.file_name("")
    )
}

fn note_block(store: &NoteStore, note: &Note) -> String {
    format!("{}\n{}", store.file_name(&note.key), note.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::tests::notes_dir;
    use crate::template::default_template;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn template(kind: &PromptKind) -> ChatTemplate {
        default_template(kind.template_name()).unwrap()
    }

    fn build(kind: PromptKind, store: &NoteStore) -> Option<Prompt> {
        let mut rng = StdRng::seed_from_u64(7);
        build_prompt(&kind, store, &template(&kind), &mut rng).unwrap()
    }

    #[test]
    fn test_titles_prompt_samples_at_most_25() {
        let notes: Vec<(String, &str)> = (0..40).map(|i| (format!("note-{i:02}"), "body")).collect();
        let refs: Vec<(&str, &str)> = notes.iter().map(|(k, b)| (k.as_str(), *b)).collect();
        let (_dir, store) = notes_dir(&refs);

        let prompt = build(PromptKind::Titles, &store).unwrap();
        let text = &prompt.user_message;

        assert!(text.starts_with(TITLE_LIST_INTRO));
        assert!(text.ends_with("Suggest 10 more titles that could appear in this author's notes."));
        assert_eq!(text.lines().filter(|l| l.starts_with("note-")).count(), TITLES_SAMPLE);
    }

    #[test]
    fn test_haiku_prompt_with_fewer_notes_than_sample() {
        let (_dir, store) = notes_dir(&[("only-one", "x"), ("second", "y")]);
        let prompt = build(PromptKind::Haiku, &store).unwrap();
        assert!(prompt.user_message.contains("only-one"));
        assert!(prompt.user_message.contains("second"));
        assert!(prompt.user_message.ends_with("Write a haiku inspired by these titles."));
    }

    #[test]
    fn test_reword_prompt_fills_voice_and_filters_body() {
        let (_dir, store) = notes_dir(&[("slow-reading", "Read slowly.\nsource: /books\nThen again.")]);
        let prompt = build(
            PromptKind::Reword {
                voice: "a pirate".into(),
            },
            &store,
        )
        .unwrap();

        let text = prompt.user_message;
        assert!(text.contains("ends with the suffix .subtext"));
        assert!(text.contains("slow-reading.subtext\nRead slowly.\nThen again."));
        assert!(!text.contains("source:"));
        assert!(text.ends_with("Reword this note in the voice of a pirate."));
        assert!(prompt.system_prompt.is_none());
    }

    #[test]
    fn test_short_note_is_skipped() {
        let (_dir, store) = notes_dir(&[("tiny", "hm")]);
        assert!(build(PromptKind::Poem, &store).is_none());
        assert!(build(PromptKind::Slashlinks, &store).is_none());
        assert!(build(PromptKind::Connect, &store).is_none());
    }

    #[test]
    fn test_connect_uses_two_distinct_notes() {
        let (_dir, store) = notes_dir(&[("first-idea", "Alpha body text."), ("second-idea", "Beta body text.")]);
        let prompt = build(PromptKind::Connect, &store).unwrap();
        let text = prompt.user_message;

        assert!(text.starts_with("The following are two notes"));
        assert!(text.contains("first-idea.subtext\nAlpha body text."));
        assert!(text.contains("second-idea.subtext\nBeta body text."));
        assert!(text.ends_with("finding the connection between these ideas."));
    }

    #[test]
    fn test_template_system_prompt_is_carried() {
        let (_dir, store) = notes_dir(&[("a-note", "Long enough text.")]);
        let template = ChatTemplate {
            system_prompt: Some("Be brief.".into()),
            instruction: "Summarise.".into(),
        };
        let mut rng = StdRng::seed_from_u64(1);
        let prompt = build_prompt(&PromptKind::Poem, &store, &template, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(prompt.system_prompt.as_deref(), Some("Be brief."));
        assert!(prompt.user_message.ends_with("Summarise."));
    }

    #[test]
    fn test_empty_store_is_error() {
        let (_dir, store) = notes_dir(&[]);
        let mut rng = StdRng::seed_from_u64(1);
        let kind = PromptKind::Poem;
        assert!(build_prompt(&kind, &store, &template(&kind), &mut rng).is_err());
    }
}
