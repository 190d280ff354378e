//! # Notes
//!
//! Reading notes from a flat directory of `*.subtext` files.
//!
//! A note's **key** is its file name without the suffix (`on-gardening.subtext` →
//! `on-gardening`). Its **title** is the key with `-`/`_` turned into spaces, and its
//! **body** is the file text with every line that contains a `:` dropped. Subtext
//! uses `key: value` lines for metadata and link blocks, which are noise for both
//! prompts and embeddings.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Lines containing this character are removed from note bodies.
pub const METADATA_DELIMITER: char = ':';

/// Bodies shorter than this (in UTF-16 code units) are treated as empty notes.
pub const MIN_BODY_LEN: usize = 5;

/// A parsed note.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub key: String,
    pub title: String,
    pub body: String,
}

impl Note {
    /// Build a note from its key and raw file text.
    pub fn parse(key: &str, raw: &str) -> Self {
        Self {
            key: key.to_string(),
            title: normalize_title(key),
            body: filter_body(raw),
        }
    }

    /// Body length in UTF-16 code units, so an emoji counts as two.
    pub fn body_len(&self) -> usize {
        self.body.encode_utf16().count()
    }

    /// Whether the body is long enough to be worth sending anywhere.
    pub fn is_trivial(&self) -> bool {
        self.body_len() < MIN_BODY_LEN
    }

    /// Title, blank line, body. This is the text that gets embedded.
    pub fn embedding_text(&self) -> String {
        format!("{}\n\n{}", self.title, self.body)
    }
}

/// Turn a key like `slow_reading-notes` into `slow reading notes`.
pub fn normalize_title(key: &str) -> String {
    key.replace(['-', '_'], " ")
}

/// Split on runs of line breaks and drop every line containing the delimiter.
///
/// A run of `\r`/`\n` counts as one break, so blank lines inside the note vanish,
/// but a leading or trailing break still leaves an empty first or last line:
/// `"abcd\n"` stays `"abcd\n"`.
pub fn filter_body(raw: &str) -> String {
    let pieces: Vec<&str> = raw.split(['\r', '\n']).collect();
    let last = pieces.len() - 1;
    pieces
        .iter()
        .enumerate()
        .filter(|(i, piece)| *i == 0 || *i == last || !piece.is_empty())
        .map(|(_, piece)| *piece)
        .filter(|line| !line.contains(METADATA_DELIMITER))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A directory of notes sharing one file suffix.
#[derive(Debug, Clone)]
pub struct NoteStore {
    dir: PathBuf,
    suffix: String,
}

impl NoteStore {
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for `key`, e.g. `on-gardening.subtext`.
    pub fn file_name(&self, key: &str) -> String {
        format!("{key}{}", self.suffix)
    }

    /// All note keys, sorted by file name.
    ///
    /// Files without the suffix and subdirectories are ignored.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read.
    pub fn list_keys(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .map_err(|e| format!("cannot read notes dir {}: {e}", self.dir.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(key) = name.strip_suffix(self.suffix.as_str()) {
                if !key.is_empty() {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Raw text of the note `key`. Invalid UTF-8 is replaced, not rejected.
    pub fn read_raw(&self, key: &str) -> Result<String, Box<dyn Error>> {
        let bytes = fs::read(self.dir.join(self.file_name(key)))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read and parse the note `key`.
    pub fn read(&self, key: &str) -> Result<Note, Box<dyn Error>> {
        Ok(Note::parse(key, &self.read_raw(key)?))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    /// A temp notes dir with the given `(key, text)` pairs written as `.subtext` files.
    pub(crate) fn notes_dir(notes: &[(&str, &str)]) -> (TempDir, NoteStore) {
        let dir = tempdir().unwrap();
        for (key, text) in notes {
            fs::write(dir.path().join(format!("{key}.subtext")), text).unwrap();
        }
        let store = NoteStore::new(dir.path(), ".subtext");
        (dir, store)
    }

    #[test]
    fn test_filter_body_drops_metadata_and_blank_lines() {
        let raw = "First line\r\n\r\nsee: /other-note\nSecond line\n\n\nThird: nope\nlast";
        assert_eq!(filter_body(raw), "First line\nSecond line\nlast");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("slow_reading-notes"), "slow reading notes");
        assert_eq!(normalize_title("plain"), "plain");
    }

    #[test]
    fn test_note_parse_and_embedding_text() {
        let note = Note::parse("on-gardening", "Weeds are plants too.\ntags: garden");
        assert_eq!(note.title, "on gardening");
        assert_eq!(note.body, "Weeds are plants too.");
        assert_eq!(note.embedding_text(), "on gardening\n\nWeeds are plants too.");
        assert!(!note.is_trivial());
    }

    #[test]
    fn test_filter_body_keeps_edge_breaks() {
        assert_eq!(filter_body("abcd\n"), "abcd\n");
        assert_eq!(filter_body("\nabc"), "\nabc");
        assert_eq!(filter_body("\r\n\r\nabc\n\n"), "\nabc\n");
        assert_eq!(filter_body("\n"), "\n");
        assert_eq!(filter_body(""), "");
        assert_eq!(filter_body("body\ntags: x\n"), "body\n");
    }

    #[test]
    fn test_trivial_note_boundary() {
        assert!(Note::parse("k", "abcd").is_trivial());
        assert!(!Note::parse("k", "abcde").is_trivial());
        // the trailing newline survives filtering and counts
        assert!(!Note::parse("k", "abcd\n").is_trivial());
        let leading = Note::parse("k", "\nabc");
        assert_eq!(leading.body_len(), 4);
        assert!(leading.is_trivial());
        assert!(Note::parse("k", "only: metadata\nhere: too").is_trivial());
    }

    #[test]
    fn test_body_length_counts_utf16_units() {
        // é is one unit, so four of them stay short
        assert!(Note::parse("k", "éééé").is_trivial());
        // each emoji is a surrogate pair
        let emoji = Note::parse("k", "😀😀😀");
        assert_eq!(emoji.body_len(), 6);
        assert!(!emoji.is_trivial());
    }

    #[test]
    fn test_list_keys_filters_suffix_and_sorts() {
        let (dir, store) = notes_dir(&[("b-note", "x"), ("a-note", "y")]);
        fs::write(dir.path().join("readme.md"), "not a note").unwrap();
        fs::create_dir(dir.path().join("sub.subtext")).unwrap();

        assert_eq!(store.list_keys().unwrap(), vec!["a-note", "b-note"]);
    }

    #[test]
    fn test_read_note() {
        let (_dir, store) = notes_dir(&[("hello-world", "Hi there\nlink: /x")]);
        let note = store.read("hello-world").unwrap();
        assert_eq!(note.title, "hello world");
        assert_eq!(note.body, "Hi there");
        assert_eq!(store.file_name("hello-world"), "hello-world.subtext");
    }

    #[test]
    fn test_missing_dir_is_error() {
        let store = NoteStore::new("/definitely/not/here", ".subtext");
        assert!(store.list_keys().is_err());
    }
}
