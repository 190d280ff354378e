//! # Pretty printing
//!
//! Terminal output for the CLI: chat responses are markdown and get rendered with
//! `termimad`; related-note hits are printed as an aligned score/title listing.

use termimad::MadSkin;

use crate::notes::normalize_title;
use crate::similarity::SimilarityResult;

/// Render `markdown` to stdout with the default skin.
pub fn print_pretty(markdown: &str) {
    let skin = MadSkin::default();
    skin.print_text(markdown);
}

/// One line per hit: score to three decimals, the note title, then its key.
pub fn format_related(results: &[SimilarityResult]) -> String {
    results
        .iter()
        .map(|r| format!("{:.3}  {}  ({})", r.score, normalize_title(&r.key), r.key))
        .collect::<Vec<_>>()
        .join("\n")
}
