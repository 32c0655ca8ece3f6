//! Structured slide-deck input with per-line provenance tags.
//!
//! Deck exports arrive as JSON (`slides` -> `shapes` -> text). Each non-empty
//! shape becomes one content block wrapped in `<s{slide}_p{shape}>` tags so a
//! chunk can later be cited back to its exact slide/shape coordinate. This
//! mode assumes one person per deck; there is no person-splitting pass.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?s\d+_p\d+>").expect("tag regex"));

/// JSON shape of a structured deck export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckDocument {
    pub slides: Vec<DeckSlide>,
}

/// One slide: the text of each shape on it, in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckSlide {
    pub shapes: Vec<String>,
}

/// Render a deck as blank-line-delimited, positionally tagged content.
///
/// Blocks are emitted in slide/shape order with 1-based coordinates; shapes
/// that hold no text are skipped. Coordinates always reflect the source
/// position, so a skipped shape leaves a gap rather than renumbering.
pub fn deck_to_content(deck: &DeckDocument) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for (slide_idx, slide) in deck.slides.iter().enumerate() {
        for (shape_idx, shape) in slide.shapes.iter().enumerate() {
            let lines: Vec<&str> = shape
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            if lines.is_empty() {
                continue;
            }
            let s = slide_idx + 1;
            let p = shape_idx + 1;
            blocks.push(format!("<s{s}_p{p}>\n{}\n</s{s}_p{p}>", lines.join("\n")));
        }
    }
    blocks.join("\n\n")
}

/// True when a block carries slide/shape provenance tags.
pub fn has_position_tags(text: &str) -> bool {
    TAG_RE.is_match(text)
}

/// Remove provenance tags, leaving the clean text used for indexing.
pub fn strip_position_tags(text: &str) -> String {
    TAG_RE.replace_all(text, "").trim().to_string()
}
