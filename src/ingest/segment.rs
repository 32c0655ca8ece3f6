//! Person-boundary segmentation for slide-marker resume exports.
//!
//! Input is line-oriented text in which slide boundaries are already explicit:
//! `Slide N` header lines and `=====` fences. One export may hold several
//! people's resumes back to back. Boundaries are recovered with two rules:
//!
//! 1. **Profile-header heuristic**: a slide containing an email address or an
//!    international-style phone number opens a new person's resume.
//! 2. **Page-terminator rule**: when the previous slide's last line is
//!    `Page N`, that person's deck has ended, so the next slide starts a new
//!    person even without contact info.
//!
//! Two adjacent people who both lack contact info cannot be split; that is a
//! documented precision limit of the heuristic, not something to second-guess
//! with stricter detection.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

/// Email pattern used both for boundary detection and heuristic extraction.
pub static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}").expect("email regex"));

/// International-style phone pattern (`+`, digits, separators).
pub static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\s\-\(\)]{6,}\d").expect("phone regex"));

static PAGE_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Page\s+\d+$").expect("page regex"));

/// Fence line separating slides in the marker format.
const SLIDE_FENCE: &str = "======================";

/// One person's resume recovered from a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonDocument {
    /// Store key: the source filename, suffixed with `_personN` before the
    /// extension when the document yielded more than one person.
    pub synthetic_filename: String,
    /// Blank-line-delimited resume text (one block per slide).
    pub content: String,
}

/// Split raw marker-format text into slides, each a list of non-empty lines.
/// Fence lines are discarded; `Slide N` headers close the current slide.
fn slide_blocks(raw: &str) -> Vec<Vec<&str>> {
    let mut slides: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.lines() {
        let stripped = line.trim();
        if stripped == SLIDE_FENCE {
            continue;
        }
        let mut parts = stripped.split_whitespace();
        if let (Some("Slide"), Some(num), None) = (parts.next(), parts.next(), parts.next())
            && num.chars().all(|c| c.is_ascii_digit())
        {
            if !current.is_empty() {
                slides.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !stripped.is_empty() {
            current.push(stripped);
        }
    }
    if !current.is_empty() {
        slides.push(current);
    }
    slides
}

/// True when a slide looks like the opening profile slide for a new person.
fn is_profile_start(slide_lines: &[&str]) -> bool {
    let text = slide_lines.join(" ");
    EMAIL_RE.is_match(&text) || PHONE_RE.is_match(&text)
}

fn ends_with_page_marker(slide_lines: &[&str]) -> bool {
    slide_lines
        .last()
        .is_some_and(|line| PAGE_MARKER_RE.is_match(line))
}

/// Segment a marker-format document into one `PersonDocument` per person.
///
/// A boundary is only honored when the accumulator is non-empty, so leading
/// boilerplate before the first real profile is not split off as a phantom
/// person. Whitespace-only persons are dropped entirely. Single-person
/// documents keep the unmodified filename as their key.
pub fn segment_marked_text(filename: &str, raw: &str) -> Vec<PersonDocument> {
    let slides = slide_blocks(raw);

    let mut groups: Vec<Vec<Vec<&str>>> = Vec::new();
    let mut current: Vec<Vec<&str>> = Vec::new();

    for (i, slide) in slides.iter().enumerate() {
        let prev_ended_deck = i > 0 && ends_with_page_marker(&slides[i - 1]);
        if (is_profile_start(slide) || prev_ended_deck) && !current.is_empty() {
            groups.push(std::mem::take(&mut current));
        }
        current.push(slide.clone());
    }
    if !current.is_empty() {
        groups.push(current);
    }

    let contents: Vec<String> = groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|lines| lines.join("\n"))
                .collect::<Vec<_>>()
                .join("\n\n")
        })
        .filter(|content| !content.trim().is_empty())
        .collect();

    if contents.len() == 1 {
        return vec![PersonDocument {
            synthetic_filename: filename.to_string(),
            content: contents.into_iter().next().expect("one person"),
        }];
    }

    contents
        .into_iter()
        .enumerate()
        .map(|(i, content)| PersonDocument {
            synthetic_filename: synthetic_name(filename, i + 1),
            content,
        })
        .collect()
}

/// `pablo_cv.txt` + ordinal 2 -> `pablo_cv_person2.txt`.
fn synthetic_name(filename: &str, ordinal: usize) -> String {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_person{ordinal}.{ext}"),
        None => format!("{stem}_person{ordinal}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FENCE: &str = "======================";

    #[test]
    fn slide_headers_and_fences_are_stripped() {
        let raw = format!("Slide 1\nAlice Example\n{FENCE}\nSlide 2\nPython, Rust\n");
        let slides = slide_blocks(&raw);
        assert_eq!(slides, vec![vec!["Alice Example"], vec!["Python, Rust"]]);
    }

    #[test]
    fn no_contact_markers_yields_single_person() {
        let raw = "Slide 1\nGeneric deck intro\nSlide 2\nMore body text\n";
        let persons = segment_marked_text("deck.txt", raw);
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0].synthetic_filename, "deck.txt");
        assert_eq!(persons[0].content, "Generic deck intro\n\nMore body text");
    }

    #[test]
    fn email_boundary_splits_two_people() {
        let raw = "Slide 1\nAlice\nalice@example.com\nSlide 2\nBob\nbob@example.com\n";
        let persons = segment_marked_text("pair.txt", raw);
        assert_eq!(persons.len(), 2);
        assert_eq!(persons[0].synthetic_filename, "pair_person1.txt");
        assert_eq!(persons[1].synthetic_filename, "pair_person2.txt");
        assert!(persons[0].content.contains("Alice"));
        assert!(persons[1].content.contains("Bob"));
    }

    #[test]
    fn page_terminator_starts_person_without_contact_info() {
        // First slide has an email; second ends the deck with "Page 1"; third
        // has no contact info at all but must still open person two.
        let raw = "Slide 1\nAlice\nalice@example.com\nSlide 2\nExperience details\nPage 1\nSlide 3\nAnonymous profile body\n";
        let persons = segment_marked_text("multi.txt", raw);
        assert_eq!(persons.len(), 2);
        assert!(persons[0].content.contains("alice@example.com"));
        assert!(persons[0].content.contains("Page 1"));
        assert_eq!(persons[1].content, "Anonymous profile body");
    }

    #[test]
    fn leading_boilerplate_is_not_a_phantom_person() {
        let raw = "Slide 1\nAgency cover page\nSlide 2\nAlice\nalice@example.com\n";
        let persons = segment_marked_text("cover.txt", raw);
        // The boundary on slide 2 is honored against a non-empty accumulator,
        // so the cover page rides along with the only real person.
        assert_eq!(persons.len(), 1);
        assert!(persons[0].content.contains("Agency cover page"));
        assert!(persons[0].content.contains("alice@example.com"));
    }

    #[test]
    fn phone_number_also_marks_a_profile_start() {
        let raw = "Slide 1\nAlice\n+1 415 555 0100\nSlide 2\nBob\n+44 20 7946 0958\n";
        let persons = segment_marked_text("phones.txt", raw);
        assert_eq!(persons.len(), 2);
    }

    #[test]
    fn whitespace_only_input_yields_nothing() {
        assert!(segment_marked_text("blank.txt", "Slide 1\n   \nSlide 2\n").is_empty());
        assert!(segment_marked_text("empty.txt", "").is_empty());
    }

    #[test]
    fn synthetic_names_preserve_extension() {
        assert_eq!(synthetic_name("cv.txt", 3), "cv_person3.txt");
        assert_eq!(synthetic_name("cv", 1), "cv_person1");
    }
}
