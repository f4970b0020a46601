// Clause Detector
// Runs the pattern catalog over extracted text and reports typed,
// confidence-scored, page-attributed excerpts. Pure function over its
// inputs; no hidden state.

use tracing::info;

use crate::models::{DetectedClause, PageText};
use crate::services::detection::clause_catalog::clause_patterns;

/// Total excerpt window length in characters, split evenly around the match.
const EXCERPT_LENGTH: usize = 200;

/// Detect clauses in `full_text`, attributing page numbers from `pages` when
/// supplied.
///
/// All non-overlapping matches of every catalog pattern are reported, in
/// catalog order then match order. Empty or whitespace-only input returns an
/// empty result. Callers needing a display order should re-sort, e.g. by
/// page then type.
pub fn detect_clauses(full_text: &str, pages: Option<&[PageText]>) -> Vec<DetectedClause> {
    if full_text.trim().is_empty() {
        return Vec::new();
    }

    let mut detected = Vec::new();

    for pattern in clause_patterns() {
        for m in pattern.regex.find_iter(full_text) {
            let excerpt = extract_excerpt(full_text, m.start(), m.end());
            let page_number = find_page_number(&excerpt, pages);

            detected.push(DetectedClause {
                clause_type: pattern.clause_type.to_string(),
                excerpt,
                confidence: pattern.confidence,
                page_number,
            });
        }
    }

    info!(count = detected.len(), "detected clauses in text");

    detected
}

/// Cut a window of `EXCERPT_LENGTH` characters around the match, clipped to
/// the text boundaries, with `...` marking each clipped side.
fn extract_excerpt(text: &str, match_start: usize, match_end: usize) -> String {
    let half = EXCERPT_LENGTH / 2;
    let start = step_back(text, match_start, half);
    let end = step_forward(text, match_end, half);

    let mut excerpt = text[start..end].trim().to_string();

    if start > 0 {
        excerpt.insert_str(0, "...");
    }
    if end < text.len() {
        excerpt.push_str("...");
    }

    excerpt
}

/// Byte index `chars` characters before `from`, clamped to the text start.
fn step_back(text: &str, from: usize, chars: usize) -> usize {
    text[..from]
        .char_indices()
        .rev()
        .take(chars)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(from)
}

/// Byte index `chars` characters after `from`, clamped to the text end.
fn step_forward(text: &str, from: usize, chars: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(chars)
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

/// Best-effort page attribution: the first page whose text contains the
/// excerpt (ellipses stripped, case-insensitive).
///
/// An excerpt spanning a page boundary will not be found on any single page;
/// that is an accepted limitation of this heuristic, not an error.
fn find_page_number(excerpt: &str, pages: Option<&[PageText]>) -> Option<u32> {
    let pages = pages?;
    let needle = excerpt.trim_matches('.').to_lowercase();

    pages
        .iter()
        .find(|page| page.text.to_lowercase().contains(&needle))
        .map(|page| page.page_number)
}
