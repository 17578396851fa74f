//! Content classification: raw study-guide text → ordered [`Block`]s.
//!
//! Input is markdown-ish text written by people or produced by an LLM. We do
//! not parse full CommonMark; the only structure that matters downstream is
//! "which paragraphs are headers" and "where does a header label end".
//!
//! ## Rules
//!
//! 1. Normalise line endings (CRLF / CR → LF) and blank out control
//!    characters XML cannot carry (form feeds from pasted PDFs, NULs)
//! 2. Split on blank lines (whitespace-only lines count as blank)
//! 3. Trim each segment and drop empty ones
//! 4. Strip markdown noise to obtain the display text
//! 5. Mark a segment as a header when it began with `#`, contained `**`, or
//!    matches the domain allow-list
//! 6. Split header text at the first colon into `label` and `remainder`
//!
//! Block order is the input order. Nothing else in the pipeline reorders.

use crate::model::{Block, BlockKind};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Split raw text into ordered, classified blocks.
pub fn classify(input: &str) -> Vec<Block> {
    let normalised = normalise(input);
    let blocks: Vec<Block> = split_segments(&normalised)
        .into_iter()
        .map(classify_segment)
        .collect();

    debug!(
        "Classified {} blocks ({} headers)",
        blocks.len(),
        blocks.iter().filter(|b| b.is_header()).count()
    );
    blocks
}

// ── Rule 1: Normalise line endings and control characters ───────────────

fn normalise(input: &str) -> String {
    strip_control_chars(&input.replace("\r\n", "\n").replace('\r', "\n"))
}

static RE_CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x{FFFE}\x{FFFF}]").unwrap());

/// Replace every character XML 1.0 forbids with a space.
///
/// Tab, line feed and carriage return are kept.
pub fn strip_control_chars(text: &str) -> String {
    RE_CONTROL_CHARS.replace_all(text, " ").into_owned()
}

// ── Rules 2–3: Split on blank lines ──────────────────────────────────────

static RE_BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

/// Trimmed, non-empty blank-line-delimited segments in input order.
pub fn split_segments(input: &str) -> Vec<&str> {
    RE_BLANK_LINE
        .split(input)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

// ── Rule 4: Strip markdown noise ─────────────────────────────────────────

static RE_HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#+[ \t]*").unwrap());
static RE_STAR_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static RE_UNDERSCORE_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b_([^_\n]+)_\b").unwrap());

/// Remove bold, italic, heading, strikethrough and code markers.
pub fn clean_markup(segment: &str) -> String {
    let s = RE_HEADING_MARKER.replace_all(segment, "");
    let s = s.replace("***", "").replace("**", "").replace("~~", "").replace('`', "");
    let s = RE_STAR_EMPHASIS.replace_all(&s, "$1");
    let s = RE_UNDERSCORE_EMPHASIS.replace_all(&s, "$1");
    s.trim().to_string()
}

// ── Rule 5: Header detection ─────────────────────────────────────────────

static RE_HEADER_ALLOW_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:Page \d+ Analysis:|Main Idea:|Expert Insight:|Detailed Walkthrough:|Potential Confusion:|Relevance:|Create and Refine|Influence Claude|Evaluate Model|Build, Update)",
    )
    .unwrap()
});

/// Whether a segment is a header.
///
/// `raw` is the trimmed original segment, `cleaned` its display text. The
/// markdown-marker heuristic and the allow-list are independent triggers.
pub fn is_header(raw: &str, cleaned: &str) -> bool {
    raw.starts_with('#') || raw.contains("**") || RE_HEADER_ALLOW_LIST.is_match(cleaned)
}

fn heading_level(raw: &str) -> Option<u8> {
    let hashes = raw.chars().take_while(|&c| c == '#').count();
    (hashes > 0).then(|| hashes.min(6) as u8)
}

// ── Rule 6: Label / remainder split ──────────────────────────────────────

/// Split header text at its first colon.
///
/// Returns `(label, remainder)` where the label keeps the colon. A missing
/// colon or an empty remainder yields `(text, None)`.
pub fn split_label(text: &str) -> (String, Option<String>) {
    match text.find(':') {
        Some(idx) => {
            let (label, rest) = text.split_at(idx + 1);
            let rest = rest.trim();
            if rest.is_empty() {
                (label.trim().to_string(), None)
            } else {
                (label.trim().to_string(), Some(rest.to_string()))
            }
        }
        None => (text.to_string(), None),
    }
}

fn classify_segment(raw: &str) -> Block {
    let text = clean_markup(raw);

    if !is_header(raw, &text) {
        return Block::body(raw, text);
    }

    let (label, remainder) = split_label(&text);
    Block {
        kind: BlockKind::Header,
        raw_text: raw.to_string(),
        text,
        label: Some(label),
        remainder,
        level: heading_level(raw),
    }
}
