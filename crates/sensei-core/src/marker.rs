//! Marker protocol parser.
//!
//! The language model signals phase transitions out-of-band by embedding
//! fixed sentinel tokens inside its otherwise free-form replies. This module
//! is the only place that knows those tokens as strings: it scans a raw
//! completion, strips every occurrence, and yields a typed signal set. The
//! rest of the engine depends only on [`Signal`], never on raw substring
//! matching.
//!
//! Matching is purely textual. Whether a signal is contextually appropriate
//! is judged by the phase transition rules, not here.

use std::collections::HashSet;

/// Sentinel announcing the learning phase is finished.
pub const LEARNING_PHASE_COMPLETE: &str = "LEARNING_PHASE_COMPLETE";
/// Sentinel announcing one assignment was completed.
pub const ASSIGNMENT_COMPLETE: &str = "ASSIGNMENT_COMPLETE";
/// Sentinel announcing the whole subtopic is mastered.
pub const SUBTOPIC_COMPLETE: &str = "SUBTOPIC_COMPLETE";

const TOKENS: &[(&str, Signal)] = &[
    (LEARNING_PHASE_COMPLETE, Signal::AdvanceToAssignment),
    (ASSIGNMENT_COMPLETE, Signal::AssignmentDone),
    (SUBTOPIC_COMPLETE, Signal::UnitMastered),
];

/// A typed transition signal extracted from a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Move the unit from the learning phase to the assignment phase.
    AdvanceToAssignment,
    /// One assignment was finished.
    AssignmentDone,
    /// The subtopic should be considered fully learned.
    UnitMastered,
}

/// The result of scanning a raw completion for sentinel tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCompletion {
    /// The user-visible text with every token occurrence removed and
    /// surrounding whitespace normalized.
    pub text: String,
    /// Each signal kind present at least once in the raw text.
    pub signals: HashSet<Signal>,
}

/// Scans a completion for sentinel tokens.
///
/// Tokens match case-insensitively, anywhere in the text, in any order, and
/// may co-occur. Every occurrence is removed along with the adjacent
/// whitespace run, and the result is trimmed. Parsing is idempotent:
/// running the output through this function again yields no signals and
/// identical text. Because removing a token can splice its neighbors into
/// a new token, scanning repeats until a pass finds nothing; every pass
/// strictly shrinks the text, so the loop terminates.
pub fn parse_completion(raw: &str) -> ParsedCompletion {
    let mut signals = HashSet::new();
    let mut text = raw.trim().to_string();

    loop {
        let spans = scan_tokens(&text);
        if spans.is_empty() {
            break;
        }

        let mut next = String::with_capacity(text.len());
        let mut cursor = 0;
        for (start, end, signal) in spans {
            signals.insert(signal);
            push_segment(&mut next, &text[cursor..start]);
            cursor = end;
        }
        push_segment(&mut next, &text[cursor..]);

        text = next.trim().to_string();
    }

    ParsedCompletion { text, signals }
}

/// Finds every token occurrence in one pass, ordered by position.
fn scan_tokens(text: &str) -> Vec<(usize, usize, Signal)> {
    let bytes = text.as_bytes();
    let mut spans: Vec<(usize, usize, Signal)> = Vec::new();

    for (token, signal) in TOKENS {
        let needle = token.as_bytes();
        let mut from = 0;
        while let Some(start) = find_ascii_ci(bytes, needle, from) {
            spans.push((start, start + needle.len(), *signal));
            from = start + needle.len();
        }
    }

    spans.sort_by_key(|(start, _, _)| *start);
    spans
}

/// Appends a segment, dropping its leading whitespace when the output
/// already ends in whitespace (or is empty) so token removal never leaves
/// doubled spaces behind.
fn push_segment(out: &mut String, segment: &str) {
    let segment = if out.is_empty() || out.ends_with(char::is_whitespace) {
        segment.trim_start()
    } else {
        segment
    };
    out.push_str(segment);
}

/// Finds the next ASCII-case-insensitive occurrence of `needle` at or after
/// `from`. The needle is ASCII, so matched byte ranges always fall on UTF-8
/// character boundaries.
fn find_ascii_ci(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}
