//! Feature digest extraction.
//!
//! Vision narratives can run to many thousands of characters; provider
//! calls are billed and rate-limited by input size, so the interpretation
//! prompt embeds a bounded digest instead of the full narrative.

/// Narratives at or below this length pass through untouched.
const SHORT_NARRATIVE_LIMIT: usize = 900;

/// Maximum characters kept per recognized section.
const SECTION_SNIPPET_CAP: usize = 90;

/// Snippets shorter than this are noise (a bare label, a stray match).
const SECTION_SNIPPET_MIN: usize = 10;

/// Hard truncation budget when no section labels are found.
const FALLBACK_TRUNCATION: usize = 400;

/// Section labels scanned for, with the label used in the digest.
/// Matching is case-insensitive; the first pattern that occurs wins.
const SECTIONS: &[(&[&str], &str)] = &[
    (&["forehead"], "Forehead"),
    (&["eyebrow"], "Eyebrows"),
    (&["eyes", "eye "], "Eyes"),
    (&["nose"], "Nose"),
    (&["lips", "mouth"], "Mouth"),
    (&["jaw", "chin"], "Jaw"),
    (&["face shape", "overall face"], "Face"),
];

/// Compress a vision narrative into a compact feature digest.
///
/// Deterministic, and bounded: once the input exceeds
/// [`SHORT_NARRATIVE_LIMIT`], the output length depends only on the number
/// of recognized sections, never on the input length.
pub fn extract_features(narrative: &str) -> String {
    if narrative.chars().count() <= SHORT_NARRATIVE_LIMIT {
        return narrative.to_string();
    }

    let mut parts = Vec::new();
    for (patterns, label) in SECTIONS {
        if let Some(snippet) = first_snippet(narrative, patterns) {
            parts.push(format!("{label}: {snippet}"));
        }
    }

    if parts.is_empty() {
        truncate_chars(narrative, FALLBACK_TRUNCATION)
    } else {
        parts.join(" | ")
    }
}

/// Find the earliest occurrence of any pattern and return the bounded
/// snippet that follows it.
fn first_snippet(narrative: &str, patterns: &[&str]) -> Option<String> {
    let (at, pattern_len) = patterns
        .iter()
        .filter_map(|p| find_ascii_ci(narrative, p).map(|at| (at, p.len())))
        .min_by_key(|(at, _)| *at)?;

    let rest = narrative[at + pattern_len..]
        .trim_start_matches(|c: char| c == ':' || c == '-' || c.is_whitespace());

    let mut snippet = String::new();
    for ch in rest.chars() {
        if ch == '.' || ch == '\n' || ch == '|' || snippet.chars().count() >= SECTION_SNIPPET_CAP {
            break;
        }
        snippet.push(ch);
    }

    let snippet = snippet.trim().to_string();
    (snippet.chars().count() >= SECTION_SNIPPET_MIN).then_some(snippet)
}

/// Byte offset of the first case-insensitive match of an ASCII needle.
///
/// UTF-8 continuation bytes never compare equal to ASCII, so a returned
/// offset always lands on a character boundary.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    h.windows(n.len()).position(|w| w.eq_ignore_ascii_case(n))
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
