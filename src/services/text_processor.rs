// Text Processing Service
// Shared tokenization and sentence handling for detection, insights and rewriting

use regex::Regex;
use std::sync::OnceLock;

fn sentence_delimiter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").expect("sentence delimiter regex"))
}

fn boilerplate_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(here is the rewritten text|here's the rewritten text|rewritten text|rewritten version|rewritten|rewrite|output|result)\s*:\s*",
        )
        .expect("boilerplate prefix regex")
    })
}

/// Lowercase, keep only `[a-z]` and whitespace, split on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let filtered: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_whitespace())
        .collect();

    filtered.split_whitespace().map(|w| w.to_string()).collect()
}

/// Split on runs of `.`, `!`, `?`; trimmed, empties dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    sentence_delimiter_re()
        .split(text)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Raw whitespace-delimited word count, used for confidence tiers and caller minimums.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Length in Unicode scalars, not bytes.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Population variance; 0 for an empty slice.
pub fn population_variance(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n
}

/// Collapse every whitespace run (newlines included) into one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a raw generator response into a candidate rewrite.
///
/// Strips leading boilerplate such as `Rewritten:` or `Output:` (repeatedly,
/// models sometimes stack them), drops one pair of wrapping quotes and
/// collapses whitespace.
pub fn clean_candidate(raw: &str) -> String {
    let mut s = raw.trim().to_string();

    loop {
        let stripped = boilerplate_prefix_re().replace(&s, "").to_string();
        if stripped == s {
            break;
        }
        s = stripped;
    }

    let s = s.trim();
    let s = strip_wrapping_quotes(s);
    collapse_whitespace(s)
}

fn strip_wrapping_quotes(s: &str) -> &str {
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')] {
        if s.chars().count() >= 2 && s.starts_with(open) && s.ends_with(close) {
            let inner = &s[open.len_utf8()..s.len() - close.len_utf8()];
            // Only unwrap when the quote pair really encloses the whole text.
            if !inner.contains(open) && !inner.contains(close) {
                return inner.trim();
            }
        }
    }
    s
}

/// Single-line preview for log messages.
pub fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}
