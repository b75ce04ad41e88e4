// Deterministic fallbacks
// Rule-based rewrites used when the generator produced nothing usable.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::services::text_processor::collapse_whitespace;

/// Longer phrases first so they win over their own sub-phrases.
const CANONICAL_SUBSTITUTIONS: [(&str, &str); 16] = [
    ("it is important to note that", "note that"),
    ("plays a crucial role in", "shapes"),
    ("is an effective way to", "works well to"),
    ("due to the fact that", "because"),
    ("plays a role in", "shapes"),
    ("a wide range of", "many"),
    ("in today's world", "these days"),
    ("in order to", "to"),
    ("furthermore", "also"),
    ("additionally", "also"),
    ("moreover", "plus"),
    ("utilizes", "uses"),
    ("utilize", "use"),
    ("leverages", "uses"),
    ("leverage", "use"),
    ("numerous", "many"),
];

const FORCED_LEAD_IN: &str = "Put simply, ";

fn substitution_res() -> &'static [(Regex, &'static str)] {
    static RES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RES.get_or_init(|| {
        CANONICAL_SUBSTITUTIONS
            .iter()
            .map(|(from, to)| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(from).replace(' ', r"\s+"));
                (Regex::new(&pattern).expect("substitution regex"), *to)
            })
            .collect()
    })
}

fn match_case(matched: &str, replacement: &str) -> String {
    if matched.chars().next().is_some_and(|c| c.is_uppercase()) {
        let mut chars = replacement.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    } else {
        replacement.to_string()
    }
}

/// Canonical phrase substitutions; may return the input unchanged.
pub fn apply_substitutions(text: &str) -> String {
    let mut out = collapse_whitespace(text);
    for (re, replacement) in substitution_res() {
        out = re
            .replace_all(&out, |caps: &Captures| match_case(&caps[0], replacement))
            .into_owned();
    }
    out
}

/// Rewrite that is guaranteed to differ from `text`.
pub fn force_rewrite(text: &str) -> String {
    let substituted = apply_substitutions(text);
    if substituted != collapse_whitespace(text) && !substituted.is_empty() {
        return substituted;
    }
    format!("{}{}", FORCED_LEAD_IN, decapitalize_opening(&substituted))
}

/// Lowercase the first letter unless the opening word is `I` or an acronym.
fn decapitalize_opening(text: &str) -> String {
    let first_word = text.split_whitespace().next().unwrap_or("");
    let letters: Vec<char> = first_word.chars().filter(|c| c.is_alphabetic()).collect();
    let keep = first_word == "I"
        || first_word.starts_with("I'")
        || (letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()));
    if keep {
        return text.to_string();
    }

    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
