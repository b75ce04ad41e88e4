// Prompt Builder
// Fixed rule preamble + mode instructions + variation rules on forced/retried attempts

use crate::models::Mode;

use super::modes::mode_profile;
use super::sampler::Sampler;

pub const REWRITE_STYLES: [&str; 6] = [
    "Rewrite using a different sentence structure and phrasing.",
    "Rewrite as a natural human would explain it casually.",
    "Rewrite by reordering ideas and changing tone.",
    "Rewrite with different wording, flow, and rhythm.",
    "Rewrite using simpler phrasing but new structure.",
    "Rewrite creatively while preserving meaning.",
];

const BASE_RULES: [&str; 5] = [
    "Keep the meaning identical; do not add or remove claims.",
    "Output ONLY the rewritten text.",
    "No explanations, headings, labels, or quotation marks around the answer.",
    "Avoid generic filler phrasing.",
    "Sound like it was written by a person.",
];

const VARIATION_RULES: [&str; 4] = [
    "Avoid predictable phrasing and stock transitions.",
    "Vary sentence length: mix short sentences with longer ones.",
    "Change word order, clauses, and flow compared to the original.",
    "Do not keep the same opening words.",
];

/// Variation rules apply on every attempt for forcing modes, otherwise from the second attempt.
pub fn needs_variation(mode: Mode, attempt: u32) -> bool {
    mode_profile(mode).force_variation || attempt > 1
}

pub fn build_rewrite_prompt(
    text: &str,
    mode: Mode,
    attempt: u32,
    sampler: &mut dyn Sampler,
) -> String {
    let profile = mode_profile(mode);
    let style = REWRITE_STYLES[sampler.pick(REWRITE_STYLES.len())];

    let mut prompt = String::from("You are a skilled human editor.\n\n");
    prompt.push_str(style);
    prompt.push_str("\n\nTask:\n");
    prompt.push_str(profile.description);
    prompt.push_str("\n\nRules:\n");
    for rule in BASE_RULES.iter().chain(profile.extra_rules.iter()) {
        prompt.push_str("- ");
        prompt.push_str(rule);
        prompt.push('\n');
    }

    if needs_variation(mode, attempt) {
        prompt.push_str("\nVariation (mandatory):\n");
        for rule in VARIATION_RULES {
            prompt.push_str("- ");
            prompt.push_str(rule);
            prompt.push('\n');
        }
    }

    prompt.push_str("\nText:\n");
    prompt.push_str(text.trim());
    prompt.push('\n');
    prompt
}

pub fn build_sentence_prompt(sentence: &str, hint: Option<&str>) -> String {
    let hint = hint
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .unwrap_or("Make it more concrete and natural.");

    format!(
        "Rewrite the following sentence to sound more human and specific.\n\n\
         Rules:\n\
         - Keep the original meaning\n\
         - Avoid generic phrases\n\
         - Add light realism or context\n\
         - Do NOT add extra claims\n\n\
         Sentence:\n\"{}\"\n\n\
         Hint:\n\"{}\"\n\n\
         Return ONLY the rewritten sentence.\n",
        sentence.trim(),
        hint
    )
}
