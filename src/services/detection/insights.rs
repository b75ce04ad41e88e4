// Sentence Insights
// Per-sentence flags and improvement hints, using the detector's tokenization.
//
// Two passes: the first flags each sentence on its own, the second confirms
// uniform-length candidates only when the rhythm repeats across the document.

use crate::models::{Insight, InsightFlag, InsightReport};
use crate::services::text_processor::{split_sentences, tokenize};
use regex::Regex;
use std::sync::OnceLock;

/// Filler phrases that read as unsupported abstraction.
pub const GENERIC_PHRASES: [&str; 8] = [
    "helps",
    "improves",
    "in order to",
    "is a strategy",
    "effective way",
    "important for",
    "plays a role",
    "used to",
];

/// Token-count window for a uniform-length candidate (inclusive).
pub const UNIFORM_CANDIDATE_MIN: usize = 10;
pub const UNIFORM_CANDIDATE_MAX: usize = 14;
/// Candidates needed before the uniform-length flag is confirmed.
pub const UNIFORM_CONSENSUS: usize = 2;
/// Below this many tokens a sentence is vague.
pub const VAGUE_MAX_TOKENS: usize = 6;
/// Shorter sentences are too thin to judge as generic.
pub const GENERIC_MIN_TOKENS: usize = 4;

pub const OVERALL_SUGGESTIONS: [&str; 3] = [
    "Vary sentence length",
    "Reduce generic definitions",
    "Add personal context",
];

const HINT_GENERIC: &str =
    "This sentence sounds abstract. Try grounding it with a real example or outcome.";
const HINT_UNIFORM: &str =
    "Several sentences have similar rhythm. Vary sentence length to sound more natural.";
const HINT_VAGUE: &str = "This idea is brief. Clarify it with more context or specificity.";
const HINT_NONE: &str = "No issue confirmed for this sentence.";

fn generic_phrase_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        GENERIC_PHRASES
            .iter()
            .map(|p| {
                let pattern = format!(r"\b{}\b", p.replace(' ', r"\s+"));
                Regex::new(&pattern).expect("generic phrase regex")
            })
            .collect()
    })
}

/// First-person pronouns, digits or "example"/"case" already ground an abstraction.
fn contextual_override_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(i|we|my|our|\d+|example|case)\b").expect("contextual override regex")
    })
}

#[derive(Debug)]
struct SentenceDraft {
    index: usize,
    text: String,
    generic: bool,
    vague: bool,
    candidate_uniform: bool,
}

impl SentenceDraft {
    fn flagged(&self) -> bool {
        self.generic || self.vague || self.candidate_uniform
    }
}

pub fn is_generic(sentence: &str, token_count: usize) -> bool {
    if token_count < GENERIC_MIN_TOKENS {
        return false;
    }
    let lower = sentence.to_lowercase();
    generic_phrase_res().iter().any(|re| re.is_match(&lower))
        && !contextual_override_re().is_match(sentence)
}

fn hint_for(flags: &[InsightFlag]) -> &'static str {
    if flags.contains(&InsightFlag::Generic) {
        HINT_GENERIC
    } else if flags.contains(&InsightFlag::UniformLength) {
        HINT_UNIFORM
    } else if flags.contains(&InsightFlag::Vague) {
        HINT_VAGUE
    } else {
        HINT_NONE
    }
}

pub fn analyze_insights(text: &str) -> InsightReport {
    // Pass 1: independent per-sentence flags.
    let drafts: Vec<SentenceDraft> = split_sentences(text)
        .into_iter()
        .enumerate()
        .map(|(i, sentence)| {
            let tokens = tokenize(&sentence).len();
            SentenceDraft {
                index: i + 1,
                generic: is_generic(&sentence, tokens),
                vague: tokens < VAGUE_MAX_TOKENS,
                candidate_uniform: (UNIFORM_CANDIDATE_MIN..=UNIFORM_CANDIDATE_MAX)
                    .contains(&tokens),
                text: sentence,
            }
        })
        .collect();

    // Pass 2: a single mid-length sentence is incidental, a repeated one is a style.
    let uniform_confirmed =
        drafts.iter().filter(|d| d.candidate_uniform).count() >= UNIFORM_CONSENSUS;

    let sentences = drafts
        .into_iter()
        .filter(|d| d.flagged())
        .filter_map(|d| {
            let mut flags = Vec::new();
            if d.generic {
                flags.push(InsightFlag::Generic);
            }
            if d.candidate_uniform && uniform_confirmed {
                flags.push(InsightFlag::UniformLength);
            }
            if d.vague {
                flags.push(InsightFlag::Vague);
            }

            // Vague on its own is too low-signal to report.
            if flags == [InsightFlag::Vague] {
                return None;
            }

            Some(Insight {
                index: d.index,
                hint: hint_for(&flags).to_string(),
                text: d.text,
                flags,
            })
        })
        .collect();

    InsightReport {
        sentences,
        overall_suggestions: OVERALL_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sentence_only_vague_is_dropped() {
        let report = analyze_insights("SEO helps.");
        assert!(report.sentences.is_empty());
        assert_eq!(report.overall_suggestions.len(), 3);
    }

    #[test]
    fn test_three_word_filler_sentence_is_only_vague() {
        assert!(!is_generic("SEO really helps", 3));
        let report = analyze_insights("SEO really helps.");
        assert!(report.sentences.is_empty());
    }

    #[test]
    fn test_vague_with_generic_is_kept() {
        let report = analyze_insights("Content marketing helps growth.");
        assert_eq!(report.sentences.len(), 1);
        let s = &report.sentences[0];
        assert!(s.has_flag(InsightFlag::Generic));
        assert!(s.has_flag(InsightFlag::Vague));
        assert_eq!(s.hint, HINT_GENERIC);
    }

    #[test]
    fn test_single_uniform_candidate_is_not_confirmed() {
        // 12 tokens, no filler phrase.
        let text = "The committee reviewed three proposals and picked the second one after lunch.";
        let report = analyze_insights(text);
        assert_eq!(report.sentences.len(), 1);
        assert!(!report.sentences[0].has_flag(InsightFlag::UniformLength));
        assert!(report.sentences[0].flags.is_empty());
    }

    #[test]
    fn test_two_uniform_candidates_are_confirmed() {
        let text = "The committee reviewed three proposals and picked the second one after lunch. \
                    Their finance team then checked every estimate against last year's actual costs.";
        let report = analyze_insights(text);
        assert_eq!(report.sentences.len(), 2);
        for s in &report.sentences {
            assert!(s.has_flag(InsightFlag::UniformLength), "{:?}", s);
            assert_eq!(s.hint, HINT_UNIFORM);
        }
    }

    #[test]
    fn test_contextual_override_suppresses_generic() {
        assert!(is_generic("Keyword research helps rankings grow steadily", 6));
        assert!(!is_generic("In our case keyword research helps rankings grow", 8));
        assert!(!is_generic("Keyword research helps 40 pages rank", 5));
        assert!(!is_generic("For example keyword research helps rankings", 6));
        assert!(!is_generic("I saw that keyword research helps rankings", 7));
    }

    #[test]
    fn test_generic_flag_is_not_duplicated() {
        let report =
            analyze_insights("Good tooling helps teams and improves output in order to scale faster.");
        let generic = report.sentences[0]
            .flags
            .iter()
            .filter(|f| **f == InsightFlag::Generic)
            .count();
        assert_eq!(generic, 1);
    }

    #[test]
    fn test_indices_are_one_based_document_order() {
        let text = "Fine. Short. Automation plays a role in modern release pipelines everywhere.";
        let report = analyze_insights(text);
        assert_eq!(report.sentences.len(), 1);
        assert_eq!(report.sentences[0].index, 3);
    }

    #[test]
    fn test_empty_text_has_suggestions() {
        let report = analyze_insights("");
        assert!(report.sentences.is_empty());
        assert_eq!(report.overall_suggestions, OVERALL_SUGGESTIONS.to_vec());
    }
}
