// Heuristic Scoring
// Turns text metrics into an AI-likelihood score, verdict and confidence.
// Deterministic: the same text always yields the same result.

use crate::models::{Burstiness, Confidence, DetectionResult, SignalSet, Verdict};
use crate::services::config_store::DetectorConfig;
use regex::Regex;
use std::sync::OnceLock;

use super::heuristic::{analyze_text, TextMetrics};

/// First-person phrases that pull the score toward human authorship.
pub const HUMAN_MARKERS: [&str; 8] = [
    "i think",
    "i believe",
    "in my experience",
    "from my experience",
    "i noticed",
    "we found",
    "personally",
    "in my opinion",
];

pub const HUMAN_MARKER_BONUS: i32 = 10;

const EXPLANATION_HUMAN: &str = "Sentence structure and wording show natural human variation.";
const EXPLANATION_MIXED: &str =
    "Some AI-like structure detected, but human phrasing is also present.";
const EXPLANATION_LIKELY_AI: &str =
    "Highly uniform sentence structure and generic phrasing detected.";

fn human_marker_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        HUMAN_MARKERS
            .iter()
            .map(|m| {
                let pattern = format!(r"\b{}\b", m.replace(' ', r"\s+"));
                Regex::new(&pattern).expect("human marker regex")
            })
            .collect()
    })
}

/// Additive score over the six structural conditions, clamped to [0, 100].
pub fn raw_score(m: &TextMetrics) -> i32 {
    let mut score = 0;

    if m.vocab_ratio < 0.45 {
        score += 25;
    }
    if m.sentence_variance < 15.0 {
        score += 25;
    }
    if m.repeated_words > 5 {
        score += 20;
    }
    if !m.bursty {
        score += 15;
    }
    if m.sentence_count > 3 && m.sentence_variance < 10.0 {
        score += 15;
    }
    if m.uniform_sentences {
        score += 15;
    }

    score.clamp(0, 100)
}

/// Number of distinct markers present; frequency does not matter.
pub fn count_human_markers(text: &str) -> usize {
    let lower = text.to_lowercase();
    human_marker_res().iter().filter(|re| re.is_match(&lower)).count()
}

pub fn human_marker_bonus(text: &str) -> i32 {
    count_human_markers(text) as i32 * HUMAN_MARKER_BONUS
}

pub fn verdict_for(score: u8, cfg: &DetectorConfig) -> Verdict {
    if score >= cfg.likely_ai {
        Verdict::LikelyAi
    } else if score >= cfg.mixed {
        Verdict::Mixed
    } else {
        Verdict::Human
    }
}

pub fn confidence_for(word_count: usize, cfg: &DetectorConfig) -> Confidence {
    if word_count < cfg.confidence_low_words {
        Confidence::Low
    } else if word_count < cfg.confidence_medium_words {
        Confidence::Medium
    } else {
        Confidence::High
    }
}

fn explanation_for(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Human => EXPLANATION_HUMAN,
        Verdict::Mixed => EXPLANATION_MIXED,
        Verdict::LikelyAi => EXPLANATION_LIKELY_AI,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn score_result(metrics: &TextMetrics, text: &str, cfg: &DetectorConfig) -> DetectionResult {
    let score = (raw_score(metrics) - human_marker_bonus(text)).clamp(0, 100) as u8;
    let verdict = verdict_for(score, cfg);

    DetectionResult {
        verdict,
        ai_probability: score,
        confidence: confidence_for(metrics.raw_word_count, cfg),
        signals: SignalSet {
            vocabulary_richness: round2(metrics.vocab_ratio),
            sentence_length_variance: round2(metrics.sentence_variance),
            repeated_word_clusters: metrics.repeated_words,
            burstiness: if metrics.bursty {
                Burstiness::HumanLike
            } else {
                Burstiness::Flat
            },
            uniform_sentences: metrics.uniform_sentences,
        },
        explanation: explanation_for(verdict).to_string(),
        word_count: metrics.raw_word_count,
        sentence_count: metrics.sentence_count,
    }
}

/// Detect with default thresholds. Total: never fails, whatever the input.
pub fn detect(text: &str) -> DetectionResult {
    detect_with(text, &DetectorConfig::default())
}

pub fn detect_with(text: &str, cfg: &DetectorConfig) -> DetectionResult {
    score_result(&analyze_text(text), text, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIFORM_PARAGRAPH: &str = "Alpha bravo charlie delta echo foxtrot golf hotel india juliet. \
        Kilo lima mike november oscar papa quebec romeo sierra tango. \
        Umbrella violin whiskey xylophone yankee zulu apple banana cherry grape. \
        Lemon mango nectarine orange peach quince raspberry strawberry tangerine walnut. \
        Acorn birch cedar dogwood elm fir hazel juniper larch maple.";

    #[test]
    fn test_uniform_paragraph_scores_high() {
        let result = detect(UNIFORM_PARAGRAPH);
        assert!(result.signals.uniform_sentences);
        assert_eq!(result.signals.sentence_length_variance, 0.0);
        assert_eq!(result.signals.vocabulary_richness, 1.0);
        // variance < 15, flat, >3 sentences with variance < 10, uniform
        assert_eq!(result.ai_probability, 70);
        assert_eq!(result.verdict, Verdict::LikelyAi);
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn test_marker_subtracts_exactly_ten() {
        let with_marker = "In my experience the team ships small changes every week";
        let without = "Across this quarter the team ships small changes every week";

        let a = analyze_text(with_marker);
        let b = analyze_text(without);
        assert_eq!(raw_score(&a), raw_score(&b));

        let scored_with = detect(with_marker).ai_probability as i32;
        let scored_without = detect(without).ai_probability as i32;
        assert_eq!(scored_without - scored_with, 10);
    }

    #[test]
    fn test_markers_count_presence_not_frequency() {
        assert_eq!(count_human_markers("I think so. I think not. I THINK maybe."), 1);
        assert_eq!(count_human_markers("Personally, I believe we found it."), 3);
        assert_eq!(count_human_markers("The wiki thinking tool"), 0);
    }

    #[test]
    fn test_score_never_negative() {
        let text = "I think personally in my opinion I believe we found I noticed it.";
        let result = detect(text);
        assert_eq!(result.ai_probability, 0);
        assert_eq!(result.verdict, Verdict::Human);
    }

    #[test]
    fn test_empty_text_is_scored() {
        let result = detect("");
        assert!(result.ai_probability <= 100);
        assert_eq!(result.signals.vocabulary_richness, 0.0);
        assert_eq!(result.word_count, 0);
    }

    #[test]
    fn test_detect_is_deterministic() {
        let a = serde_json::to_string(&detect(UNIFORM_PARAGRAPH)).unwrap();
        let b = serde_json::to_string(&detect(UNIFORM_PARAGRAPH)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_verdict_and_confidence_tiers() {
        let cfg = DetectorConfig::default();
        assert_eq!(verdict_for(70, &cfg), Verdict::LikelyAi);
        assert_eq!(verdict_for(69, &cfg), Verdict::Mixed);
        assert_eq!(verdict_for(40, &cfg), Verdict::Mixed);
        assert_eq!(verdict_for(39, &cfg), Verdict::Human);

        assert_eq!(confidence_for(79, &cfg), Confidence::Low);
        assert_eq!(confidence_for(80, &cfg), Confidence::Medium);
        assert_eq!(confidence_for(199, &cfg), Confidence::Medium);
        assert_eq!(confidence_for(200, &cfg), Confidence::High);
    }

    #[test]
    fn test_explanation_follows_verdict() {
        let result = detect(UNIFORM_PARAGRAPH);
        assert_eq!(result.explanation, EXPLANATION_LIKELY_AI);
    }
}
