// Comparison Logic
// Before/after detection comparison and the generic-flag rewrite score

use crate::models::{ComparisonReport, Confidence, DetectionResult, InsightReport, InsightScore};
use crate::services::config_store::DetectorConfig;

use super::scoring::confidence_for;

const BASE_HUMANIZATION_SCORE: i32 = 50;
const PROBABILITY_DROP_POINTS: i32 = 20;
const VARIANCE_POINTS: i32 = 10;
const UNIFORMITY_POINTS: i32 = 10;

const STRONG_SCORE: u8 = 80;
const MODERATE_SCORE: u8 = 60;

const SUMMARY_STRONG: &str =
    "Strong humanization: AI-likelihood dropped and sentence rhythm became more varied.";
const SUMMARY_MODERATE: &str =
    "Human-likeness improved after rewriting, though some AI-like structure remains.";
const SUMMARY_MINIMAL: &str = "No meaningful structural improvement detected.";

/// Compare two detector runs over the original and rewritten text.
pub fn compare_detections(before: &DetectionResult, after: &DetectionResult) -> ComparisonReport {
    let probability_dropped = after.ai_probability < before.ai_probability;
    let sentence_variance_improved =
        after.signals.sentence_length_variance > before.signals.sentence_length_variance;
    let uniformity_reduced = before.signals.uniform_sentences && !after.signals.uniform_sentences;

    let mut score = BASE_HUMANIZATION_SCORE;
    if probability_dropped {
        score += PROBABILITY_DROP_POINTS;
    }
    if sentence_variance_improved {
        score += VARIANCE_POINTS;
    }
    if uniformity_reduced {
        score += UNIFORMITY_POINTS;
    }
    let humanization_score = score.clamp(0, 100) as u8;

    ComparisonReport {
        ai_probability_change: after.ai_probability as i32 - before.ai_probability as i32,
        sentence_variance_improved,
        uniformity_reduced,
        humanization_score,
        verdict_change: format!("{} → {}", before.verdict, after.verdict),
        summary: summary_for(humanization_score).to_string(),
    }
}

pub fn summary_for(humanization_score: u8) -> &'static str {
    if humanization_score >= STRONG_SCORE {
        SUMMARY_STRONG
    } else if humanization_score >= MODERATE_SCORE {
        SUMMARY_MODERATE
    } else {
        SUMMARY_MINIMAL
    }
}

/// `max(0, before − after)` on the AI probability.
pub fn improvement_score(before: &DetectionResult, after: &DetectionResult) -> u8 {
    before.ai_probability.saturating_sub(after.ai_probability)
}

/// Low when either side is below the low-confidence word tier, otherwise the weaker side's tier.
pub fn comparison_confidence(
    before: &DetectionResult,
    after: &DetectionResult,
    cfg: &DetectorConfig,
) -> Confidence {
    let b = confidence_for(before.word_count, cfg);
    let a = confidence_for(after.word_count, cfg);
    b.min(a)
}

/// Rewrite score driven by how many generic sentences the rewrite removed.
pub fn score_insights(before: &InsightReport, after: &InsightReport) -> InsightScore {
    let before_generic = before.generic_count() as u32;
    let after_generic = after.generic_count() as u32;
    let improvement = before_generic.saturating_sub(after_generic);

    InsightScore {
        before_score: 60u32.saturating_sub(before_generic * 5).max(20),
        after_score: (60 + improvement * 8).min(95),
        improvement,
    }
}
