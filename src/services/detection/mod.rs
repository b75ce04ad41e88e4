// Detection Module
// Rule-based AI-likelihood heuristics organized into:
// - heuristic: token/sentence statistics
// - scoring: score, verdict, confidence and explanation
// - insights: per-sentence flags and hints
// - comparison: before/after comparison and rewrite scoring

pub mod heuristic;
pub mod scoring;
pub mod insights;
pub mod comparison;

pub use heuristic::{analyze_text, TextMetrics};
pub use scoring::{confidence_for, detect, detect_with, verdict_for, HUMAN_MARKERS};
pub use insights::{analyze_insights, GENERIC_PHRASES, OVERALL_SUGGESTIONS};
pub use comparison::{
    compare_detections,
    comparison_confidence,
    improvement_score,
    score_insights,
};
