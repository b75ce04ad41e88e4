// Caller-facing operations
// Minimum-length policy lives here; the detectors themselves stay total.

use thiserror::Error;
use tracing::info;

use crate::models::{CompareResponse, DetectionResult, InsightReport, Mode, OrchestrationResult};
use crate::services::config_store::AppConfig;
use crate::services::detection::{
    analyze_insights, compare_detections, comparison_confidence, detect_with, improvement_score,
};
use crate::services::humanizer::{Humanizer, HumanizerError};
use crate::services::text_processor::word_count;

pub const SHORT_TEXT_SUGGESTIONS: [&str; 3] = [
    "Increase text length for deeper analysis",
    "Add personal experience or examples",
    "Avoid overly generic statements",
];

pub const FALLBACK_SUGGESTIONS: [&str; 4] = [
    "Vary sentence length",
    "Reduce generic definitions",
    "Add personal context",
    "Include real-world outcomes or data",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("text too short: {words} words, minimum {minimum}")]
    TextTooShort { words: usize, minimum: usize },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("request cancelled")]
    Cancelled,
}

impl From<HumanizerError> for ApiError {
    fn from(err: HumanizerError) -> Self {
        match err {
            HumanizerError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            HumanizerError::Cancelled => ApiError::Cancelled,
        }
    }
}

fn require_words(text: &str, minimum: usize) -> Result<(), ApiError> {
    let words = word_count(text);
    if words < minimum {
        return Err(ApiError::TextTooShort { words, minimum });
    }
    Ok(())
}

pub fn detect(text: &str, config: &AppConfig) -> Result<DetectionResult, ApiError> {
    require_words(text, config.humanizer.detect_min_words)?;
    let result = detect_with(text, &config.detector);
    info!(
        "[API] detect words={} ai={} verdict={}",
        result.word_count, result.ai_probability, result.verdict
    );
    Ok(result)
}

/// Never fails and never returns an empty suggestion list.
pub fn insights(text: &str, config: &AppConfig) -> InsightReport {
    let words = word_count(text);
    if words < config.humanizer.insights_min_words {
        return InsightReport {
            sentences: Vec::new(),
            overall_suggestions: to_strings(&SHORT_TEXT_SUGGESTIONS),
        };
    }

    let mut report = analyze_insights(text);
    if report.sentences.is_empty() {
        report.overall_suggestions = to_strings(&FALLBACK_SUGGESTIONS);
    }
    report
}

pub fn compare(
    original: &str,
    rewritten: &str,
    config: &AppConfig,
) -> Result<CompareResponse, ApiError> {
    let minimum = config.humanizer.detect_min_words;
    require_words(original, minimum)?;
    require_words(rewritten, minimum)?;

    let before = detect_with(original, &config.detector);
    let after = detect_with(rewritten, &config.detector);
    let comparison = compare_detections(&before, &after);
    let score = improvement_score(&before, &after);
    let confidence = comparison_confidence(&before, &after, &config.detector);

    let summary = format!(
        "AI probability {} → {} ({}). {}",
        before.ai_probability, after.ai_probability, comparison.verdict_change, comparison.summary
    );

    Ok(CompareResponse {
        before,
        after,
        improvement_score: score,
        confidence,
        comparison,
        summary,
    })
}

pub async fn run_humanizer(
    humanizer: &Humanizer,
    text: &str,
    mode: Mode,
) -> Result<OrchestrationResult, ApiError> {
    Ok(humanizer.run(text, mode).await?)
}

/// Same as [`run_humanizer`], but folds an input rejection into an `error`-status result.
pub async fn humanize_response(humanizer: &Humanizer, text: &str, mode: Mode) -> OrchestrationResult {
    match humanizer.run(text, mode).await {
        Ok(result) => result,
        Err(err) => OrchestrationResult::invalid_input(mode, text, err.to_string()),
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HumanizeStatus, Verdict};
    use crate::services::providers::{GenerationError, TextGenerator};
    use async_trait::async_trait;
    use std::sync::Arc;

    const STORY: &str = "Last winter our team moved the billing service to a new cluster. \
        It broke twice. The first outage lasted forty minutes because nobody had written down \
        which queue fed the invoice worker, and the second one came from a typo in a config \
        file that I still feel bad about. We fixed both. Now every deploy has a checklist and \
        a named owner who signs off.";

    struct DownGenerator;

    #[async_trait]
    impl TextGenerator for DownGenerator {
        async fn generate(&self, _prompt: &str, _temperature: f64) -> Result<String, GenerationError> {
            Err(GenerationError::Empty)
        }
    }

    fn humanizer() -> Humanizer {
        let config = AppConfig::default();
        Humanizer::new(Arc::new(DownGenerator), config.humanizer, config.detector)
    }

    #[test]
    fn test_detect_enforces_minimum_words() {
        let config = AppConfig::default();
        assert_eq!(
            detect("SEO helps.", &config),
            Err(ApiError::TextTooShort { words: 2, minimum: 50 })
        );
        let result = detect(STORY, &config).unwrap();
        assert!(result.ai_probability <= 100);
        assert_eq!(result.verdict, Verdict::Human);
    }

    #[test]
    fn test_insights_short_text_suggestions() {
        let report = insights("SEO helps.", &AppConfig::default());
        assert!(report.sentences.is_empty());
        assert_eq!(report.overall_suggestions, to_strings(&SHORT_TEXT_SUGGESTIONS));
    }

    #[test]
    fn test_insights_fallback_never_empty() {
        let text = "the quick brown fox jumps over the lazy dog and ".repeat(5);
        let report = insights(&text, &AppConfig::default());
        assert!(report.sentences.is_empty());
        assert_eq!(report.overall_suggestions.len(), 4);
        assert_eq!(report.overall_suggestions[3], "Include real-world outcomes or data");
    }

    #[test]
    fn test_insights_flags_uniform_pair() {
        let report = insights(STORY, &AppConfig::default());
        assert_eq!(report.sentences.len(), 2);
        assert_eq!(report.overall_suggestions.len(), 3);
    }

    #[test]
    fn test_compare_identical_text() {
        let response = compare(STORY, STORY, &AppConfig::default()).unwrap();
        assert_eq!(response.improvement_score, 0);
        assert_eq!(response.before, response.after);
        assert_eq!(response.comparison.ai_probability_change, 0);
    }

    #[test]
    fn test_compare_checks_each_side() {
        let config = AppConfig::default();
        assert!(matches!(
            compare(STORY, "Too short.", &config),
            Err(ApiError::TextTooShort { minimum: 50, .. })
        ));
        assert!(matches!(
            compare("Too short.", STORY, &config),
            Err(ApiError::TextTooShort { .. })
        ));
    }

    #[tokio::test]
    async fn test_run_humanizer_invalid_input() {
        let h = humanizer();
        assert!(matches!(
            run_humanizer(&h, "", Mode::Human).await,
            Err(ApiError::InvalidInput(_))
        ));

        let response = humanize_response(&h, "tiny", Mode::Formal).await;
        assert_eq!(response.status, HumanizeStatus::Error);
        assert_eq!(response.retries_used, 0);
        assert!(response.message.unwrap().contains("too short"));
    }

    #[tokio::test]
    async fn test_run_humanizer_outage_is_partial() {
        let result = run_humanizer(&humanizer(), STORY, Mode::Human).await.unwrap();
        assert_eq!(result.status, HumanizeStatus::Partial);
        assert!(result.retries_used <= 3);
    }
}
