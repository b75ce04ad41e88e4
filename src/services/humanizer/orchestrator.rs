// Rewrite Orchestrator
// Validate → baseline analysis → bounded attempt loop → finalize.
//
// Each run owns its attempt state; nothing is shared between runs except the
// generator handle, whose implementation is responsible for backpressure.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    AttemptReport, BeforeAfter, DetectionResult, HumanizeStatus, InsightReport, Mode,
    OrchestrationResult,
};
use crate::services::config_store::{DetectorConfig, HumanizerConfig};
use crate::services::detection::{analyze_insights, compare_detections, detect_with, score_insights};
use crate::services::providers::{GenerationError, TextGenerator};
use crate::services::text_processor::{
    char_len, clean_candidate, collapse_whitespace, preview, split_sentences,
};

use super::fallback::{apply_substitutions, force_rewrite};
use super::modes::{min_input_chars, mode_profile, sentence_rewrite_temperature};
use super::prompt::{build_rewrite_prompt, build_sentence_prompt};
use super::sampler::{Sampler, SeededSampler};
use super::validator::{validate_candidate, CandidateRejection};

const MESSAGE_FORCED_FALLBACK: &str =
    "Generator produced no distinct rewrite; rule-based rewrite applied.";
const MESSAGE_PARTIAL_FALLBACK: &str =
    "Generator unavailable; deterministic fallback applied to the original text.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HumanizerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("humanizer run cancelled")]
    Cancelled,
}

/// One completed generation within a run.
#[derive(Debug)]
struct RewriteAttempt {
    attempt: u32,
    temperature: f64,
    prompt: String,
    candidate: String,
    detection: DetectionResult,
    insights: InsightReport,
    rejection: Option<CandidateRejection>,
}

impl RewriteAttempt {
    fn valid(&self) -> bool {
        self.rejection.is_none()
    }

    /// Lower AI probability wins; on a tie a valid candidate beats an invalid one.
    fn beats(&self, other: Option<&RewriteAttempt>) -> bool {
        match other {
            None => true,
            Some(best) => {
                self.detection.ai_probability < best.detection.ai_probability
                    || (self.detection.ai_probability == best.detection.ai_probability
                        && self.valid()
                        && !best.valid())
            }
        }
    }

    fn report(&self) -> AttemptReport {
        AttemptReport {
            attempt: self.attempt,
            temperature: self.temperature,
            ai_probability: self.detection.ai_probability,
            valid: self.valid(),
            rejection: self.rejection.as_ref().map(|r| r.to_string()),
        }
    }
}

pub struct Humanizer {
    generator: Arc<dyn TextGenerator>,
    config: HumanizerConfig,
    detector: DetectorConfig,
}

impl Humanizer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        config: HumanizerConfig,
        detector: DetectorConfig,
    ) -> Self {
        Self {
            generator,
            config,
            detector,
        }
    }

    pub fn config(&self) -> &HumanizerConfig {
        &self.config
    }

    /// The only hard rejection point of a run.
    pub fn validate_input<'a>(&self, text: &'a str, mode: Mode) -> Result<&'a str, HumanizerError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(HumanizerError::InvalidInput("Text is required".to_string()));
        }

        let len = char_len(trimmed);
        let min = min_input_chars(mode, &self.config);
        if len < min {
            return Err(HumanizerError::InvalidInput(format!(
                "Text too short: {} characters, minimum {} for mode '{}'",
                len, min, mode
            )));
        }
        if len > self.config.max_input_chars {
            return Err(HumanizerError::InvalidInput(format!(
                "Text too long: {} characters, maximum {}",
                len, self.config.max_input_chars
            )));
        }
        Ok(trimmed)
    }

    /// Single-sentence anti-ai input with a high baseline must never come back unchanged.
    pub fn force_rewrite_applies(&self, mode: Mode, text: &str, baseline: &DetectionResult) -> bool {
        mode == Mode::AntiAi
            && baseline.ai_probability >= self.config.force_rewrite_min_probability
            && split_sentences(text).len() <= 1
    }

    pub async fn run(&self, text: &str, mode: Mode) -> Result<OrchestrationResult, HumanizerError> {
        let mut sampler = SeededSampler::from_entropy();
        self.run_with_sampler(text, mode, &mut sampler).await
    }

    /// Dropping the run on cancellation also drops the in-flight generator call.
    pub async fn run_cancellable(
        &self,
        text: &str,
        mode: Mode,
        cancel: &CancellationToken,
    ) -> Result<OrchestrationResult, HumanizerError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("[HUMANIZER] run cancelled by caller");
                Err(HumanizerError::Cancelled)
            }
            result = self.run(text, mode) => result,
        }
    }

    pub async fn run_with_sampler(
        &self,
        text: &str,
        mode: Mode,
        sampler: &mut dyn Sampler,
    ) -> Result<OrchestrationResult, HumanizerError> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let input = self.validate_input(text, mode)?;

        // Baseline is computed once and reused for the whole run.
        let before_detection = detect_with(input, &self.detector);
        let before_insights = analyze_insights(input);
        let force = self.force_rewrite_applies(mode, input, &before_detection);
        // Candidates are whitespace-collapsed, so echoes are detected against the same form.
        let normalized_input = collapse_whitespace(input);

        let min_ratio = mode_profile(mode).min_length_ratio(&self.config);
        let max_retries = self.config.effective_max_retries();

        info!(
            "[HUMANIZER] run={} mode={} chars={} baseline_ai={} flagged={} force={} preview=\"{}\"",
            run_id,
            mode,
            char_len(input),
            before_detection.ai_probability,
            before_insights.sentences.len(),
            force,
            preview(input, 40)
        );

        let mut best: Option<RewriteAttempt> = None;
        let mut reports: Vec<AttemptReport> = Vec::new();
        let mut retries_used = 0;

        for attempt in 1..=max_retries {
            retries_used = attempt;

            let Some(current) = self
                .attempt_rewrite(run_id, input, mode, attempt, sampler, &before_insights, min_ratio)
                .await
            else {
                continue;
            };
            reports.push(current.report());

            // Under force-rewrite an unchanged echo is never a usable result.
            if force && current.candidate == normalized_input {
                continue;
            }

            let early_exit =
                current.valid() && current.detection.ai_probability < self.config.ai_threshold;

            if current.beats(best.as_ref()) {
                best = Some(current);
            }

            if early_exit {
                info!(
                    "[HUMANIZER] run={} early exit at attempt={} (below threshold {})",
                    run_id, attempt, self.config.ai_threshold
                );
                break;
            }
        }

        let (status, output, after_detection, after_insights, fallback_applied, message) = match best
        {
            Some(best) => (
                HumanizeStatus::Success,
                best.candidate,
                best.detection,
                best.insights,
                false,
                None,
            ),
            None => {
                let (output, message) = if force {
                    (force_rewrite(input), MESSAGE_FORCED_FALLBACK)
                } else {
                    (apply_substitutions(input), MESSAGE_PARTIAL_FALLBACK)
                };
                let detection = detect_with(&output, &self.detector);
                let insights = analyze_insights(&output);
                (
                    HumanizeStatus::Partial,
                    output,
                    detection,
                    insights,
                    true,
                    Some(message.to_string()),
                )
            }
        };

        let comparison = compare_detections(&before_detection, &after_detection);
        let insight_score = score_insights(&before_insights, &after_insights);

        info!(
            "[HUMANIZER] run={} status={:?} retries={} ai {} -> {} fallback={} elapsed_ms={}",
            run_id,
            status,
            retries_used,
            before_detection.ai_probability,
            after_detection.ai_probability,
            fallback_applied,
            started.elapsed().as_millis()
        );

        Ok(OrchestrationResult {
            status,
            mode,
            input: text.to_string(),
            output,
            retries_used,
            forced_rewrite: force,
            fallback_applied,
            message,
            ai_detection: Some(BeforeAfter {
                before: before_detection,
                after: after_detection,
            }),
            insights: Some(BeforeAfter {
                before: before_insights,
                after: after_insights,
            }),
            comparison: Some(comparison),
            insight_score: Some(insight_score),
            attempts: reports,
        })
    }

    /// One generate, clean, score and validate pass. `None` when generation yielded nothing usable.
    #[allow(clippy::too_many_arguments)]
    async fn attempt_rewrite(
        &self,
        run_id: Uuid,
        input: &str,
        mode: Mode,
        attempt: u32,
        sampler: &mut dyn Sampler,
        before_insights: &InsightReport,
        min_ratio: f64,
    ) -> Option<RewriteAttempt> {
        let prompt = build_rewrite_prompt(input, mode, attempt, sampler);
        let temperature = sampler.temperature(mode_profile(mode).temperature_range);

        let raw = match self.generate_with_timeout(&prompt, temperature).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "[HUMANIZER] run={} attempt={} temperature={:.2} generation failed: {}",
                    run_id, attempt, temperature, e
                );
                return None;
            }
        };

        let candidate = clean_candidate(&raw);
        if candidate.is_empty() {
            warn!(
                "[HUMANIZER] run={} attempt={} {}",
                run_id,
                attempt,
                GenerationError::Empty
            );
            return None;
        }

        let detection = detect_with(&candidate, &self.detector);
        let insights = analyze_insights(&candidate);
        let rejection =
            validate_candidate(input, &candidate, before_insights, &insights, min_ratio).err();

        debug!(
            "[HUMANIZER] run={} attempt={} temperature={:.2} prompt_chars={} ai={} flagged={} rejection={:?}",
            run_id,
            attempt,
            temperature,
            char_len(&prompt),
            detection.ai_probability,
            insights.sentences.len(),
            rejection
        );

        Some(RewriteAttempt {
            attempt,
            temperature,
            prompt,
            candidate,
            detection,
            insights,
            rejection,
        })
    }

    /// Targeted rewrite of one sentence, guided by its insight hint. Any failure yields `None`.
    pub async fn rewrite_sentence(
        &self,
        sentence: &str,
        hint: Option<&str>,
        mode: Mode,
    ) -> Option<String> {
        if sentence.trim().is_empty() {
            return None;
        }

        let prompt = build_sentence_prompt(sentence, hint);
        match self
            .generate_with_timeout(&prompt, sentence_rewrite_temperature(mode))
            .await
        {
            Ok(raw) => Some(clean_candidate(&raw)).filter(|s| !s.is_empty()),
            Err(e) => {
                warn!("[HUMANIZER] sentence rewrite failed: {}", e);
                None
            }
        }
    }

    /// A timeout is treated like any other generation failure.
    async fn generate_with_timeout(
        &self,
        prompt: &str,
        temperature: f64,
    ) -> Result<String, GenerationError> {
        let secs = self.config.gateway_timeout_secs;
        match tokio::time::timeout(
            Duration::from_secs(secs),
            self.generator.generate(prompt, temperature),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::humanizer::sampler::FixedSampler;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Single sentence, baseline score 60.
    const FLAT_SENTENCE: &str = "data team model value plan goal data team model value plan goal \
        data team model value plan goal data team model value plan goal should always guide \
        every single quarter without any doubt.";

    const GENERIC_TEXT: &str = "Automation plays a role in modern release pipelines everywhere. \
        Documentation helps new engineers ramp up quickly.";

    const NATURAL_REWRITE: &str = "Honestly? We tried four vendors last spring and only one of \
        them answered the phone when the outage hit on a Sunday night. Lesson learned. \
        Now the contract says who picks up.";

    enum Step {
        Text(String),
        Fail,
    }

    struct ScriptedGenerator {
        steps: Mutex<VecDeque<Step>>,
        calls: AtomicUsize,
        temperatures: Mutex<Vec<f64>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                calls: AtomicUsize::new(0),
                temperatures: Mutex::new(Vec::new()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str, temperature: f64) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.temperatures.lock().unwrap().push(temperature);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.steps.lock().unwrap().pop_front() {
                Some(Step::Text(t)) => Ok(t),
                Some(Step::Fail) | None => Err(GenerationError::Empty),
            }
        }
    }

    struct EchoGenerator(String);

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, _prompt: &str, _temperature: f64) -> Result<String, GenerationError> {
            Ok(self.0.clone())
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn generate(&self, _prompt: &str, _temperature: f64) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(NATURAL_REWRITE.to_string())
        }
    }

    fn humanizer(generator: Arc<dyn TextGenerator>) -> Humanizer {
        Humanizer::new(generator, HumanizerConfig::default(), DetectorConfig::default())
    }

    fn text(s: &str) -> Step {
        Step::Text(s.to_string())
    }

    #[tokio::test]
    async fn test_anti_ai_echo_forces_rule_based_rewrite() {
        let h = humanizer(Arc::new(EchoGenerator(FLAT_SENTENCE.to_string())));
        let result = h
            .run_with_sampler(FLAT_SENTENCE, Mode::AntiAi, &mut FixedSampler(0.3))
            .await
            .unwrap();

        let detection = result.ai_detection.as_ref().unwrap();
        assert_eq!(detection.before.ai_probability, 60);
        assert!(result.forced_rewrite);
        assert_ne!(result.output, FLAT_SENTENCE);
        assert!(result.fallback_applied);
        assert_eq!(result.status, HumanizeStatus::Partial);
        assert_eq!(result.retries_used, 3);
        assert_eq!(result.attempts.len(), 3);
    }

    #[tokio::test]
    async fn test_anti_ai_echo_with_irregular_spacing_is_not_accepted() {
        let input = FLAT_SENTENCE.replacen("plan goal", "plan  goal", 1);
        let h = humanizer(Arc::new(EchoGenerator(input.clone())));
        let result = h
            .run_with_sampler(&input, Mode::AntiAi, &mut FixedSampler(0.3))
            .await
            .unwrap();

        assert_eq!(result.ai_detection.as_ref().unwrap().before.ai_probability, 60);
        assert!(result.forced_rewrite);
        assert_eq!(result.status, HumanizeStatus::Partial);
        assert!(result.fallback_applied);
        assert_ne!(result.output, collapse_whitespace(&input));
        assert!(result.output.starts_with("Put simply, "));
    }

    #[tokio::test]
    async fn test_anti_ai_accepts_distinct_candidate() {
        let generator = ScriptedGenerator::new(vec![text("Output: A plan beats a guess, every quarter.")]);
        let h = humanizer(generator);
        let result = h
            .run_with_sampler(FLAT_SENTENCE, Mode::AntiAi, &mut FixedSampler(0.3))
            .await
            .unwrap();
        assert!(result.forced_rewrite);
        assert_eq!(result.status, HumanizeStatus::Success);
        assert_eq!(result.output, "A plan beats a guess, every quarter.");
        assert!(!result.fallback_applied);
    }

    #[tokio::test]
    async fn test_total_outage_degrades_to_partial() {
        let generator = ScriptedGenerator::new(vec![]);
        let h = humanizer(generator.clone());
        let result = h
            .run_with_sampler(GENERIC_TEXT, Mode::Human, &mut FixedSampler(0.5))
            .await
            .unwrap();

        assert_eq!(result.status, HumanizeStatus::Partial);
        assert_eq!(result.retries_used, 3);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
        assert!(result.attempts.is_empty());
        assert_eq!(
            result.output,
            "Automation shapes modern release pipelines everywhere. \
             Documentation helps new engineers ramp up quickly."
        );
        assert!(!result.forced_rewrite);
    }

    #[tokio::test]
    async fn test_valid_low_score_candidate_exits_early() {
        let generator = ScriptedGenerator::new(vec![text(NATURAL_REWRITE), text("unused")]);
        let h = humanizer(generator.clone());
        let result = h
            .run_with_sampler(GENERIC_TEXT, Mode::Human, &mut FixedSampler(0.5))
            .await
            .unwrap();

        assert_eq!(result.status, HumanizeStatus::Success);
        assert_eq!(result.retries_used, 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.output, NATURAL_REWRITE);
        assert!(result.attempts[0].valid);
        let comparison = result.comparison.unwrap();
        assert!(comparison.ai_probability_change <= 0);
    }

    #[tokio::test]
    async fn test_invalid_candidate_does_not_exit_early() {
        let generator = ScriptedGenerator::new(vec![text("Fine."), text(NATURAL_REWRITE)]);
        let h = humanizer(generator.clone());
        let result = h
            .run_with_sampler(GENERIC_TEXT, Mode::Human, &mut FixedSampler(0.5))
            .await
            .unwrap();

        assert_eq!(result.retries_used, 2);
        assert!(!result.attempts[0].valid);
        assert!(result.attempts[0]
            .rejection
            .as_deref()
            .unwrap()
            .contains("too short"));
        assert_eq!(result.output, NATURAL_REWRITE);
    }

    #[tokio::test]
    async fn test_attempt_keeps_the_prompt_it_sent() {
        let generator = ScriptedGenerator::new(vec![text(NATURAL_REWRITE), Step::Fail]);
        let h = humanizer(generator.clone());
        let before = analyze_insights(GENERIC_TEXT);

        let attempt = h
            .attempt_rewrite(
                Uuid::new_v4(),
                GENERIC_TEXT,
                Mode::Human,
                2,
                &mut FixedSampler(0.0),
                &before,
                0.7,
            )
            .await
            .unwrap();
        assert_eq!(attempt.prompt, generator.prompts.lock().unwrap()[0]);
        assert!(attempt.prompt.contains("Variation (mandatory)"));
        assert_eq!(attempt.candidate, NATURAL_REWRITE);
        assert_eq!(attempt.temperature, 0.8);
        assert!(attempt.valid());

        let failed = h
            .attempt_rewrite(
                Uuid::new_v4(),
                GENERIC_TEXT,
                Mode::Human,
                3,
                &mut FixedSampler(0.0),
                &before,
                0.7,
            )
            .await;
        assert!(failed.is_none());
    }

    #[tokio::test]
    async fn test_gateway_failure_is_skipped() {
        let generator = ScriptedGenerator::new(vec![Step::Fail, text(NATURAL_REWRITE)]);
        let h = humanizer(generator);
        let result = h
            .run_with_sampler(GENERIC_TEXT, Mode::Human, &mut FixedSampler(0.5))
            .await
            .unwrap();

        assert_eq!(result.status, HumanizeStatus::Success);
        assert_eq!(result.retries_used, 2);
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.attempts[0].attempt, 2);
    }

    #[tokio::test]
    async fn test_best_candidate_by_lowest_probability() {
        // All rejected for lack of structural improvement; the flattest loses.
        let uniform = "Alpha bravo charlie delta echo foxtrot golf hotel india juliet. \
            Kilo lima mike november oscar papa quebec romeo sierra tango. \
            Umbrella violin whiskey xylophone yankee zulu apple banana cherry grape. \
            Lemon mango nectarine orange peach quince raspberry strawberry tangerine walnut.";
        let generator = ScriptedGenerator::new(vec![
            text(uniform),
            text(GENERIC_TEXT),
            text(uniform),
        ]);
        let h = humanizer(generator);
        let result = h
            .run_with_sampler(GENERIC_TEXT, Mode::Human, &mut FixedSampler(0.5))
            .await
            .unwrap();

        assert_eq!(result.retries_used, 3);
        assert!(result.attempts.iter().all(|a| !a.valid));
        let lowest = result.attempts.iter().map(|a| a.ai_probability).min().unwrap();
        assert_eq!(result.ai_detection.unwrap().after.ai_probability, lowest);
        assert_eq!(result.status, HumanizeStatus::Success);
    }

    #[tokio::test]
    async fn test_temperature_drawn_from_mode_range() {
        let generator = ScriptedGenerator::new(vec![]);
        let h = humanizer(generator.clone());
        h.run_with_sampler(GENERIC_TEXT, Mode::Human, &mut FixedSampler(0.5))
            .await
            .unwrap();
        let temps = generator.temperatures.lock().unwrap().clone();
        assert_eq!(temps, vec![0.95, 0.95, 0.95]);
    }

    #[tokio::test]
    async fn test_retries_bounded_by_config() {
        let generator = ScriptedGenerator::new(vec![]);
        let mut config = HumanizerConfig::default();
        config.max_retries = 2;
        let h = Humanizer::new(generator.clone(), config, DetectorConfig::default());
        let result = h.run(GENERIC_TEXT, Mode::Shorten).await.unwrap();
        assert!(result.retries_used <= 2);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let h = humanizer(Arc::new(SlowGenerator));
        let result = h
            .run_with_sampler(GENERIC_TEXT, Mode::Human, &mut FixedSampler(0.5))
            .await
            .unwrap();
        assert_eq!(result.status, HumanizeStatus::Partial);
        assert_eq!(result.retries_used, 3);
        assert!(result.attempts.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected() {
        let h = humanizer(Arc::new(EchoGenerator(String::new())));
        for bad in ["", "   ", "too short"] {
            let err = h.run(bad, Mode::Human).await.unwrap_err();
            assert!(matches!(err, HumanizerError::InvalidInput(_)), "{bad:?}");
        }
        let long = "word ".repeat(1200);
        assert!(matches!(
            h.run(&long, Mode::Human).await,
            Err(HumanizerError::InvalidInput(_))
        ));
        // anti-ai accepts shorter input than the other modes
        assert!(h.validate_input("Short one.", Mode::AntiAi).is_ok());
        assert!(h.validate_input("Short one.", Mode::Human).is_err());
    }

    #[tokio::test]
    async fn test_cancelled_run_returns_no_result() {
        let h = humanizer(Arc::new(SlowGenerator));
        let token = CancellationToken::new();
        token.cancel();
        let result = h.run_cancellable(GENERIC_TEXT, Mode::Human, &token).await;
        assert_eq!(result.unwrap_err(), HumanizerError::Cancelled);
    }

    #[tokio::test]
    async fn test_rewrite_sentence() {
        let generator = ScriptedGenerator::new(vec![text("Rewritten: We cut churn by 4% in March.")]);
        let h = humanizer(generator.clone());
        let out = h
            .rewrite_sentence("Retention helps growth.", Some("Add a number."), Mode::Formal)
            .await;
        assert_eq!(out.as_deref(), Some("We cut churn by 4% in March."));
        assert_eq!(generator.temperatures.lock().unwrap()[0], 0.4);

        let failing = humanizer(ScriptedGenerator::new(vec![]));
        assert_eq!(failing.rewrite_sentence("Retention helps growth.", None, Mode::Human).await, None);
        assert_eq!(failing.rewrite_sentence("  ", None, Mode::Human).await, None);
    }
}
