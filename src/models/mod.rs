// Humanizer Data Models
// Serializable request/response types shared by detection, insights and rewriting

use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Detection ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Human,
    Mixed,
    LikelyAi,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Mixed => "mixed",
            Self::LikelyAi => "likely-ai",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered so that `min` picks the weaker of two confidences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Burstiness {
    HumanLike,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSet {
    /// Unique tokens / total tokens, rounded to 2 decimals.
    pub vocabulary_richness: f64,
    /// Population variance of per-sentence token counts, rounded to 2 decimals.
    pub sentence_length_variance: f64,
    pub repeated_word_clusters: usize,
    pub burstiness: Burstiness,
    pub uniform_sentences: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub verdict: Verdict,
    /// Heuristic score in [0, 100].
    pub ai_probability: u8,
    pub confidence: Confidence,
    pub signals: SignalSet,
    pub explanation: String,
    pub word_count: usize,
    pub sentence_count: usize,
}

// ============ Insights ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightFlag {
    Generic,
    Vague,
    UniformLength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// 1-based position of the sentence in document order.
    pub index: usize,
    pub text: String,
    pub flags: Vec<InsightFlag>,
    pub hint: String,
}

impl Insight {
    pub fn has_flag(&self, flag: InsightFlag) -> bool {
        self.flags.contains(&flag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub sentences: Vec<Insight>,
    pub overall_suggestions: Vec<String>,
}

impl InsightReport {
    pub fn generic_count(&self) -> usize {
        self.sentences
            .iter()
            .filter(|s| s.has_flag(InsightFlag::Generic))
            .count()
    }
}

// ============ Comparison ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    /// after − before; negative means the rewrite reads less machine-like.
    pub ai_probability_change: i32,
    pub sentence_variance_improved: bool,
    pub uniformity_reduced: bool,
    pub humanization_score: u8,
    /// e.g. `"likely-ai → mixed"`
    pub verdict_change: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub before: DetectionResult,
    pub after: DetectionResult,
    pub improvement_score: u8,
    pub confidence: Confidence,
    pub comparison: ComparisonReport,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightScore {
    pub before_score: u32,
    pub after_score: u32,
    pub improvement: u32,
}

// ============ Humanizer ============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Human,
    AntiAi,
    Shorten,
    Formal,
}

impl Mode {
    /// Unknown names fall back to `Human`.
    pub fn parse(val: &str) -> Self {
        match val.trim().to_lowercase().as_str() {
            "anti-ai" | "anti_ai" | "antiai" => Self::AntiAi,
            "shorten" => Self::Shorten,
            "formal" => Self::Formal,
            _ => Self::Human,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::AntiAi => "anti-ai",
            Self::Shorten => "shorten",
            Self::Formal => "formal",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumanizeStatus {
    Success,
    Partial,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeforeAfter<T> {
    pub before: T,
    pub after: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptReport {
    pub attempt: u32,
    pub temperature: f64,
    pub ai_probability: u8,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResult {
    pub status: HumanizeStatus,
    pub mode: Mode,
    pub input: String,
    pub output: String,
    pub retries_used: u32,
    pub forced_rewrite: bool,
    /// True when the output came from a deterministic transform instead of the generator.
    #[serde(default)]
    pub fallback_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_detection: Option<BeforeAfter<DetectionResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<BeforeAfter<InsightReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight_score: Option<InsightScore>,
    #[serde(default)]
    pub attempts: Vec<AttemptReport>,
}

impl OrchestrationResult {
    /// Transport-facing shape for a rejected input; the only `Error` status the core produces.
    pub fn invalid_input(mode: Mode, input: &str, message: impl Into<String>) -> Self {
        Self {
            status: HumanizeStatus::Error,
            mode,
            input: input.to_string(),
            output: String::new(),
            retries_used: 0,
            forced_rewrite: false,
            fallback_applied: false,
            message: Some(message.into()),
            ai_detection: None,
            insights: None,
            comparison: None,
            insight_score: None,
            attempts: Vec::new(),
        }
    }
}
