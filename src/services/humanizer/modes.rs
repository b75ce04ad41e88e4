// Rewrite mode table
// Immutable per-mode sampling ranges and extra rules; looked up, never mutated.

use crate::models::Mode;
use crate::services::config_store::HumanizerConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeProfile {
    pub description: &'static str,
    /// Inclusive lower, exclusive upper bound for the sampled temperature.
    pub temperature_range: (f64, f64),
    pub extra_rules: &'static [&'static str],
    /// Overrides the configured minimum candidate/original length ratio.
    pub min_length_ratio: Option<f64>,
    /// Always append variation-forcing rules, not only on retries.
    pub force_variation: bool,
}

pub fn mode_profile(mode: Mode) -> ModeProfile {
    match mode {
        Mode::Human => ModeProfile {
            description: "Natural, casual, mixed rhythm",
            temperature_range: (0.8, 1.1),
            extra_rules: &[],
            min_length_ratio: None,
            force_variation: false,
        },
        Mode::AntiAi => ModeProfile {
            description: "Break AI patterns aggressively",
            temperature_range: (0.95, 1.25),
            extra_rules: &[
                "You MUST rewrite the text; returning it unchanged is not allowed.",
                "Do NOT reuse the original sentence structure.",
            ],
            min_length_ratio: None,
            force_variation: true,
        },
        Mode::Shorten => ModeProfile {
            description: "Reduce length without losing meaning",
            temperature_range: (0.6, 0.8),
            extra_rules: &[
                "Reduce length by ~30%.",
                "Do not add new ideas.",
            ],
            // A ~30% cut sits right on the default 0.7 floor.
            min_length_ratio: Some(0.5),
            force_variation: false,
        },
        Mode::Formal => ModeProfile {
            description: "Polished, professional register with natural flow",
            temperature_range: (0.3, 0.5),
            extra_rules: &[
                "Use a professional register without stiff or templated phrasing.",
                "Avoid contractions and slang.",
            ],
            min_length_ratio: None,
            force_variation: false,
        },
    }
}

impl ModeProfile {
    pub fn min_length_ratio(&self, cfg: &HumanizerConfig) -> f64 {
        self.min_length_ratio.unwrap_or(cfg.min_length_ratio)
    }
}

/// Minimum trimmed input length (chars) accepted for a mode.
pub fn min_input_chars(mode: Mode, cfg: &HumanizerConfig) -> usize {
    match mode {
        Mode::AntiAi => cfg.anti_ai_min_input_chars,
        _ => cfg.min_input_chars,
    }
}

/// Fixed temperature for single-sentence targeted rewrites.
pub fn sentence_rewrite_temperature(mode: Mode) -> f64 {
    match mode {
        Mode::Formal => 0.4,
        _ => 0.8,
    }
}
