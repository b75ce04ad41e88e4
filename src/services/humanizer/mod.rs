// Humanizer Module
// Generate-detect-validate rewrite loop organized into:
// - modes: per-mode sampling ranges and rules
// - sampler: injectable temperature/style randomness
// - prompt: rewrite and single-sentence prompts
// - validator: candidate acceptance rules
// - fallback: deterministic rewrites when generation fails
// - orchestrator: the run state machine

pub mod modes;
pub mod sampler;
pub mod prompt;
pub mod validator;
pub mod fallback;
pub mod orchestrator;

pub use modes::{mode_profile, ModeProfile};
pub use sampler::{FixedSampler, Sampler, SeededSampler};
pub use prompt::{build_rewrite_prompt, build_sentence_prompt, REWRITE_STYLES};
pub use validator::{validate_candidate, CandidateRejection};
pub use fallback::{apply_substitutions, force_rewrite};
pub use orchestrator::{Humanizer, HumanizerError};
