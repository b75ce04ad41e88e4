// Heuristic Signal Extraction
// Pure statistics over tokens and sentences; no scoring decisions here

use crate::services::text_processor::{population_variance, split_sentences, tokenize, word_count};
use std::collections::HashMap;

/// Variance above which sentence rhythm counts as human-like.
pub const BURSTINESS_VARIANCE: f64 = 25.0;
/// Max − min token spread at or below which sentences count as uniform.
pub const UNIFORM_SPREAD: usize = 3;
pub const UNIFORM_MIN_SENTENCES: usize = 3;
/// A token repeated more often than this forms a cluster.
pub const REPEAT_FREQUENCY: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct TextMetrics {
    /// Whitespace word count of the raw text.
    pub raw_word_count: usize,
    /// Count of `[a-z]` tokens after normalization.
    pub token_count: usize,
    /// At least 1: text without delimiters scores as one sentence.
    pub sentence_count: usize,
    pub sentence_lengths: Vec<usize>,
    pub vocab_ratio: f64,
    pub sentence_variance: f64,
    pub repeated_words: usize,
    pub uniform_sentences: bool,
    pub bursty: bool,
}

pub fn analyze_text(text: &str) -> TextMetrics {
    let tokens = tokenize(text);
    let sentences = split_sentences(text);

    let sentence_lengths: Vec<usize> = if sentences.is_empty() {
        vec![tokens.len()]
    } else {
        sentences.iter().map(|s| tokenize(s).len()).collect()
    };
    let sentence_variance = population_variance(&sentence_lengths);

    let uniform_sentences = sentences.len() >= UNIFORM_MIN_SENTENCES && {
        let max = sentence_lengths.iter().copied().max().unwrap_or(0);
        let min = sentence_lengths.iter().copied().min().unwrap_or(0);
        max - min <= UNIFORM_SPREAD
    };

    let mut freq: HashMap<&str, usize> = HashMap::new();
    for token in &tokens {
        *freq.entry(token.as_str()).or_insert(0) += 1;
    }
    let repeated_words = freq.values().filter(|&&c| c > REPEAT_FREQUENCY).count();

    let vocab_ratio = if tokens.is_empty() {
        0.0
    } else {
        freq.len() as f64 / tokens.len() as f64
    };

    TextMetrics {
        raw_word_count: word_count(text),
        token_count: tokens.len(),
        sentence_count: sentences.len().max(1),
        sentence_lengths,
        vocab_ratio,
        sentence_variance,
        repeated_words,
        uniform_sentences,
        bursty: sentence_variance > BURSTINESS_VARIANCE,
    }
}
