use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{TermBucket, Utterance};

static LETTER_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+").expect("letter run pattern is valid"));

/// Configuration for speaker term extraction
#[derive(Debug, Clone)]
pub struct TermConfig {
    /// Minimum letters in a term
    pub min_term_len: usize,
    /// Terms kept per utterance, in extraction order
    pub max_terms_per_utterance: usize,
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            min_term_len: 4,
            max_terms_per_utterance: 50,
        }
    }
}

/// Lower-cased maximal ASCII letter runs of qualifying length, capped per utterance
pub fn extract_terms(text: &str, config: &TermConfig) -> Vec<String> {
    LETTER_RUN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|run| run.len() >= config.min_term_len)
        .take(config.max_terms_per_utterance)
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Count term usage per (call, speaker).
///
/// Sorted by call_id and speaker ascending, then count descending; equal
/// counts fall back to term order.
pub fn speaker_term_buckets(utterances: &[Utterance], config: &TermConfig) -> Vec<TermBucket> {
    let mut counts: HashMap<(&str, &str, String), usize> = HashMap::new();

    for utterance in utterances {
        for term in extract_terms(&utterance.text, config) {
            *counts
                .entry((utterance.call_id.as_str(), utterance.speaker.as_str(), term))
                .or_insert(0) += 1;
        }
    }

    let mut buckets: Vec<TermBucket> = counts
        .into_iter()
        .map(|((call_id, speaker, term), count)| TermBucket {
            call_id: call_id.to_string(),
            speaker: speaker.to_string(),
            term,
            count,
        })
        .collect();

    buckets.sort_by(|a, b| {
        a.call_id
            .cmp(&b.call_id)
            .then_with(|| a.speaker.cmp(&b.speaker))
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a.term.cmp(&b.term))
    });
    buckets
}
