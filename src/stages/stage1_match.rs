use std::num::NonZeroUsize;

use tracing::{debug, info};

use crate::models::{JourneySummary, Match, Utterance};
use crate::rules::RuleBook;

use super::summarize;

/// Below this many utterances per worker, extra threads are not worth spawning
const MIN_UTTERANCES_PER_WORKER: usize = 256;

/// Configuration for rule matching and aggregation
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Worker threads for the regex pass (0 = available parallelism)
    pub threads: usize,
    /// Emit zero-hit summary rows for calls without any match
    pub include_unmatched_calls: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            include_unmatched_calls: false,
        }
    }
}

/// Result of categorization
#[derive(Debug, Clone, Default)]
pub struct Categorization {
    /// One row per matching (utterance, rule) pair
    pub matches: Vec<Match>,
    /// One row per call, derived from `matches`
    pub summary: Vec<JourneySummary>,
}

/// Perform Stage 1 and 2: match every rule against every utterance and summarize
pub fn categorize(
    utterances: &[Utterance],
    rules: &RuleBook,
    config: &MatcherConfig,
) -> Categorization {
    let matches = match_utterances(utterances, rules, config.threads);
    let summary = summarize(&matches, utterances, config.include_unmatched_calls);

    info!(
        "Categorized {} utterances against {} rules: {} matches across {} calls",
        utterances.len(),
        rules.len(),
        matches.len(),
        summary.len()
    );

    Categorization { matches, summary }
}

/// Semi-join utterances with rules on pattern search.
///
/// Each utterance is searched once against the whole pattern set, so no
/// utterance x rule cross product is ever built. Utterances are split into
/// contiguous chunks evaluated on scoped threads; output keeps utterance order,
/// then rule order within an utterance.
pub fn match_utterances(utterances: &[Utterance], rules: &RuleBook, threads: usize) -> Vec<Match> {
    if utterances.is_empty() || rules.is_empty() {
        return vec![];
    }

    let workers = worker_count(threads, utterances.len());
    if workers <= 1 {
        return match_chunk(utterances, rules);
    }

    let chunk_size = utterances.len().div_ceil(workers);
    debug!(
        "Matching {} utterances on {} workers ({} per chunk)",
        utterances.len(),
        workers,
        chunk_size
    );

    std::thread::scope(|scope| {
        let handles: Vec<_> = utterances
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || match_chunk(chunk, rules)))
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}

fn match_chunk(utterances: &[Utterance], rules: &RuleBook) -> Vec<Match> {
    utterances
        .iter()
        .flat_map(|utterance| {
            rules
                .matching(&utterance.text)
                .map(move |rule| Match::new(utterance, rule))
        })
        .collect()
}

fn worker_count(requested: usize, utterance_count: usize) -> usize {
    let requested = if requested == 0 {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    } else {
        requested
    };
    requested
        .min(utterance_count.div_ceil(MIN_UTTERANCES_PER_WORKER))
        .max(1)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use regex::Regex;

    use super::*;
    use crate::models::Rule;

    fn rule(id: &str, category: &str, subcategory: &str, pattern: &str) -> Rule {
        Rule {
            rule_id: id.to_string(),
            query_name: format!("{}_query", id),
            industry: "Telecom".to_string(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            compiled_regex: pattern.to_string(),
        }
    }

    fn sample_rules() -> RuleBook {
        RuleBook::from_rules(vec![
            rule("R1", "Billing", "Invoice", "bill(ing)?"),
            rule("R2", "Billing", "Refund", "(?i)refund"),
            rule("R3", "Retention", "Cancel", r"\bcancel\b"),
            rule("R4", "Greeting", "Open", "^Hello"),
        ])
        .unwrap()
    }

    fn sample_utterances(n: usize) -> Vec<Utterance> {
        let lines = [
            ("AGENT", "Hello there, how can I help"),
            ("CUSTOMER", "My bill is wrong and I want a REFUND"),
            ("CUSTOMER", "otherwise I will cancel"),
            ("AGENT", "Let me check the billing system"),
            ("CUSTOMER", "nothing relevant here"),
            ("AGENT", "cancellation is not the same word"),
        ];
        (0..n)
            .map(|i| {
                let (speaker, text) = lines[i % lines.len()];
                Utterance::new(format!("CALL_{}", i / 4 + 1), i as u64, speaker, text)
            })
            .collect()
    }

    /// Nested-loop reference: every (utterance, rule) pair where the pattern matches
    fn oracle(utterances: &[Utterance], rules: &RuleBook) -> Vec<Match> {
        let mut out = Vec::new();
        for utterance in utterances {
            for rule in rules.rules() {
                let re = Regex::new(&rule.compiled_regex).unwrap();
                if re.is_match(&utterance.text) {
                    out.push(Match::new(utterance, rule));
                }
            }
        }
        out
    }

    #[test]
    fn test_scenario_single_billing_rule() {
        let rules = RuleBook::from_rules(vec![rule("R1", "Billing", "General", "billing")]).unwrap();
        let utterances = vec![
            Utterance::new("CALL_1", 5, "AGENT", "Hello there"),
            Utterance::new("CALL_1", 10, "CUSTOMER", "I need help with billing"),
        ];

        let result = categorize(&utterances, &rules, &MatcherConfig::default());

        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].speaker, "CUSTOMER");
        assert_eq!(result.matches[0].rule_id, "R1");
        assert_eq!(result.summary.len(), 1);
        assert_eq!(result.summary[0].call_id, "CALL_1");
        assert_eq!(
            result.summary[0].categories,
            BTreeSet::from(["Billing".to_string()])
        );
        assert_eq!(result.summary[0].total_hits, 1);
    }

    #[test]
    fn test_matches_agree_with_nested_loop() {
        let rules = sample_rules();
        let utterances = sample_utterances(60);

        let matches = match_utterances(&utterances, &rules, 1);

        assert_eq!(matches, oracle(&utterances, &rules));
    }

    #[test]
    fn test_parallel_pass_is_identical_to_sequential() {
        let rules = sample_rules();
        let utterances = sample_utterances(2_000);

        let sequential = match_utterances(&utterances, &rules, 1);
        let parallel = match_utterances(&utterances, &rules, 4);

        assert_eq!(parallel, sequential);
        assert_eq!(parallel, oracle(&utterances, &rules));
    }

    #[test]
    fn test_one_utterance_can_match_many_rules() {
        let rules = sample_rules();
        let utterances = vec![Utterance::new("C", 0, "CUSTOMER", "Hello, refund my bill or I cancel")];

        let ids: Vec<String> = match_utterances(&utterances, &rules, 0)
            .into_iter()
            .map(|m| m.rule_id)
            .collect();

        assert_eq!(ids, vec!["R1", "R2", "R3", "R4"]);
    }

    #[test]
    fn test_empty_inputs() {
        let rules = sample_rules();
        let result = categorize(&[], &rules, &MatcherConfig::default());
        assert!(result.matches.is_empty());
        assert!(result.summary.is_empty());

        let empty = RuleBook::from_rules(vec![]).unwrap();
        assert!(match_utterances(&sample_utterances(5), &empty, 0).is_empty());
    }

    #[test]
    fn test_rulebook_is_shared_across_runs() {
        let rules = std::sync::Arc::new(sample_rules());
        let utterances = sample_utterances(12);
        let expected = oracle(&utterances, &rules);

        let runs: Vec<_> = (0..3)
            .map(|_| {
                let rules = std::sync::Arc::clone(&rules);
                let utterances = utterances.clone();
                std::thread::spawn(move || match_utterances(&utterances, &rules, 1))
            })
            .collect();

        for run in runs {
            assert_eq!(run.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(8, 10), 1);
        assert_eq!(worker_count(8, 1_000), 4);
        assert_eq!(worker_count(2, 100_000), 2);
        assert!(worker_count(0, 100_000) >= 1);
    }
}
