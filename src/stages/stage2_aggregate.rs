use std::collections::{BTreeMap, HashMap};

use crate::models::{CategoryHits, JourneySummary, Match, Utterance};

/// Group matches by call into journey summaries, ordered by call_id.
///
/// Only calls with at least one match appear, unless `include_unmatched_calls`
/// is set, in which case every call in `utterances` gets a row.
pub fn summarize(
    matches: &[Match],
    utterances: &[Utterance],
    include_unmatched_calls: bool,
) -> Vec<JourneySummary> {
    let mut by_call: BTreeMap<&str, JourneySummary> = BTreeMap::new();

    if include_unmatched_calls {
        for utterance in utterances {
            by_call
                .entry(utterance.call_id.as_str())
                .or_insert_with(|| JourneySummary::empty(utterance.call_id.as_str()));
        }
    }

    for m in matches {
        let summary = by_call
            .entry(m.call_id.as_str())
            .or_insert_with(|| JourneySummary::empty(m.call_id.as_str()));
        summary.categories.insert(m.category.clone());
        summary.subcategories.insert(m.subcategory.clone());
        summary.total_hits += 1;
    }

    by_call.into_values().collect()
}

/// Hits per category, most hit first (ties by name), optionally truncated
pub fn category_breakdown(matches: &[Match], limit: Option<usize>) -> Vec<CategoryHits> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for m in matches {
        *counts.entry(m.category.as_str()).or_insert(0) += 1;
    }

    let mut breakdown: Vec<CategoryHits> = counts
        .into_iter()
        .map(|(category, hits)| CategoryHits {
            category: category.to_string(),
            hits,
        })
        .collect();
    breakdown.sort_by(|a, b| b.hits.cmp(&a.hits).then_with(|| a.category.cmp(&b.category)));

    if let Some(limit) = limit {
        breakdown.truncate(limit);
    }
    breakdown
}
