use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Rule, Utterance};

/// A confirmed (utterance, rule) pair where the rule's pattern matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub call_id: String,
    pub timestamp: u64,
    pub speaker: String,
    pub text: String,
    pub rule_id: String,
    pub query_name: String,
    pub category: String,
    pub subcategory: String,
}

impl Match {
    pub fn new(utterance: &Utterance, rule: &Rule) -> Self {
        Self {
            call_id: utterance.call_id.clone(),
            timestamp: utterance.timestamp,
            speaker: utterance.speaker.clone(),
            text: utterance.text.clone(),
            rule_id: rule.rule_id.clone(),
            query_name: rule.query_name.clone(),
            category: rule.category.clone(),
            subcategory: rule.subcategory.clone(),
        }
    }
}

/// Per-call rollup of rule hits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneySummary {
    pub call_id: String,
    /// Distinct categories seen in the call
    pub categories: BTreeSet<String>,
    /// Distinct subcategories seen in the call
    pub subcategories: BTreeSet<String>,
    /// Number of match rows for the call
    pub total_hits: usize,
}

impl JourneySummary {
    pub fn empty(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            categories: BTreeSet::new(),
            subcategories: BTreeSet::new(),
            total_hits: 0,
        }
    }
}

/// How often a speaker used a term within a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermBucket {
    pub call_id: String,
    pub speaker: String,
    pub term: String,
    pub count: usize,
}

/// Rule hits per category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryHits {
    pub category: String,
    pub hits: usize,
}
