use serde::{Deserialize, Serialize};

/// Columns every rule table must provide
pub const RULE_COLUMNS: [&str; 6] = [
    "rule_id",
    "query_name",
    "industry",
    "category",
    "subcategory",
    "compiled_regex",
];

/// A named detection pattern mapped to category labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier (integer ids are stored in decimal form)
    pub rule_id: String,
    pub query_name: String,
    pub industry: String,
    /// Output label
    pub category: String,
    /// Output label
    pub subcategory: String,
    /// Pattern searched for anywhere in the utterance text, compiled as authored
    pub compiled_regex: String,
}
