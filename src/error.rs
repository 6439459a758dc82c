use std::path::PathBuf;

use thiserror::Error;

/// A required column is missing from the input table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("column '{column}' not found. Available columns: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

/// The rule table could not be loaded; no matching may run
#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("rules not found. Searched: {searched:?}")]
    NotFound { searched: Vec<PathBuf> },

    #[error("rule table is missing required columns {missing:?}. Available columns: {available:?}")]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("rule {rule_id} has an invalid pattern: {source}")]
    InvalidPattern {
        rule_id: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule {rule_id} has no compiled_regex")]
    MissingPattern { rule_id: String },

    #[error("duplicate rule_id: {0}")]
    DuplicateRuleId(String),

    #[error("failed to read rule file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule table: {0}")]
    Parse(#[from] InputError),

    #[error("rule pattern set could not be built: {0}")]
    PatternSet(#[source] regex::Error),
}

/// The JSON input table could not be read or decoded
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("expected a JSON array of row objects")]
    NotAnArray,

    #[error("row {index} is not a JSON object")]
    NotAnObject { index: usize },
}

/// Non-fatal: raw transcript parsing yielded no utterances
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "no valid transcript lines were found in column '{column}'. \
     Check that the data matches the expected format: [HH:MM:SS SPEAKER]: message"
)]
pub struct ParseWarning {
    pub column: String,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    RuleLoad(#[from] RuleLoadError),

    #[error(transparent)]
    Input(#[from] InputError),
}
