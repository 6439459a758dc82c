pub mod error;
pub mod io;
pub mod models;
pub mod rules;
pub mod stages;
pub mod terms;

pub use error::{Error, InputError, ParseWarning, RuleLoadError, SchemaError};
pub use io::{HumanTranscript, RunReport, parse_table_json, read_table_file};
pub use models::{
    CategoryHits, JourneySummary, Match, Rule, TermBucket, Table, Utterance,
};
pub use rules::RuleBook;
pub use stages::{
    Categorization, ColumnMapping, InputMode, MatcherConfig, RunOutputs, Segmentation,
    Stage3Config, categorize, category_breakdown, execute_stage3, segment, segment_file, summarize,
};
pub use terms::{TermConfig, speaker_term_buckets};
