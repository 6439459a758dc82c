use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::RuleLoadError;
use crate::io::parse_table_json;

use super::RuleBook;

/// Locations searched for the embedded rule table, relative to a base directory
pub const RULE_PATHS: [&str; 2] = ["rules/rules_embedded.json", "rules_embedded.json"];

impl RuleBook {
    /// Load a rule table from a JSON file
    pub fn load(path: &Path) -> Result<Self, RuleLoadError> {
        if !path.is_file() {
            return Err(RuleLoadError::NotFound {
                searched: vec![path.to_path_buf()],
            });
        }

        info!("Loading rules from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| RuleLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = parse_table_json(&content)?;

        Self::from_table(&table)
    }

    /// Load the first rule table found under `base`
    pub fn discover(base: &Path) -> Result<Self, RuleLoadError> {
        let candidates: Vec<PathBuf> = RULE_PATHS.iter().map(|p| base.join(p)).collect();

        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => Self::load(path),
            None => Err(RuleLoadError::NotFound {
                searched: candidates,
            }),
        }
    }
}
