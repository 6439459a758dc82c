use std::collections::HashSet;

use regex::{Regex, RegexSet, RegexSetBuilder};
use tracing::info;

use crate::error::RuleLoadError;
use crate::models::{RULE_COLUMNS, Row, Rule, Table, cell_to_string};

/// Compiled size limit for the combined pattern set
const PATTERN_SET_SIZE_LIMIT: usize = 256 * (1 << 20);

/// Read-only handle over a loaded rule table.
///
/// Built once per process and shared by reference (or `Arc`) across runs.
/// All patterns are compiled into a single `RegexSet`, so one search over an
/// utterance reports every rule that matches it.
#[derive(Debug, Clone)]
pub struct RuleBook {
    rules: Vec<Rule>,
    patterns: RegexSet,
}

impl RuleBook {
    /// Build from a rule table, validating columns and patterns up front
    pub fn from_table(table: &Table) -> Result<Self, RuleLoadError> {
        let missing: Vec<String> = RULE_COLUMNS
            .iter()
            .filter(|c| !table.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RuleLoadError::MissingColumns {
                missing,
                available: table.columns().to_vec(),
            });
        }

        let rules = table
            .rows()
            .iter()
            .map(rule_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_rules(rules)
    }

    /// Build from already-decoded rules
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, RuleLoadError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.rule_id.as_str()) {
                return Err(RuleLoadError::DuplicateRuleId(rule.rule_id.clone()));
            }
            // Compile individually first so a bad pattern is reported by rule
            Regex::new(&rule.compiled_regex).map_err(|source| RuleLoadError::InvalidPattern {
                rule_id: rule.rule_id.clone(),
                source,
            })?;
        }

        let patterns = RegexSetBuilder::new(rules.iter().map(|r| r.compiled_regex.as_str()))
            .size_limit(PATTERN_SET_SIZE_LIMIT)
            .build()
            .map_err(RuleLoadError::PatternSet)?;

        info!("Loaded {} rules", rules.len());

        Ok(Self { rules, patterns })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules whose pattern is found anywhere in `text`, in rule table order
    pub fn matching<'a>(&'a self, text: &str) -> impl Iterator<Item = &'a Rule> + use<'a> {
        self.patterns
            .matches(text)
            .into_iter()
            .filter_map(|i| self.rules.get(i))
    }
}

fn rule_from_row(row: &Row) -> Result<Rule, RuleLoadError> {
    let field = |name: &str| cell_to_string(row.get(name)).unwrap_or_default();
    let rule_id = field("rule_id");

    let Some(compiled_regex) = cell_to_string(row.get("compiled_regex")) else {
        return Err(RuleLoadError::MissingPattern { rule_id });
    };

    Ok(Rule {
        query_name: field("query_name"),
        industry: field("industry"),
        category: field("category"),
        subcategory: field("subcategory"),
        rule_id,
        compiled_regex,
    })
}
