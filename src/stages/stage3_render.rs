use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::io::{HumanTranscript, RunReport, write_json};
use crate::models::{CategoryHits, TermBucket, Utterance};

use super::Categorization;

/// Configuration for Stage 3 rendering
#[derive(Debug, Clone)]
pub struct Stage3Config {
    /// Whether to write the machine-readable JSON tables
    pub generate_machine: bool,
    /// Whether to write the human-readable transcript
    pub generate_human: bool,
}

impl Default for Stage3Config {
    fn default() -> Self {
        Self {
            generate_machine: true,
            generate_human: false,
        }
    }
}

/// Everything a run produced, borrowed for rendering
pub struct RunOutputs<'a> {
    pub utterances: &'a [Utterance],
    pub categorization: &'a Categorization,
    pub term_buckets: &'a [TermBucket],
    pub category_breakdown: &'a [CategoryHits],
    pub report: &'a RunReport,
}

/// Result of Stage 3 rendering
#[derive(Debug, Default)]
pub struct Stage3Result {
    /// Files written, in write order
    pub written: Vec<PathBuf>,
}

/// Execute Stage 3: write the result tables and run report into `output_dir`
pub fn execute_stage3(
    outputs: &RunOutputs<'_>,
    output_dir: &Path,
    config: &Stage3Config,
) -> Result<Stage3Result> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut result = Stage3Result::default();

    if config.generate_machine {
        emit(output_dir, "utterances.json", outputs.utterances, &mut result)?;
        emit(output_dir, "matches.json", &outputs.categorization.matches, &mut result)?;
        emit(output_dir, "journey_summary.json", &outputs.categorization.summary, &mut result)?;
        emit(output_dir, "term_buckets.json", outputs.term_buckets, &mut result)?;
        emit(output_dir, "category_breakdown.json", outputs.category_breakdown, &mut result)?;
        emit(output_dir, "report.json", outputs.report, &mut result)?;
    }

    if config.generate_human {
        let path = output_dir.join("transcripts.txt");
        info!("Writing human transcript to {:?}", path);
        HumanTranscript::new(outputs.utterances).write_file(&path)?;
        result.written.push(path);
    }

    Ok(result)
}

fn emit<T: Serialize + ?Sized>(
    dir: &Path,
    name: &str,
    value: &T,
    result: &mut Stage3Result,
) -> Result<()> {
    let path = dir.join(name);
    info!("Writing {:?}", path);
    write_json(&path, value)?;
    result.written.push(path);
    Ok(())
}
