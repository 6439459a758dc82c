use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::Utterance;
use crate::stages::format_transcript_line;

/// Metadata about one batch run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub input_rows: usize,
    pub input_columns: usize,
    pub utterances: usize,
    pub rules: usize,
    pub matches: usize,
    pub summarized_calls: usize,
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
}

impl RunReport {
    /// Start a report for a new run with a fresh run id
    pub fn new(input_rows: usize, input_columns: usize) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            input_rows,
            input_columns,
            utterances: 0,
            rules: 0,
            matches: 0,
            summarized_calls: 0,
            warnings: vec![],
            elapsed_ms: 0,
        }
    }
}

/// Write any serializable value as pretty JSON
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    serde_json::to_writer_pretty(file, value).context("Failed to write JSON")?;
    Ok(())
}

/// Human-readable transcript, one block per call
pub struct HumanTranscript<'a> {
    utterances: &'a [Utterance],
}

impl<'a> HumanTranscript<'a> {
    pub fn new(utterances: &'a [Utterance]) -> Self {
        Self { utterances }
    }

    /// Format utterances as transcript lines under a header per call
    pub fn format(&self) -> String {
        let mut output = String::new();
        let mut current_call: Option<&str> = None;

        for utterance in self.utterances {
            if current_call != Some(utterance.call_id.as_str()) {
                if current_call.is_some() {
                    output.push('\n');
                }
                output.push_str(&format!("== {} ==\n", utterance.call_id));
                current_call = Some(utterance.call_id.as_str());
            }
            output.push_str(&format_transcript_line(utterance));
            output.push('\n');
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}
