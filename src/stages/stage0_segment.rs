use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, ParseWarning, SchemaError};
use crate::io::read_table_file;
use crate::models::{Table, Utterance, cell_to_string};

/// Transcript line pattern, applied to a whole cell in one multi-line pass.
///
/// Accepts `[HH:MM:SS SPEAKER]: text` and `[HH:MM:SS] SPEAKER: text`.
/// The speaker must start with a letter. Horizontal whitespace only, so no
/// match can span a line break.
static TRANSCRIPT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mR)^[^\S\r\n]*\[([0-9]{2}):([0-9]{2}):([0-9]{2})(?:[^\S\r\n]+([A-Za-z][A-Za-z ]*)\]|\][^\S\r\n]*([A-Za-z][A-Za-z ]*))[^\S\r\n]*:[^\S\r\n]*(.*)$",
    )
    .expect("transcript line pattern is valid")
});

/// Source column names for structured (one utterance per row) input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub call_id: String,
    pub timestamp: String,
    pub speaker: String,
    pub text: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            call_id: "call_id".to_string(),
            timestamp: "timestamp".to_string(),
            speaker: "speaker".to_string(),
            text: "text".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Mapped source columns in canonical order
    fn sources(&self) -> [&str; 4] {
        [
            self.call_id.as_str(),
            self.timestamp.as_str(),
            self.speaker.as_str(),
            self.text.as_str(),
        ]
    }
}

/// How the input table is laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// One utterance per row
    Structured(ColumnMapping),
    /// A whole conversation per row in a single text column
    Raw {
        raw_column: String,
        call_id_column: Option<String>,
    },
}

impl Default for InputMode {
    fn default() -> Self {
        Self::Raw {
            raw_column: "transcript".to_string(),
            call_id_column: None,
        }
    }
}

/// Result of segmentation
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    /// Normalized utterances in input order
    pub utterances: Vec<Utterance>,
    /// Non-fatal data quality warnings
    pub warnings: Vec<ParseWarning>,
}

/// Perform Stage 0: split the input table into utterances
pub fn segment(table: &Table, mode: &InputMode) -> Result<Segmentation, SchemaError> {
    match mode {
        InputMode::Structured(mapping) => segment_structured(table, mapping),
        InputMode::Raw {
            raw_column,
            call_id_column,
        } => segment_raw(table, raw_column, call_id_column.as_deref()),
    }
}

/// Read a JSON input table and segment it
///
/// Returns the table alongside its segmentation so callers can report input
/// dimensions.
pub fn segment_file(path: &Path, mode: &InputMode) -> Result<(Table, Segmentation), Error> {
    let table = read_table_file(path)?;
    info!(
        "Loaded {} rows, {} columns from {:?}",
        table.height(),
        table.width(),
        path
    );
    let segmentation = segment(&table, mode)?;
    Ok((table, segmentation))
}

/// Rename mapped columns to the canonical utterance schema
///
/// Every mapped column is validated before any row is read.
pub fn segment_structured(
    table: &Table,
    mapping: &ColumnMapping,
) -> Result<Segmentation, SchemaError> {
    for column in mapping.sources() {
        table.require_column(column)?;
    }

    let utterances: Vec<Utterance> = table
        .rows()
        .iter()
        .map(|row| Utterance {
            call_id: cell_to_string(row.get(&mapping.call_id)).unwrap_or_default(),
            timestamp: to_seconds(row.get(&mapping.timestamp)),
            speaker: cell_to_string(row.get(&mapping.speaker))
                .unwrap_or_default()
                .to_uppercase(),
            text: cell_to_string(row.get(&mapping.text)).unwrap_or_default(),
        })
        .collect();

    info!("Loaded {} structured utterances", utterances.len());

    Ok(Segmentation {
        utterances,
        warnings: vec![],
    })
}

/// Explode a raw transcript column into one utterance per bracketed line
///
/// Lines that do not match the transcript pattern are dropped. Rows without a
/// call id get `CALL_<n>`, where `n` is the 1-based row position.
pub fn segment_raw(
    table: &Table,
    raw_column: &str,
    call_id_column: Option<&str>,
) -> Result<Segmentation, SchemaError> {
    table.require_column(raw_column)?;

    let mut utterances = Vec::new();

    for (index, row) in table.rows().iter().enumerate() {
        let row_number = index + 1;

        let Some(raw) = cell_to_string(row.get(raw_column)) else {
            debug!("Row {} has no transcript", row_number);
            continue;
        };
        if raw.trim().is_empty() {
            debug!("Row {} has an empty transcript", row_number);
            continue;
        }

        let call_id = call_id_column
            .and_then(|column| cell_to_string(row.get(column)))
            .unwrap_or_else(|| format!("CALL_{}", row_number));

        let raw = normalize_line_breaks(&raw);
        let before = utterances.len();
        utterances.extend(
            TRANSCRIPT_LINE
                .captures_iter(&raw)
                .map(|caps| utterance_from_line(&call_id, &caps)),
        );
        debug!(
            "Row {} ({}) produced {} utterances",
            row_number,
            call_id,
            utterances.len() - before
        );
    }

    let mut warnings = Vec::new();
    if utterances.is_empty() {
        let warning = ParseWarning {
            column: raw_column.to_string(),
        };
        warn!("{}", warning);
        warnings.push(warning);
    } else {
        info!(
            "Extracted {} utterances from {} rows",
            utterances.len(),
            table.height()
        );
    }

    Ok(Segmentation {
        utterances,
        warnings,
    })
}

/// Vertical tab, form feed, file/group/record separators, NEL, LS and PS
fn is_extra_line_break(c: char) -> bool {
    matches!(
        c,
        '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Map every other line separator onto `\n` so the line pattern sees them
fn normalize_line_breaks(raw: &str) -> Cow<'_, str> {
    if raw.contains(is_extra_line_break) {
        Cow::Owned(raw.replace(is_extra_line_break, "\n"))
    } else {
        Cow::Borrowed(raw)
    }
}

fn utterance_from_line(call_id: &str, caps: &Captures<'_>) -> Utterance {
    let field = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let speaker = caps
        .get(4)
        .or_else(|| caps.get(5))
        .map(|m| m.as_str().trim().to_uppercase())
        .unwrap_or_default();
    let text = caps
        .get(6)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    Utterance {
        call_id: call_id.to_string(),
        timestamp: field(1) * 3600 + field(2) * 60 + field(3),
        speaker,
        text,
    }
}

/// Convert a timestamp cell to seconds. Never fails: anything unusable is 0.
pub fn to_seconds(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && *f < u64::MAX as f64)
                    .map(|f| f as u64)
            })
            .unwrap_or(0),
        Some(Value::String(s)) => clock_to_seconds(s),
        _ => 0,
    }
}

/// Parse `"90"` or `"HH:MM:SS"` into seconds, 0 when unparseable
pub fn clock_to_seconds(s: &str) -> u64 {
    let s = s.trim();
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    if all_digits(s) {
        return s.parse().unwrap_or(0);
    }

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 || !parts.iter().all(|p| all_digits(p)) {
        return 0;
    }

    let mut seconds = 0u64;
    for (part, scale) in parts.iter().zip([3600u64, 60, 1]) {
        let Ok(value) = part.parse::<u64>() else {
            return 0;
        };
        match value.checked_mul(scale).and_then(|v| seconds.checked_add(v)) {
            Some(total) => seconds = total,
            None => return 0,
        }
    }
    seconds
}

/// Format seconds as HH:MM:SS
pub fn format_clock(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Render an utterance back into the raw transcript line format
pub fn format_transcript_line(utterance: &Utterance) -> String {
    format!(
        "[{} {}]: {}",
        format_clock(utterance.timestamp),
        utterance.speaker,
        utterance.text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_table_json;

    fn raw_mode() -> InputMode {
        InputMode::default()
    }

    #[test]
    fn test_segment_raw_scenario() {
        let table = parse_table_json(
            r#"[{"transcript": "[00:00:05 AGENT]: Hello there\n[00:00:10 CUSTOMER]: I need help with billing"}]"#,
        )
        .unwrap();

        let result = segment(&table, &raw_mode()).unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(
            result.utterances,
            vec![
                Utterance::new("CALL_1", 5, "AGENT", "Hello there"),
                Utterance::new("CALL_1", 10, "CUSTOMER", "I need help with billing"),
            ]
        );
    }

    #[test]
    fn test_segment_raw_uses_call_id_column() {
        let table = parse_table_json(
            r#"[
                {"id": "C-9", "transcript": "[01:02:03 agent]: hi"},
                {"id": null, "transcript": "[00:00:01 Customer Care]: hello"}
            ]"#,
        )
        .unwrap();

        let result = segment_raw(&table, "transcript", Some("id")).unwrap();

        assert_eq!(result.utterances[0].call_id, "C-9");
        assert_eq!(result.utterances[0].timestamp, 3723);
        assert_eq!(result.utterances[0].speaker, "AGENT");
        assert_eq!(result.utterances[1].call_id, "CALL_2");
        assert_eq!(result.utterances[1].speaker, "CUSTOMER CARE");
    }

    #[test]
    fn test_row_numbers_count_skipped_rows() {
        let table = parse_table_json(
            r#"[
                {"transcript": ""},
                {"transcript": null},
                {"transcript": "[00:00:01 AGENT]: third row"}
            ]"#,
        )
        .unwrap();

        let result = segment(&table, &raw_mode()).unwrap();

        assert_eq!(result.utterances.len(), 1);
        assert_eq!(result.utterances[0].call_id, "CALL_3");
    }

    #[test]
    fn test_unmatched_lines_are_dropped() {
        let table = parse_table_json(
            r#"[{"transcript": "header line\n\n  [00:00:07 AGENT] :  spaced out  \r\n[0:00:07 AGENT]: one-digit hour\n[00:00:09] CUSTOMER: outside brackets\nno brackets here"}]"#,
        )
        .unwrap();

        let result = segment(&table, &raw_mode()).unwrap();

        assert_eq!(
            result.utterances,
            vec![
                Utterance::new("CALL_1", 7, "AGENT", "spaced out"),
                Utterance::new("CALL_1", 9, "CUSTOMER", "outside brackets"),
            ]
        );
    }

    #[test]
    fn test_no_valid_lines_yields_empty_table_and_warning() {
        let table = parse_table_json(
            r#"[{"transcript": "just some text\nand more text"}, {"transcript": 42}]"#,
        )
        .unwrap();

        let result = segment(&table, &raw_mode()).unwrap();

        assert!(result.utterances.is_empty());
        assert_eq!(
            result.warnings,
            vec![ParseWarning {
                column: "transcript".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_raw_column() {
        let table = parse_table_json(r#"[{"body": "[00:00:05 AGENT]: hi"}]"#).unwrap();

        let err = segment(&table, &raw_mode()).unwrap_err();

        assert_eq!(
            err,
            SchemaError::MissingColumn {
                column: "transcript".to_string(),
                available: vec!["body".to_string()],
            }
        );
    }

    #[test]
    fn test_reparse_of_formatted_output_is_stable() {
        let table = parse_table_json(
            r#"[{"transcript": "[00:00:05 AGENT]:   Hello there  \n[00:01:10   customer ]: I need help\n[10:00:00 AGENT]: ok"}]"#,
        )
        .unwrap();
        let first = segment(&table, &raw_mode()).unwrap().utterances;

        let rendered: Vec<String> = first.iter().map(format_transcript_line).collect();
        let rows = serde_json::json!([{ "transcript": rendered.join("\n") }]);
        let table = parse_table_json(&rows.to_string()).unwrap();
        let second = segment(&table, &raw_mode()).unwrap().utterances;

        assert_eq!(first, second);
    }

    #[test]
    fn test_speaker_needs_a_letter() {
        let table = parse_table_json(
            r#"[{"transcript": "[00:00:05] : hello\n[00:00:06  ]: blank\n[00:00:07] Agent: ok"}]"#,
        )
        .unwrap();
        let first = segment(&table, &raw_mode()).unwrap().utterances;

        assert_eq!(first, vec![Utterance::new("CALL_1", 7, "AGENT", "ok")]);

        let rendered: Vec<String> = first.iter().map(format_transcript_line).collect();
        let rows = serde_json::json!([{ "transcript": rendered.join("\n") }]);
        let table = parse_table_json(&rows.to_string()).unwrap();
        assert_eq!(segment(&table, &raw_mode()).unwrap().utterances, first);
    }

    #[test]
    fn test_unicode_line_separators_split_turns() {
        let rows = serde_json::json!([{
            "transcript": "[00:00:05 AGENT]: hi\u{2028}[00:00:06 CUSTOMER]: yo\u{85}[00:00:07 AGENT]: ok\u{0b}[00:00:08 CUSTOMER]: bye\u{1e}[00:00:09 AGENT]: done"
        }]);
        let table = parse_table_json(&rows.to_string()).unwrap();

        let result = segment(&table, &raw_mode()).unwrap();

        assert_eq!(
            result.utterances,
            vec![
                Utterance::new("CALL_1", 5, "AGENT", "hi"),
                Utterance::new("CALL_1", 6, "CUSTOMER", "yo"),
                Utterance::new("CALL_1", 7, "AGENT", "ok"),
                Utterance::new("CALL_1", 8, "CUSTOMER", "bye"),
                Utterance::new("CALL_1", 9, "AGENT", "done"),
            ]
        );
    }

    #[test]
    fn test_segment_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.json");
        std::fs::write(&path, r#"[{"transcript": "[00:00:05 AGENT]: hi"}]"#).unwrap();

        let (table, result) = segment_file(&path, &raw_mode()).unwrap();
        assert_eq!(table.height(), 1);
        assert_eq!(result.utterances.len(), 1);

        let err = segment_file(&path, &InputMode::Structured(ColumnMapping::default())).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::MissingColumn { .. })));

        let err = segment_file(&dir.path().join("missing.json"), &raw_mode()).unwrap_err();
        assert!(matches!(err, Error::Input(crate::error::InputError::Read { .. })));
    }

    #[test]
    fn test_segment_structured_renames_columns() {
        let table = parse_table_json(
            r#"[
                {"Call": 1001, "Time": "00:01:30", "Who": "agent", "Said": "Thanks for calling"},
                {"Call": 1001, "Time": 95.7, "Who": "Customer", "Said": null}
            ]"#,
        )
        .unwrap();
        let mapping = ColumnMapping {
            call_id: "Call".to_string(),
            timestamp: "Time".to_string(),
            speaker: "Who".to_string(),
            text: "Said".to_string(),
        };

        let result = segment(&table, &InputMode::Structured(mapping)).unwrap();

        assert_eq!(
            result.utterances,
            vec![
                Utterance::new("1001", 90, "AGENT", "Thanks for calling"),
                Utterance::new("1001", 95, "CUSTOMER", ""),
            ]
        );
    }

    #[test]
    fn test_segment_structured_missing_column() {
        let table = parse_table_json(r#"[{"call_id": "a", "speaker": "x", "text": "y"}]"#).unwrap();

        let err = segment_structured(&table, &ColumnMapping::default()).unwrap_err();

        match err {
            SchemaError::MissingColumn { column, available } => {
                assert_eq!(column, "timestamp");
                assert_eq!(available, vec!["call_id", "speaker", "text"]);
            }
        }
    }

    #[test]
    fn test_to_seconds() {
        use serde_json::json;

        assert_eq!(to_seconds(Some(&json!("01:02:03"))), 3723);
        assert_eq!(to_seconds(Some(&json!(90))), 90);
        assert_eq!(to_seconds(Some(&json!("90"))), 90);
        assert_eq!(to_seconds(Some(&json!(12.9))), 12);
        assert_eq!(to_seconds(Some(&json!(1e30))), 0);
        assert_eq!(to_seconds(Some(&json!(-3.0))), 0);
        assert_eq!(to_seconds(None), 0);
        assert_eq!(to_seconds(Some(&Value::Null)), 0);
        assert_eq!(to_seconds(Some(&json!(""))), 0);
        assert_eq!(to_seconds(Some(&json!("1:2"))), 0);
        assert_eq!(to_seconds(Some(&json!("aa:bb:cc"))), 0);
        assert_eq!(to_seconds(Some(&json!("12.5"))), 0);
        assert_eq!(to_seconds(Some(&json!(-4))), 0);
        assert_eq!(to_seconds(Some(&json!(true))), 0);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3723), "01:02:03");
        assert_eq!(
            format_transcript_line(&Utterance::new("C", 5, "AGENT", "Hi")),
            "[00:00:05 AGENT]: Hi"
        );
    }
}
