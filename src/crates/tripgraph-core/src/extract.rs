//! Pull structured data out of free-form model output
//!
//! Models asked for JSON routinely wrap it in Markdown code fences or
//! surround it with prose. [`extract_json`] finds the first JSON object or
//! array that actually parses, preferring fenced blocks over bare text.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

/// Why no structured value could be recovered
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// The text contains no `{` or `[` at all
    #[error("no JSON value found in model output")]
    NoJson,

    /// Candidate spans were found but none parsed into the expected shape
    #[error("malformed JSON in model output: {0}")]
    Parse(String),
}

static FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").unwrap());

/// Extract the first parseable JSON object or array from `text`
pub fn extract_json(text: &str) -> Result<Value, ExtractionError> {
    let mut last_error = None;

    let fenced = FENCE_REGEX
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()));

    for source in fenced.chain(std::iter::once(text)) {
        match first_value(source) {
            Ok(value) => return Ok(value),
            Err(ExtractionError::NoJson) => {}
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or(ExtractionError::NoJson))
}

/// Extract JSON and deserialize it into `T`
pub fn extract_json_as<T: DeserializeOwned>(text: &str) -> Result<T, ExtractionError> {
    let value = extract_json(text)?;
    serde_json::from_value(value).map_err(|e| ExtractionError::Parse(e.to_string()))
}

fn first_value(source: &str) -> Result<Value, ExtractionError> {
    let (spans, first_opener) = bracket_spans(source);
    let mut last_error = None;

    for (start, end) in spans {
        match serde_json::from_str::<Value>(&source[start..end]) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(ExtractionError::Parse(e.to_string())),
        }
    }

    match (last_error, first_opener) {
        (Some(err), _) => Err(err),
        (None, Some(start)) => Err(ExtractionError::Parse(format!(
            "unterminated JSON starting at byte {start}"
        ))),
        (None, None) => Err(ExtractionError::NoJson),
    }
}

/// Every balanced bracketed span in `source` ordered by start offset, plus
/// the offset of the first opener seen
///
/// One pass over the text; quoted strings are honored inside brackets. An
/// unterminated opener does not hide complete spans nested inside it.
fn bracket_spans(source: &str) -> (Vec<(usize, usize)>, Option<usize>) {
    let mut open = Vec::new();
    let mut spans = Vec::new();
    let mut first_opener = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in source.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if !open.is_empty() => in_string = true,
            '{' | '[' => {
                first_opener.get_or_insert(i);
                open.push(i);
            }
            '}' | ']' => {
                if let Some(start) = open.pop() {
                    spans.push((start, i + ch.len_utf8()));
                }
            }
            _ => {}
        }
    }

    spans.sort_unstable_by_key(|&(start, _)| start);
    (spans, first_opener)
}
