//! Trace reader for raw execution logs.
//!
//! Accepts JSON Lines (one record object per line) or a single JSON array of
//! record objects. Records keep their order; the builder depends on it.

use super::raw_event::{RawEvent, RawEventKind};
use crate::utils::config::SYSTEM_TAG;
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::path::Path;

/// Envelope fields; everything else is a kind-specific field
const ENVELOPE_FIELDS: &[&str] = &["kind", "timestamp", "thread", "line"];

/// Read a raw trace file
///
/// **Public** - main entry point for the build command
///
/// # Errors
/// * `ParseError::IoError` - file cannot be read
/// * `ParseError::JsonError` - array-format file is not valid JSON
/// * `ParseError::InvalidFormat` - a record is not a JSON object
pub fn read_trace(path: impl AsRef<Path>) -> Result<Vec<RawEvent>, ParseError> {
    let path = path.as_ref();
    debug!("Reading trace from: {}", path.display());

    let text = std::fs::read_to_string(path)?;
    parse_trace_str(&text)
}

/// Parse raw trace text in either supported layout
///
/// A JSON Lines stream stops at the first line that is not valid JSON;
/// the records before it are returned, matching how a truncated trace
/// should be imported.
pub fn parse_trace_str(text: &str) -> Result<Vec<RawEvent>, ParseError> {
    if text.trim_start().starts_with('[') {
        debug!("Trace is array format");
        let records: Vec<Value> = serde_json::from_str(text)?;
        return records.iter().map(parse_record).collect();
    }

    let mut events = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(value) => events.push(parse_record(&value)?),
            Err(e) => {
                warn!("Trace truncated at line {}: {}", index + 1, e);
                break;
            }
        }
    }

    debug!("Parsed {} raw records", events.len());
    Ok(events)
}

/// Convert one JSON record object into a [`RawEvent`]
///
/// A missing or unknown `kind` is not an error here; it yields
/// `RawEventKind::Unrecognized` and the builder skips the record.
pub fn parse_record(value: &Value) -> Result<RawEvent, ParseError> {
    let obj = value.as_object().ok_or_else(|| {
        ParseError::InvalidFormat(format!("Trace record must be a JSON object, found {}", value))
    })?;

    let kind = match obj.get("kind").and_then(Value::as_str) {
        Some(tag) => RawEventKind::from_tag(tag),
        None => RawEventKind::Unrecognized(None),
    };

    let timestamp = match obj.get("timestamp") {
        Some(ts) => parse_json_i64(ts)?,
        None => 0,
    };

    let thread = obj
        .get("thread")
        .and_then(json_text)
        .unwrap_or_else(|| SYSTEM_TAG.to_string());

    let line = obj
        .get("line")
        .and_then(Value::as_u64)
        .and_then(|l| u32::try_from(l).ok());

    let mut event = RawEvent::new(kind, timestamp, thread);
    event.line = line;
    event.fields = kind_fields(obj);
    Ok(event)
}

fn kind_fields(obj: &Map<String, Value>) -> std::collections::BTreeMap<String, String> {
    obj.iter()
        .filter(|(name, _)| !ENVELOPE_FIELDS.contains(&name.as_str()))
        .filter_map(|(name, value)| json_text(value).map(|text| (name.clone(), text)))
        .collect()
}

/// Render a JSON scalar as text; `null` means the field is absent
fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Helper to parse an i64 from various JSON types (number, string)
fn parse_json_i64(val: &Value) -> Result<i64, ParseError> {
    if let Some(n) = val.as_i64() {
        Ok(n)
    } else if let Some(s) = val.as_str() {
        s.trim()
            .parse::<i64>()
            .map_err(|e| ParseError::InvalidFormat(format!("Invalid timestamp '{}': {}", s, e)))
    } else {
        Err(ParseError::InvalidFormat(format!(
            "Expected number or string timestamp, found {}",
            val
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_record_fields_as_text() {
        let record = json!({
            "kind": "OBJECT_NEW",
            "timestamp": "12",
            "thread": 3,
            "line": 40,
            "type": "Foo",
            "object": 16,
            "elements": null
        });

        let event = parse_record(&record).unwrap();
        assert_eq!(event.kind, RawEventKind::ObjectNew);
        assert_eq!(event.timestamp, 12);
        assert_eq!(event.thread, "3");
        assert_eq!(event.line, Some(40));
        assert_eq!(event.field("object"), Some("16"));
        assert_eq!(event.field("elements"), None);
        assert_eq!(event.field("kind"), None);
    }

    #[test]
    fn test_missing_thread_defaults_to_system() {
        let event = parse_record(&json!({"kind": "SYSTEM_START"})).unwrap();
        assert!(event.is_system_thread());
        assert_eq!(event.timestamp, 0);
    }

    #[test]
    fn test_bad_timestamp_is_error() {
        assert!(parse_record(&json!({"kind": "SYSTEM_START", "timestamp": "soon"})).is_err());
    }
}
