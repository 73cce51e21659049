use contour_trace::parser::{parse_oid, parse_trace_str, read_trace, RawEventKind};
use contour_trace::utils::config::SYSTEM_TAG;
use contour_trace::utils::error::ParseError;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_json_lines_trace() {
    let text = r#"
{"kind":"SYSTEM_START","timestamp":0}
{"kind":"OBJECT_NEW","timestamp":5,"thread":1,"line":42,"type":"Foo","object":"0x10"}

{"kind":"METHOD_CALL","timestamp":"6","thread":"1","signature":"Foo;.run()void","caller":null}
"#;

    let records = parse_trace_str(text).unwrap();
    assert_eq!(records.len(), 3);

    assert_eq!(records[0].kind, RawEventKind::SystemStart);
    assert_eq!(records[0].thread, SYSTEM_TAG);

    let object_new = &records[1];
    assert_eq!(object_new.kind, RawEventKind::ObjectNew);
    assert_eq!(object_new.thread, "1");
    assert_eq!(object_new.line, Some(42));
    assert_eq!(object_new.field("type"), Some("Foo"));
    assert_eq!(object_new.field("object"), Some("0x10"));
    assert_eq!(object_new.field("line"), None);

    let call = &records[2];
    assert_eq!(call.timestamp, 6);
    assert_eq!(call.field("caller"), None);
}

#[test]
fn test_json_array_trace() {
    let text = r#"[
        {"kind":"THREAD_CREATE","timestamp":1,"newthread":2},
        {"kind":"THREAD_START","timestamp":2,"thread":2}
    ]"#;

    let records = parse_trace_str(text).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].field("newthread"), Some("2"));
    assert_eq!(records[1].kind, RawEventKind::ThreadStart);
}

#[test]
fn test_invalid_line_truncates_stream() {
    let text = "{\"kind\":\"SYSTEM_START\",\"timestamp\":0}\n{\"kind\":\"THREAD_YI\n{\"kind\":\"SYSTEM_END\",\"timestamp\":9}\n";

    let records = parse_trace_str(text).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, RawEventKind::SystemStart);
}

#[test]
fn test_unknown_and_missing_kinds_are_kept() {
    let text = "{\"kind\":\"GC_PAUSE\"}\n{\"timestamp\":3}\n";

    let records = parse_trace_str(text).unwrap();
    assert_eq!(records[0].kind, RawEventKind::Unrecognized(Some("GC_PAUSE".to_string())));
    assert_eq!(records[1].kind, RawEventKind::Unrecognized(None));
    assert_eq!(records[1].timestamp, 3);
}

#[test]
fn test_non_object_record_is_rejected() {
    let result = parse_trace_str("[1, 2]");
    assert!(matches!(result, Err(ParseError::InvalidFormat(_))));
}

#[test]
fn test_read_trace_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"kind":"SCOPE_ALLOC","timestamp":1,"scope":"r1","size":64}}"#).unwrap();

    let records = read_trace(file.path()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].field("size"), Some("64"));
}

#[test]
fn test_read_trace_missing_file() {
    assert!(matches!(
        read_trace("/nonexistent/trace.jsonl"),
        Err(ParseError::IoError(_))
    ));
}

#[test]
fn test_parse_oid_formats() {
    assert_eq!(parse_oid("0x10"), Some(16));
    assert_eq!(parse_oid("0XfF"), Some(255));
    assert_eq!(parse_oid(" 42 "), Some(42));
    assert_eq!(parse_oid("foo"), None);
    assert_eq!(parse_oid(""), None);
}
