use contour_trace::builder::{build_model, BuilderConfig};
use contour_trace::contour::{ContourStore, Value};
use contour_trace::model::{to_document, ExecutionModel};
use contour_trace::output::{read_document, write_document};
use contour_trace::parser::parse_trace_str;
use contour_trace::schema::SchemaTable;
use pretty_assertions::assert_eq;

const TRACE: &str = r#"
{"kind":"SYSTEM_START","timestamp":0}
{"kind":"THREAD_CREATE","timestamp":1,"newthread":"1"}
{"kind":"SCOPE_ALLOC","timestamp":2,"thread":"1","scope":"heap"}
{"kind":"SCOPE_ENTER","timestamp":3,"thread":"1","scope":"heap"}
{"kind":"OBJECT_NEW","timestamp":4,"thread":"1","type":"Counter","object":"0x10"}
{"kind":"METHOD_CALL","timestamp":5,"thread":"1","signature":"Counter;.inc(int)int","target":"0x10","line":7}
{"kind":"FIELD_WRITE","timestamp":6,"thread":"1","target":"0x10","field":"value","value":"1","line":8}
{"kind":"METHOD_EXIT","timestamp":7,"thread":"1","value":"1"}
{"kind":"SYSTEM_END","timestamp":8}
"#;

#[test]
fn test_built_model_round_trips_through_json() {
    let records = parse_trace_str(TRACE).unwrap();
    let mut store = ContourStore::new();
    let mut schema = SchemaTable::new();
    let mut model = ExecutionModel::new();
    let summary = build_model(&records, &mut store, &mut schema, &mut model, BuilderConfig::default()).unwrap();

    let document = to_document("trace.jsonl", summary.clone(), &store, &schema, model.into_events());
    let out_dir = tempfile::tempdir().unwrap();
    let path = out_dir.path().join("model.json");
    write_document(&document, &path).unwrap();

    let loaded = read_document(&path).unwrap();
    assert_eq!(loaded.summary, summary);
    assert_eq!(loaded.events, document.events);
    assert_eq!(loaded.contours, document.contours);

    let counter = loaded
        .contours
        .iter()
        .find(|c| c.kind == "instance" && c.schema == "Counter")
        .unwrap();
    assert!(!counter.is_virtual);
    assert_eq!(counter.oid, Some(0x10));
    let value = counter.members.iter().find(|m| m.name == "value").unwrap();
    assert_eq!(value.value, Value::Literal("1".to_string()));

    let method = loaded.contours.iter().find(|c| c.kind == "method").unwrap();
    assert_eq!(method.schema, "Counter.inc(int)int");
    assert_eq!(method.parent, Some(counter.id));
}

#[test]
fn test_read_document_rejects_garbage() {
    let out_dir = tempfile::tempdir().unwrap();
    let path = out_dir.path().join("bad.json");
    std::fs::write(&path, "{\"version\": 1}").unwrap();

    assert!(read_document(&path).is_err());
}
