//! Snapshot Codec Tests
//!
//! These tests verify:
//! - Encode/decode round trip
//! - Rejection of non-flat or non-string documents
//! - Loading missing files and directories
//! - Atomic persist and overwrite

use std::fs;

use kvport::{KvportError, Snapshot};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn sample_snapshot() -> Snapshot {
    let mut snapshot = Snapshot::new();
    snapshot.insert("/app/config/a", "1");
    snapshot.insert("/app/config/b", "2");
    snapshot.insert("/app/name", "kvport \"quoted\" \u{00e9}\n");
    snapshot.insert("/empty", "");
    snapshot
}

fn assert_malformed(input: &str) {
    match Snapshot::decode(input.as_bytes()) {
        Err(KvportError::MalformedSnapshot { .. }) => {}
        other => panic!("Expected MalformedSnapshot for {}, got {:?}", input, other),
    }
}

// =============================================================================
// Encode/Decode Tests
// =============================================================================

#[test]
fn test_round_trip() {
    let snapshot = sample_snapshot();
    let encoded = snapshot.encode().unwrap();
    let decoded = Snapshot::decode(&encoded).unwrap();
    assert_eq!(decoded, snapshot);
}

#[test]
fn test_round_trip_empty() {
    let snapshot = Snapshot::new();
    let encoded = snapshot.encode().unwrap();
    assert_eq!(encoded, b"{}");
    assert_eq!(Snapshot::decode(&encoded).unwrap(), snapshot);
}

#[test]
fn test_decode_example_document() {
    let snapshot = Snapshot::decode(br#"{"/app/config/a": "1", "/app/config/b": "2"}"#).unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get("/app/config/a"), Some("1"));
    assert_eq!(snapshot.get("/app/config/b"), Some("2"));
}

#[test]
fn test_decode_duplicate_key_keeps_last() {
    let snapshot = Snapshot::decode(br#"{"/a": "1", "/a": "2"}"#).unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("/a"), Some("2"));
}

#[test]
fn test_encode_is_flat_json_object() {
    let encoded = sample_snapshot().encode().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 4);
    assert!(object.values().all(|v| v.is_string()));
}

#[test]
fn test_decode_rejects_non_string_value() {
    assert_malformed(r#"{"a": 5}"#);
    assert_malformed(r#"{"a": true}"#);
    assert_malformed(r#"{"a": null}"#);
}

#[test]
fn test_decode_rejects_nested_object() {
    assert_malformed(r#"{"a": {"b": 1}}"#);
    assert_malformed(r#"{"a": ["b"]}"#);
}

#[test]
fn test_decode_rejects_non_object() {
    assert_malformed(r#"["a", "b"]"#);
    assert_malformed(r#""a""#);
    assert_malformed("");
}

#[test]
fn test_decode_rejects_syntax_error() {
    assert_malformed(r#"{"a": "1""#);
    assert_malformed(r#"{a: "1"}"#);
}

// =============================================================================
// File Tests
// =============================================================================

#[test]
fn test_load_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing.json");

    match Snapshot::load(&path) {
        Err(KvportError::SnapshotNotFound { path: p }) => assert_eq!(p, path),
        other => panic!("Expected SnapshotNotFound, got {:?}", other),
    }
}

#[test]
fn test_load_directory_is_not_found() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
        Snapshot::load(temp.path()),
        Err(KvportError::SnapshotNotFound { .. })
    ));
}

#[test]
fn test_load_malformed_names_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.json");
    fs::write(&path, r#"{"a": 5}"#).unwrap();

    match Snapshot::load(&path) {
        Err(KvportError::MalformedSnapshot { path: p, .. }) => assert_eq!(p, path),
        other => panic!("Expected MalformedSnapshot, got {:?}", other),
    }
}

#[test]
fn test_persist_then_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("load.json");

    let snapshot = sample_snapshot();
    let written = snapshot.persist(&path).unwrap();

    assert_eq!(written, fs::canonicalize(&path).unwrap());
    assert_eq!(Snapshot::load(&path).unwrap(), snapshot);
}

#[test]
fn test_persist_overwrites_and_leaves_no_temp_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("load.json");
    fs::write(&path, "previous contents that are much longer than the new snapshot").unwrap();

    let mut snapshot = Snapshot::new();
    snapshot.insert("/k", "v");
    snapshot.persist(&path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"/k":"v"}"#);
    let names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("load.json")]);
}

#[test]
fn test_persist_into_missing_directory_fails() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("no/such/dir/load.json");

    assert!(matches!(sample_snapshot().persist(&path), Err(KvportError::Io(_))));
    assert!(!path.exists());
}
