use std::fs;
use std::path::PathBuf;

use lifecycle_store::{
    encode_record, load_or_default, load_record, save_record, LifecycleRecord,
    LifecycleStoreError,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use time::macros::datetime;

fn write_state_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("lifecycle.json");
    fs::write(&path, contents).expect("state file should be written");
    (dir, path)
}

fn exited_record() -> LifecycleRecord {
    LifecycleRecord {
        last_start: datetime!(2026-02-14 08:30:00.125 UTC),
        last_exit: Some(datetime!(2026-02-14 09:45:12.5 UTC)),
        was_clean_exit: true,
        restart_count: 7,
        last_exit_reason: "CleanExit".to_string(),
    }
}

#[test]
fn default_record_matches_documented_values() {
    let record = LifecycleRecord::default();

    assert_eq!(record.last_start, time::OffsetDateTime::UNIX_EPOCH);
    assert_eq!(record.last_exit, None);
    assert!(!record.was_clean_exit);
    assert_eq!(record.restart_count, 0);
    assert_eq!(record.last_exit_reason, "Unknown");
    assert!(!record.is_open());
}

#[test]
fn saved_record_reloads_with_equal_fields() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("lifecycle.json");

    let record = exited_record();
    save_record(&path, &record).expect("record should save");

    let loaded = load_record(&path).expect("record should load");
    assert_eq!(loaded, record);
}

#[test]
fn running_record_keeps_null_exit_through_save() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("lifecycle.json");

    let record = LifecycleRecord {
        last_start: datetime!(2026-03-01 12:00:00 UTC),
        last_exit: None,
        was_clean_exit: false,
        restart_count: 1,
        last_exit_reason: "Running".to_string(),
    };
    save_record(&path, &record).expect("record should save");

    let loaded = load_record(&path).expect("record should load");
    assert_eq!(loaded, record);
    assert!(loaded.is_open());
}

#[test]
fn encoded_record_is_indented_and_emits_all_fields() {
    let path = PathBuf::from("lifecycle.json");
    let mut record = exited_record();
    record.last_start = datetime!(2026-02-14 08:30:00 UTC);
    record.last_exit = None;

    let text = encode_record(&path, &record).expect("record should encode");
    assert!(text.contains("\n  \"LastStart\""));

    let value: Value = serde_json::from_str(&text).expect("output should be JSON");
    assert_eq!(
        value,
        json!({
            "LastStart": "2026-02-14T08:30:00Z",
            "LastExit": null,
            "WasCleanExit": true,
            "RestartCount": 7,
            "LastExitReason": "CleanExit",
        })
    );
}

#[test]
fn missing_fields_take_default_values() {
    let (_dir, path) = write_state_file(
        &json!({
            "RestartCount": 4,
        })
        .to_string(),
    );

    let record = load_record(&path).expect("partial record should load");
    assert_eq!(record.restart_count, 4);
    assert_eq!(record.last_start, time::OffsetDateTime::UNIX_EPOCH);
    assert_eq!(record.last_exit, None);
    assert!(!record.was_clean_exit);
    assert_eq!(record.last_exit_reason, "Unknown");
}

#[test]
fn offset_timestamps_from_other_writers_are_accepted() {
    let (_dir, path) = write_state_file(
        &json!({
            "LastStart": "2026-02-14T10:00:00.1234567+02:00",
            "LastExit": "2026-02-14T11:00:00+02:00",
            "WasCleanExit": false,
            "RestartCount": 2,
            "LastExitReason": "Crash: boom",
        })
        .to_string(),
    );

    let record = load_record(&path).expect("offset timestamps should parse");
    assert_eq!(
        record.last_exit,
        Some(datetime!(2026-02-14 09:00:00 UTC))
    );
    assert_eq!(record.last_exit_reason, "Crash: boom");
}

#[test]
fn load_record_reports_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("absent.json");

    let error = load_record(&path).expect_err("missing file must fail");
    assert!(error.is_not_found());
}

#[test]
fn load_record_rejects_malformed_json() {
    let (_dir, path) = write_state_file("{ this is not json");

    let error = load_record(&path).expect_err("malformed file must fail");
    assert!(matches!(error, LifecycleStoreError::JsonParse { .. }));
    assert!(!error.is_not_found());
}

#[test]
fn load_record_rejects_null_document() {
    let (_dir, path) = write_state_file("null");

    let error = load_record(&path).expect_err("null document must fail");
    assert!(matches!(error, LifecycleStoreError::NullRecord { .. }));
}

#[test]
fn load_or_default_recovers_from_every_read_failure() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    assert_eq!(
        load_or_default(&dir.path().join("absent.json")),
        LifecycleRecord::default()
    );

    let (_bad, bad_path) = write_state_file("[1, 2, 3]");
    assert_eq!(load_or_default(&bad_path), LifecycleRecord::default());

    let (_null, null_path) = write_state_file("null");
    assert_eq!(load_or_default(&null_path), LifecycleRecord::default());
}

#[test]
fn save_record_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("state").join("nested").join("lifecycle.json");

    save_record(&path, &exited_record()).expect("record should save");
    assert_eq!(
        load_record(&path).expect("record should load"),
        exited_record()
    );
}

#[test]
fn save_record_overwrites_previous_contents() {
    let (_dir, path) = write_state_file(&"x".repeat(4096));

    save_record(&path, &exited_record()).expect("record should save");
    let text = fs::read_to_string(&path).expect("file should be readable");
    assert!(text.starts_with('{'));
    assert!(!text.contains("xxxx"));
}

#[test]
fn save_record_surfaces_write_failures() {
    let dir = tempfile::tempdir().expect("tempdir should be created");

    let error = save_record(dir.path(), &exited_record())
        .expect_err("writing over a directory must fail");
    assert!(matches!(
        error,
        LifecycleStoreError::Io {
            operation: "writing lifecycle file",
            ..
        }
    ));
}
