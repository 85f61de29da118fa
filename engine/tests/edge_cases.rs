//! Edge case tests for taskmerge-engine
//!
//! These tests cover boundary conditions and unusual inputs, driven through
//! the public API the same way a host application would: bytes in, bytes out.

use taskmerge_engine::{
    Decision, MergeEngine, Record, RecordCodec, RecordCollection, SkipReason,
};

fn parse(text: &str) -> RecordCollection {
    RecordCodec::parse_bytes(text.as_bytes()).collection
}

fn merge_text(base: &str, local: &str, remote: &str) -> String {
    let resolved = MergeEngine::resolve(&parse(base), &parse(local), &parse(remote));
    RecordCodec::format_to_string(&resolved)
}

// ============================================================================
// End-to-end Scenarios
// ============================================================================

#[test]
fn server_side_changes() {
    let base = "Task1|Aaa|\r\nTask2|Bbb|\r\nTask3|Ccc|\r\n";
    let remote = "Task1|Aaa|\r\nTask4|Ddd|\r\nTask3|Ccccccc|\r\n";

    assert_eq!(
        merge_text(base, base, remote),
        "Task1|Aaa|\r\nTask3|Ccccccc|\r\nTask4|Ddd|\r\n"
    );
}

#[test]
fn client_side_changes() {
    let base = "Task1|Aaa|\r\nTask2|Bbb|\r\nTask3|Ccc|\r\n";
    let local = "Task1|Aaa|\r\nTask4|Ddd|\r\nTask3|Ccccccc|\r\n";

    assert_eq!(
        merge_text(base, local, base),
        "Task1|Aaa|\r\nTask3|Ccccccc|\r\nTask4|Ddd|\r\n"
    );
}

#[test]
fn complex_sync() {
    let base = "Task1|Aaa|\r\n\
                Task2|Bbb|\r\n\
                Task3|Ccc|\r\n\
                Task4|Ddd|\r\n";
    let local = "Task1|Aaa|\r\n\
                 Task2|Modified on the client|\r\n\
                 Task3|Modified on the client|\r\n\
                 Task4|Ddd|\r\n\
                 Task5|Created on the client|\r\n\
                 Task6|Created on the client|\r\n";
    let remote = "Task1|Aaa|\r\n\
                  Task2|Modified on the server|\r\n\
                  Task3|Ccc|\r\n\
                  Task4|Modified on the server|\r\n\
                  Task5|Created on the server|\r\n\
                  Task7|Created on the server|\r\n";

    assert_eq!(
        merge_text(base, local, remote),
        "Task1|Aaa|\r\n\
         Task2|Modified on the server|\r\n\
         Task3|Modified on the client|\r\n\
         Task4|Modified on the server|\r\n\
         Task5|Created on the server|\r\n\
         Task6|Created on the client|\r\n\
         Task7|Created on the server|\r\n"
    );
}

#[test]
fn corrupt_line_does_not_block_merge() {
    let base = "Task1|Aaa|\r\n";
    let local = "Task1|Aaa|\r\n#### corrupted ####\r\nTask2|Bbb|\r\n";

    assert_eq!(merge_text(base, local, base), "Task1|Aaa|\r\nTask2|Bbb|\r\n");
}

// ============================================================================
// Empty Inputs
// ============================================================================

#[test]
fn all_inputs_empty() {
    assert_eq!(merge_text("", "", ""), "");
}

#[test]
fn first_sync_with_empty_base() {
    // No common ancestor: everything is a creation
    let local = "Mine|a|\r\nShared|same|\r\nClash|local|\r\n";
    let remote = "Theirs|b|\r\nShared|same|\r\nClash|remote|\r\n";

    let outcome = MergeEngine::resolve_with_report(
        &RecordCollection::new(),
        &parse(local),
        &parse(remote),
    );

    assert_eq!(outcome.resolved.len(), 4);
    assert_eq!(outcome.resolved.get("Clash").unwrap().payload, "remote");
    assert_eq!(
        outcome.report.decision_for("Shared"),
        Some(Decision::IdenticalCreation)
    );
}

#[test]
fn everything_deleted_remotely() {
    let base = "Task1|Aaa|\r\nTask2|Bbb|\r\n";
    let local = "Task1|edited|\r\nTask2|Bbb|\r\nTask3|new|\r\n";

    // Local creation survives, everything that existed in base is gone
    assert_eq!(merge_text(base, local, ""), "Task3|new|\r\n");
}

// ============================================================================
// String Edge Cases
// ============================================================================

#[test]
fn unicode_strings() {
    let names = vec![
        "日本語テスト",
        "Привет мир",
        "مرحبا بالعالم",
        "🎉🚀💯",
        "Ω≈ç√∫",
        "Tab\tinside",
    ];

    let original: RecordCollection = names
        .iter()
        .enumerate()
        .map(|(i, name)| Record::new(format!("task_{}", i), *name))
        .collect();

    let parsed = RecordCodec::parse_bytes(&RecordCodec::format(&original));
    assert!(parsed.is_clean());
    assert_eq!(parsed.collection, original);
}

#[test]
fn very_long_payload() {
    // 1MB payload
    let long = "x".repeat(1024 * 1024);
    let original: RecordCollection = vec![Record::new("big", long.clone())].into_iter().collect();

    let parsed = RecordCodec::parse_bytes(&RecordCodec::format(&original)).collection;
    assert_eq!(parsed.get("big").unwrap().payload.len(), long.len());
}

#[test]
fn many_records() {
    let original: RecordCollection = (0..10_000)
        .map(|i| Record::new(format!("Task{}", i), format!("payload {}", i)))
        .collect();

    let resolved = MergeEngine::resolve(&original, &original, &original);
    assert_eq!(resolved, original);
}

#[test]
fn whitespace_is_significant() {
    let outcome = RecordCodec::parse_bytes(b" Task1 | Aaa |\r\n");
    let record = outcome.collection.get(" Task1 ").unwrap();
    assert_eq!(record.payload, " Aaa ");
}

#[test]
fn whitespace_only_line_is_malformed() {
    let outcome = RecordCodec::parse_bytes(b"   \r\nTask1|Aaa|\r\n");

    assert_eq!(outcome.collection.len(), 1);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].reason, SkipReason::MissingSeparator);
}

#[test]
fn payload_change_only_in_whitespace_is_an_edit() {
    let base = "Task1|Aaa|\r\n";
    let local = "Task1|Aaa |\r\n";

    assert_eq!(merge_text(base, local, base), "Task1|Aaa |\r\n");
}

#[test]
fn invalid_utf8_payload_is_not_a_deletion() {
    let base = b"Task1|Aaa|\r\nTask2|Bbb|\r\n";
    let local = b"Task1|Aaa|\r\nTask2|caf\xe9|\r\n";

    let base = RecordCodec::parse_bytes(base);
    let local = RecordCodec::parse_bytes(local);
    assert_eq!(local.lossy_lines, vec![2]);

    let outcome =
        MergeEngine::resolve_with_report(&base.collection, &local.collection, &base.collection);

    assert_eq!(
        outcome.resolved.get("Task2").unwrap().payload,
        "caf\u{FFFD}"
    );
    assert_eq!(outcome.report.decision_for("Task2"), Some(Decision::LocalEdit));
}

// ============================================================================
// Delimiter Hazard
// ============================================================================

#[test]
fn separator_in_payload_truncates_on_read_back() {
    // The line format has no escaping; a pipe in the payload is lost
    let original: RecordCollection = vec![Record::new("Task1", "left|right")]
        .into_iter()
        .collect();
    assert!(!original.get("Task1").unwrap().is_representable());

    let bytes = RecordCodec::format(&original);
    assert_eq!(bytes, b"Task1|left|right|\r\n".to_vec());

    let parsed = RecordCodec::parse_bytes(&bytes).collection;
    assert_eq!(parsed.get("Task1").unwrap().payload, "left");
}

#[test]
fn separator_in_key_shifts_fields() {
    let original: RecordCollection = vec![Record::new("a|b", "payload")].into_iter().collect();

    let parsed = RecordCodec::parse_bytes(&RecordCodec::format(&original)).collection;

    assert!(!parsed.contains_key("a|b"));
    assert_eq!(parsed.get("a").unwrap().payload, "b");
}

#[test]
fn line_break_in_payload_splits_record() {
    let original: RecordCollection = vec![Record::new("Task1", "first\nsecond")]
        .into_iter()
        .collect();

    let outcome = RecordCodec::parse_bytes(&RecordCodec::format(&original));

    assert_eq!(outcome.collection.get("Task1").unwrap().payload, "first");
    // "second|" still has a separator, so it becomes a record of its own
    assert_eq!(outcome.collection.get("second").unwrap().payload, "");
}

// ============================================================================
// Line Terminators
// ============================================================================

#[test]
fn mixed_line_terminators() {
    let outcome = RecordCodec::parse_bytes(b"Task1|Aaa|\r\nTask2|Bbb|\nTask3|Ccc|\r\n");

    assert!(outcome.is_clean());
    assert_eq!(outcome.collection.len(), 3);
    assert_eq!(outcome.collection.get("Task2").unwrap().payload, "Bbb");
}

#[test]
fn carriage_return_only_input() {
    let outcome = RecordCodec::parse_bytes(b"Task1|Aaa|\rTask2|Bbb|\r");

    assert!(outcome.is_clean());
    assert_eq!(outcome.collection.len(), 2);
    assert_eq!(outcome.collection.get("Task2").unwrap().payload, "Bbb");
}

#[test]
fn carriage_return_only_local_keeps_remote_records() {
    let base = "Task1|Aaa|\r\nTask2|Bbb|\r\n";
    let local = "Task1|Aaa|\rTask2|Bbb|\rTask3|Ccc|\r";

    assert_eq!(
        merge_text(base, local, base),
        "Task1|Aaa|\r\nTask2|Bbb|\r\nTask3|Ccc|\r\n"
    );
}

#[test]
fn output_is_always_crlf() {
    let collection = parse("Task1|Aaa|\nTask2|Bbb|\n");
    let text = RecordCodec::format_to_string(&collection);

    assert_eq!(text, "Task1|Aaa|\r\nTask2|Bbb|\r\n");
    assert_eq!(text.matches("\r\n").count(), 2);
}
