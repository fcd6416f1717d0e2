//! Replay correctness and corruption detection
//!
//! Verify reconstruction at every seq and that damaged journals are
//! refused instead of half-applied.

use crate::prelude::*;
use crate::prelude::assert_eq;

const VERSIONS: [&str; 4] = [
    "alpha\n",
    "alpha\nbeta\n",
    "alpha\nBETA\ngamma\n",
    "gamma\n",
];

async fn record_versions(project: &Project) -> DiffJournal {
    let journal = project.journal();
    let mut before = "";
    for (i, after) in VERSIONS.iter().enumerate() {
        journal
            .append(change("v.txt", &format!("v{}", i + 1), before, after))
            .await
            .unwrap();
        before = after;
    }
    journal
}

#[tokio::test]
async fn materialize_reproduces_last_recorded_content() {
    let project = Project::empty();
    let journal = record_versions(&project).await;

    let outcome = journal.materialize("v.txt").await.unwrap();
    assert_eq!(outcome.seq, 4);
    assert_eq!(project.read("v.txt"), VERSIONS[3]);
}

#[tokio::test]
async fn rollback_reproduces_every_intermediate_version() {
    let project = Project::empty();
    let journal = record_versions(&project).await;

    for (seq, expected) in (1u64..).zip(VERSIONS) {
        let outcome = journal.rollback("v.txt", seq).await.unwrap();
        assert_eq!(outcome.seq, seq);
        assert_eq!(project.read("v.txt"), expected);
    }
}

#[tokio::test]
async fn empty_content_round_trips() {
    let project = Project::empty();
    let journal = project.journal();
    journal.append(change("e.txt", "fill", "", "x\n")).await.unwrap();
    journal.append(change("e.txt", "clear", "x\n", "")).await.unwrap();

    journal.materialize("e.txt").await.unwrap();
    assert_eq!(project.read("e.txt"), "");
}

#[tokio::test]
async fn rollback_past_last_seq_is_refused() {
    let project = Project::empty();
    let journal = record_versions(&project).await;
    project.write("v.txt", "untouched\n");

    let err = journal.rollback("v.txt", 9).await.unwrap_err();
    assert_eq!(
        err.corruption(),
        Some(&Corruption::MissingSeq {
            requested: 9,
            last: 4
        })
    );
    assert_eq!(project.read("v.txt"), "untouched\n");
}

#[tokio::test]
async fn seq_gap_is_refused() {
    let project = Project::empty();
    let journal = record_versions(&project).await;
    project.edit_log("v.txt", |entry| {
        if entry.seq >= 2 {
            entry.seq += 1;
        }
    });

    let err = journal.materialize("v.txt").await.unwrap_err();
    assert_eq!(
        err.corruption(),
        Some(&Corruption::SeqGap {
            expected: 2,
            found: 3
        })
    );
    assert!(!project.path("v.txt").exists());
}

#[tokio::test]
async fn duplicate_seq_is_refused() {
    let project = Project::empty();
    let journal = record_versions(&project).await;
    project.edit_log("v.txt", |entry| {
        if entry.seq == 3 {
            entry.seq = 2;
        }
    });

    let err = journal.rollback("v.txt", 2).await.unwrap_err();
    assert_eq!(err.corruption(), Some(&Corruption::DuplicateSeq { seq: 2 }));
}

#[tokio::test]
async fn out_of_order_records_still_replay() {
    let project = Project::empty();
    let journal = record_versions(&project).await;
    let log = project.log("v.txt");
    let text = std::fs::read_to_string(&log).unwrap();
    let mut lines: Vec<&str> = text.lines().collect();
    lines.reverse();
    std::fs::write(&log, lines.join("\n") + "\n").unwrap();

    journal.materialize("v.txt").await.unwrap();
    assert_eq!(project.read("v.txt"), VERSIONS[3]);
}

#[tokio::test]
async fn malformed_record_is_refused() {
    let project = Project::empty();
    let journal = record_versions(&project).await;
    let log = project.log("v.txt");
    let mut text = std::fs::read_to_string(&log).unwrap();
    text.push_str("{\"seq\":5}\n");
    std::fs::write(&log, text).unwrap();

    let err = journal.materialize("v.txt").await.unwrap_err();
    assert!(matches!(
        err.corruption(),
        Some(Corruption::MalformedRecord { line: 5, .. })
    ));

    // Inspect stays tolerant of the same damage
    assert_eq!(journal.inspect("v.txt").await.unwrap().max_seq, Some(5));
}

#[tokio::test]
async fn strict_replay_detects_tampered_base_hash() {
    let project = Project::empty();
    record_versions(&project).await;
    project.edit_log("v.txt", |entry| {
        if entry.seq == 3 {
            entry.base_hash = content_hash("something else");
        }
    });

    let err = project.strict_journal().materialize("v.txt").await.unwrap_err();
    match err {
        JournalError::StrictReplayMismatch {
            seq,
            expected,
            actual,
            ..
        } => {
            assert_eq!(seq, 3);
            assert_eq!(expected, content_hash("something else"));
            assert_eq!(actual, content_hash(VERSIONS[1]));
        }
        other => panic!("expected strict mismatch, got {other:?}"),
    }
    assert!(!project.path("v.txt").exists());

    // Without strict replay the tampered hash goes unnoticed
    project.journal().materialize("v.txt").await.unwrap();
    assert_eq!(project.read("v.txt"), VERSIONS[3]);
}

#[tokio::test]
async fn unappliable_diff_is_refused() {
    let project = Project::empty();
    let journal = record_versions(&project).await;
    let foreign = UnifiedDiff.diff("zzz\nyyy\n", "zzz\nxxx\n");
    project.edit_log("v.txt", |entry| {
        if entry.seq == 2 {
            entry.diff = foreign.clone();
        }
    });

    let err = journal.materialize("v.txt").await.unwrap_err();
    assert!(matches!(err, JournalError::PatchApplication { seq: 2, .. }));
    assert!(!project.path("v.txt").exists());
}
