//! Append serialization
//!
//! Concurrent appends to one file must produce a contiguous journal.

use crate::prelude::*;
use crate::prelude::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn concurrent_appends_produce_contiguous_seqs() {
    let project = Project::empty();
    let config = project
        .config()
        .with_lock_retry(RetryPolicy::new(500, Duration::from_millis(2)));
    let journal = Arc::new(DiffJournal::open(config).unwrap());

    let mut tasks = Vec::new();
    for i in 0..10 {
        let journal = Arc::clone(&journal);
        tasks.push(tokio::spawn(async move {
            journal
                .append(change("shared.txt", &format!("writer {i}"), "", "x\n"))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let seqs: Vec<i64> = journal
        .history("shared.txt")
        .await
        .unwrap()
        .iter()
        .map(|e| e.seq)
        .collect();
    assert_eq!(seqs, (1..=10).collect::<Vec<i64>>());
    assert!(!project.path(".journal/shared.txt.log.lock").exists());
}

#[tokio::test]
async fn separate_handles_share_one_sequence() {
    let project = Project::empty();
    let a = project.journal();
    let b = project.journal();

    let (first, second) = tokio::join!(
        a.append(change("f.txt", "from a", "", "a\n")),
        b.append(change("f.txt", "from b", "", "b\n")),
    );

    let mut seqs = vec![first.unwrap().seq, second.unwrap().seq];
    seqs.sort_unstable();
    assert_eq!(seqs, vec![1, 2]);
}

#[tokio::test]
async fn stale_lock_makes_append_fail_after_retries() {
    let project = Project::empty();
    let journal = project.journal();
    project.write(".journal/f.txt.log.lock", "");

    let err = journal
        .append(change("f.txt", "blocked", "", "x\n"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.corruption(),
        Some(Corruption::LockBusy { attempts: 5, .. })
    ));
    assert!(!project.log("f.txt").exists());
    // Someone else's marker is never removed
    assert!(project.path(".journal/f.txt.log.lock").exists());
}

#[tokio::test]
async fn readers_refuse_while_append_marker_present() {
    let project = Project::empty();
    let journal = project.journal();
    journal.append(change("f.txt", "init", "", "x\n")).await.unwrap();
    project.write(".journal/f.txt.log.lock", "");

    for err in [
        journal.materialize("f.txt").await.unwrap_err(),
        journal.rollback("f.txt", 1).await.unwrap_err(),
    ] {
        assert!(matches!(
            err.corruption(),
            Some(Corruption::AppendInProgress { .. })
        ));
    }

    // Diagnostics never look at the lock
    assert!(journal.exists("f.txt").await.unwrap());
    assert_eq!(journal.inspect("f.txt").await.unwrap().count, 1);
}

#[tokio::test]
async fn stale_sequence_cache_is_ignored() {
    let project = Project::empty();
    let journal = project.journal();
    journal.append(change("f.txt", "one", "", "1\n")).await.unwrap();
    journal.append(change("f.txt", "two", "1\n", "2\n")).await.unwrap();
    project.write(".journal/f.txt.log.seq", "not a number");

    let third = journal.append(change("f.txt", "three", "2\n", "3\n")).await.unwrap();
    assert_eq!(third.seq, 3);
    assert_eq!(project.read(".journal/f.txt.log.seq"), "3\n");
}
