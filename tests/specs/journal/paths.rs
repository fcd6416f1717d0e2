//! Path safety
//!
//! Unsafe file paths are rejected before any filesystem access.

use crate::prelude::*;
use crate::prelude::assert_eq;

const UNSAFE: [&str; 6] = [
    "",
    "   ",
    "/etc/passwd",
    "../outside.txt",
    "docs/../../outside.txt",
    ".journal/a.txt.log",
];

#[tokio::test]
async fn unsafe_paths_are_invalid_input_for_every_operation() {
    let project = Project::empty();
    let journal = project.journal();

    for file in UNSAFE {
        let errors = [
            journal.append(change(file, "x", "", "x")).await.map(|_| ()),
            journal.materialize(file).await.map(|_| ()),
            journal.rollback(file, 1).await.map(|_| ()),
            journal.exists(file).await.map(|_| ()),
            journal.inspect(file).await.map(|_| ()),
        ];
        for result in errors {
            assert!(
                matches!(result, Err(JournalError::InvalidInput { .. })),
                "{file:?} should be rejected, got {result:?}"
            );
        }
    }

    assert!(project.tree().is_empty());
}

#[tokio::test]
async fn equivalent_spellings_share_one_journal() {
    let project = Project::empty();
    let journal = project.journal();
    journal.append(change("./docs/a.txt", "one", "", "1\n")).await.unwrap();
    let second = journal
        .append(change("docs//a.txt", "two", "1\n", "2\n"))
        .await
        .unwrap();

    assert_eq!(second.seq, 2);
    assert_eq!(second.file, "docs/a.txt");
    assert!(project.log("docs/a.txt").exists());
}

#[test]
fn invalid_journal_dir_is_rejected_at_open() {
    let project = Project::empty();
    for dir in ["/abs", "../up", ".", ""] {
        let result = DiffJournal::open(project.config().with_journal_dir(dir));
        assert!(
            matches!(result, Err(JournalError::InvalidInput { .. })),
            "journal_dir {dir:?} should be rejected"
        );
    }
}
