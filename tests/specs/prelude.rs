//! Shared helpers for journal specs

pub use dj_core::{
    content_hash, Change, Corruption, JournalConfig, JournalEntry, JournalError, PatchCodec,
    RetryPolicy, UnifiedDiff,
};
pub use dj_storage::{DiffJournal, JournalSummary};
pub use similar_asserts::assert_eq;

use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// A scratch working directory with a journal rooted in it
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Default configuration with a short lock retry so busy-lock specs stay fast
    pub fn config(&self) -> JournalConfig {
        JournalConfig::new(self.root())
            .with_lock_retry(RetryPolicy::new(5, Duration::from_millis(5)))
    }

    pub fn journal(&self) -> DiffJournal {
        DiffJournal::open(self.config()).unwrap()
    }

    pub fn strict_journal(&self) -> DiffJournal {
        DiffJournal::open(self.config().with_strict_replay(true)).unwrap()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).unwrap()
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn log(&self, file: &str) -> PathBuf {
        self.path(&format!(".journal/{file}.log"))
    }

    /// Rewrite every record of a journal in place
    pub fn edit_log(&self, file: &str, mut edit: impl FnMut(&mut JournalEntry)) {
        let path = self.log(file);
        let text = std::fs::read_to_string(&path).unwrap();
        let mut out = String::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let mut entry = JournalEntry::from_line(line).unwrap();
            edit(&mut entry);
            out.push_str(&entry.to_line().unwrap());
            out.push('\n');
        }
        std::fs::write(path, out).unwrap();
    }

    /// Every file under the root, relative and sorted
    pub fn tree(&self) -> Vec<String> {
        fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(root, &path, out);
                } else {
                    let rel = path.strip_prefix(root).unwrap();
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        let mut out = Vec::new();
        walk(self.root(), self.root(), &mut out);
        out.sort();
        out
    }
}

pub fn change(file: &str, intent: &str, before: &str, after: &str) -> Change {
    Change::new(file, "spec", intent, before, after)
}
