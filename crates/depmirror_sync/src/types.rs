use serde::Serialize;
use std::{fmt, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// No copy existed in the output folder
    New,
    /// The copy was older than the source and has been rewritten
    Changed,
    /// The copy is up to date; nothing was read or written
    Skipped,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::New => "new",
            SyncState::Changed => "changed",
            SyncState::Skipped => "skipped",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of mirroring one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncRecord {
    /// Path relative to both the input and the output folder
    pub path: PathBuf,
    pub state: SyncState,
}

impl SyncRecord {
    pub fn new(path: impl Into<PathBuf>, state: SyncState) -> Self {
        Self { path: path.into(), state }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub new: usize,
    pub changed: usize,
    pub skipped: usize,
}

impl SyncSummary {
    pub fn from_records(records: &[SyncRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            match r.state {
                SyncState::New => acc.new += 1,
                SyncState::Changed => acc.changed += 1,
                SyncState::Skipped => acc.skipped += 1,
            }
            acc
        })
    }

    /// Files that were written during the run.
    pub fn written(&self) -> usize {
        self.new + self.changed
    }
}
