use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::NavError;
use crate::url::NavigationHistory;
use crate::url::SessionPersistence;
use crate::url::UrlFragment;

const COMPACT_AFTER: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersistedNavEvent {
    Pushed { fragment: UrlFragment },
    Traversed { cursor: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedNavRecord {
    pub seq: u64,
    pub ts_ms: i64,
    #[serde(flatten)]
    pub event: PersistedNavEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayedHistory {
    pub entries: Vec<UrlFragment>,
    pub cursor: usize,
}

impl ReplayedHistory {
    pub fn current(&self) -> Option<&UrlFragment> {
        self.entries.get(self.cursor)
    }
}

/// Append-only JSONL log of history pushes and traversals. Replaying it
/// rebuilds the history stack, so a new process resumes where the last one
/// stopped.
#[derive(Debug)]
pub struct HistoryLog {
    path: PathBuf,
    next_seq: u64,
    history: ReplayedHistory,
}

impl HistoryLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, NavError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let existing = load_records(path.as_path())?;
        let mut next_seq = existing
            .iter()
            .map(|record| record.seq)
            .max()
            .map_or(1, |seq| seq.saturating_add(1));
        let history = replay_history(&existing);
        if existing.len() > COMPACT_AFTER {
            next_seq = compact(path.as_path(), &history)?;
            tracing::info!(
                records = existing.len(),
                entries = history.entries.len(),
                "compacted history log"
            );
        }
        Ok(Self {
            path,
            next_seq,
            history,
        })
    }

    pub fn history(&self) -> &ReplayedHistory {
        &self.history
    }

    pub fn load(&self) -> Result<Vec<PersistedNavRecord>, NavError> {
        load_records(self.path.as_path())
    }

    fn append(&mut self, event: PersistedNavEvent) -> Result<u64, NavError> {
        let seq = self.next_seq;
        let record = PersistedNavRecord {
            seq,
            ts_ms: chrono::Utc::now().timestamp_millis(),
            event,
        };
        let line = serde_json::to_string(&record)
            .map_err(|err| NavError::Persistence(format!("serialize: {err}")))?;
        append_line(self.path.as_path(), line.as_str())?;
        self.next_seq = self.next_seq.saturating_add(1);
        apply_event(&mut self.history, &record.event);
        Ok(seq)
    }

    fn traverse(&mut self, cursor: usize) -> Result<Option<UrlFragment>, NavError> {
        self.append(PersistedNavEvent::Traversed { cursor })?;
        Ok(self.history.current().cloned())
    }
}

impl SessionPersistence for HistoryLog {
    fn persist(&mut self, fragment: &UrlFragment) -> Result<(), NavError> {
        if self.history.current() == Some(fragment) {
            return Ok(());
        }
        self.append(PersistedNavEvent::Pushed {
            fragment: fragment.clone(),
        })?;
        Ok(())
    }

    fn resume(&self) -> Result<Option<UrlFragment>, NavError> {
        Ok(self.history.current().cloned())
    }
}

impl NavigationHistory for HistoryLog {
    fn back(&mut self) -> Result<Option<UrlFragment>, NavError> {
        if self.history.entries.is_empty() || self.history.cursor == 0 {
            return Ok(None);
        }
        self.traverse(self.history.cursor - 1)
    }

    fn forward(&mut self) -> Result<Option<UrlFragment>, NavError> {
        if self.history.cursor + 1 >= self.history.entries.len() {
            return Ok(None);
        }
        self.traverse(self.history.cursor + 1)
    }
}

pub fn replay_history(records: &[PersistedNavRecord]) -> ReplayedHistory {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|record| record.seq);

    let mut history = ReplayedHistory::default();
    for record in &sorted {
        apply_event(&mut history, &record.event);
    }
    history
}

fn apply_event(history: &mut ReplayedHistory, event: &PersistedNavEvent) {
    match event {
        PersistedNavEvent::Pushed { fragment } => {
            if !history.entries.is_empty() {
                history.entries.truncate(history.cursor + 1);
            }
            history.entries.push(fragment.clone());
            history.cursor = history.entries.len() - 1;
        }
        PersistedNavEvent::Traversed { cursor } => {
            if *cursor < history.entries.len() {
                history.cursor = *cursor;
            }
        }
    }
}

/// Rewrites the log as one push per live entry plus the traversal that puts
/// the cursor back, and returns the next free sequence number.
fn compact(path: &Path, history: &ReplayedHistory) -> Result<u64, NavError> {
    let mut events: Vec<PersistedNavEvent> = history
        .entries
        .iter()
        .map(|fragment| PersistedNavEvent::Pushed {
            fragment: fragment.clone(),
        })
        .collect();
    if history.cursor + 1 < history.entries.len() {
        events.push(PersistedNavEvent::Traversed {
            cursor: history.cursor,
        });
    }

    let next_seq = events.len() as u64 + 1;
    let ts_ms = chrono::Utc::now().timestamp_millis();
    let mut body = String::new();
    for (seq, event) in (1..).zip(events) {
        let record = PersistedNavRecord { seq, ts_ms, event };
        let line = serde_json::to_string(&record)
            .map_err(|err| NavError::Persistence(format!("serialize: {err}")))?;
        body.push_str(&line);
        body.push('\n');
    }

    let tmp = path.with_extension("jsonl.tmp");
    let mut opts = OpenOptions::new();
    opts.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(&tmp)?;
    file.write_all(body.as_bytes())?;
    file.sync_all()?;
    std::fs::rename(&tmp, path)?;
    Ok(next_seq)
}

fn load_records(path: &Path) -> Result<Vec<PersistedNavRecord>, NavError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<PersistedNavRecord>(&line) {
            Ok(record) => records.push(record),
            Err(err) => tracing::warn!(%err, "skipping unreadable history record"),
        }
    }
    Ok(records)
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.flush()?;
    Ok(())
}
