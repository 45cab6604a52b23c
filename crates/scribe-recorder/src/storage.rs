//! Script storage - the live script file, its snapshots and the raw event
//! journal (JSON lines)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use scribe_core::RawEvent;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SCRIPT_EXT: &str = ".spec.ts";
pub const JOURNAL_EXT: &str = ".events.jsonl";

/// First line of a journal file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JournalHeader {
    name: String,
    recorded_at: DateTime<Utc>,
    events: usize,
}

/// Raw events of one recording, in delivery order
#[derive(Debug, Clone)]
pub struct Journal {
    pub name: String,
    pub recorded_at: DateTime<Utc>,
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Clone)]
pub struct ScriptStorage {
    dir: PathBuf,
}

impl ScriptStorage {
    pub fn new() -> Result<Self> {
        let home = std::env::var("HOME").context("HOME not set")?;
        Self::with_dir(PathBuf::from(home).join(".scribe"))
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn script_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", sanitize(name), SCRIPT_EXT))
    }

    /// Snapshot directory next to the script, named the way Playwright
    /// looks for baselines
    pub fn snapshot_dir(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}-snapshots", sanitize(name), SCRIPT_EXT))
    }

    pub fn journal_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", sanitize(name), JOURNAL_EXT))
    }

    /// Replace the script in one step: write a sibling temp file, then rename
    pub fn write_script(&self, path: &Path, text: &str) -> Result<()> {
        let tmp = path.with_extension("ts.tmp");
        fs::write(&tmp, text).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    pub fn save_snapshot(&self, script: &str, snapshot: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.snapshot_dir(script);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.png", sanitize(snapshot)));
        fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// Save the journal as JSON lines (one event per line for streaming)
    pub fn save_journal(&self, name: &str, events: &[RawEvent]) -> Result<PathBuf> {
        let path = self.journal_path(name);
        let file = File::create(&path)?;
        let mut w = BufWriter::new(file);

        let header = JournalHeader {
            name: name.to_string(),
            recorded_at: Utc::now(),
            events: events.len(),
        };
        serde_json::to_writer(&mut w, &header)?;
        writeln!(w)?;

        for e in events {
            serde_json::to_writer(&mut w, &e.without_payload())?;
            writeln!(w)?;
        }

        w.flush()?;
        Ok(path)
    }

    /// Load a journal; relative names resolve against the storage dir
    pub fn load_journal(&self, filename: &str) -> Result<Journal> {
        read_journal(&self.dir.join(filename))
    }

    /// Scripts and journals in the storage dir
    pub fn list(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(s) = name.to_str() {
                if s.ends_with(SCRIPT_EXT) || s.ends_with(JOURNAL_EXT) {
                    files.push(s.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Delete a script or journal; deleting a script also drops its snapshots
    pub fn delete(&self, filename: &str) -> Result<()> {
        let path = self.dir.join(filename);
        fs::remove_file(&path).with_context(|| format!("deleting {}", path.display()))?;
        if let Some(stem) = filename.strip_suffix(SCRIPT_EXT) {
            let snapshots = self.snapshot_dir(stem);
            if snapshots.is_dir() {
                fs::remove_dir_all(snapshots)?;
            }
        }
        Ok(())
    }
}

/// Read a journal file written by `ScriptStorage::save_journal`
pub fn read_journal(path: &Path) -> Result<Journal> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header_line = lines.next().context("Empty file")??;
    let header: JournalHeader =
        serde_json::from_str(&header_line).context("reading journal header")?;

    let mut events = Vec::with_capacity(header.events);
    for (i, line) in lines.enumerate() {
        let line = line?;
        if !line.trim().is_empty() {
            let e: RawEvent =
                serde_json::from_str(&line).with_context(|| format!("line {}", i + 2))?;
            events.push(e);
        }
    }

    Ok(Journal {
        name: header.name,
        recorded_at: header.recorded_at,
        events,
    })
}

pub fn sanitize(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "recorded".to_string()
    } else {
        cleaned
    }
}
