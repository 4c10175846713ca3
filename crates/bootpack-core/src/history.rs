//! Recently used file paths, one ordered list per slot.
//!
//! Lists are most-recent-first. Re-using a path moves it to the front instead
//! of duplicating it, and each list is capped at `max_entries`.
//! The whole history is one JSON file, flushed atomically via temp+rename.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Which field a remembered path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HistorySlot {
    /// Plaintext firmware images fed to `create`
    Input,
    /// Containers produced by `create` (and read by `recover`)
    Output,
    /// Plaintext written by `recover`
    Decrypted,
    /// Raw key files
    KeyFile,
}

impl HistorySlot {
    pub const ALL: [HistorySlot; 4] = [
        HistorySlot::Input,
        HistorySlot::Output,
        HistorySlot::Decrypted,
        HistorySlot::KeyFile,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HistorySlot::Input => "input",
            HistorySlot::Output => "output",
            HistorySlot::Decrypted => "decrypted",
            HistorySlot::KeyFile => "key file",
        }
    }
}

/// Ordered, de-duplicated, bounded list of paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentList {
    items: Vec<PathBuf>,
}

impl RecentList {
    /// Put `path` at the front, removing any earlier occurrence.
    /// Returns true if the list changed.
    pub fn touch(&mut self, path: &Path, max_entries: usize) -> bool {
        if self.items.first().map(PathBuf::as_path) == Some(path) {
            return false;
        }
        self.items.retain(|p| p != path);
        self.items.insert(0, path.to_path_buf());
        self.items.truncate(max_entries);
        true
    }

    pub fn items(&self) -> &[PathBuf] {
        &self.items
    }

    pub fn most_recent(&self) -> Option<&Path> {
        self.items.first().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Persistent history of paths used by the CLI.
pub struct History {
    path: PathBuf,
    max_entries: usize,
    slots: BTreeMap<HistorySlot, RecentList>,
    dirty: bool,
}

impl History {
    /// Load the history at `path`, starting empty if the file does not exist.
    pub fn open(path: &Path, max_entries: usize) -> Result<Self> {
        let slots = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading history: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing history: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(History {
            path: path.to_path_buf(),
            max_entries: max_entries.max(1),
            slots,
            dirty: false,
        })
    }

    pub fn record(&mut self, slot: HistorySlot, used: &Path) {
        let max = self.max_entries;
        if self.slots.entry(slot).or_default().touch(used, max) {
            self.dirty = true;
        }
    }

    pub fn recent(&self, slot: HistorySlot) -> &[PathBuf] {
        self.slots.get(&slot).map(RecentList::items).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        if !self.slots.is_empty() {
            self.slots.clear();
            self.dirty = true;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.values().all(RecentList::is_empty)
    }

    /// Flush dirty changes to disk using an atomic write (write then rename).
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating history dir: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&self.slots).context("serializing history")?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, &json)
            .with_context(|| format!("writing history temp: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("renaming history: {}", self.path.display()))?;

        self.dirty = false;
        tracing::debug!(path = %self.path.display(), "history flushed");
        Ok(())
    }
}
