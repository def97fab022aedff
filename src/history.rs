//! Session-scoped edit history.

use crate::edit::EncodedImage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// Identifier of a history entry, unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Generates a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A completed edit. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    id: EntryId,
    original_image: Arc<EncodedImage>,
    edited_image: Arc<EncodedImage>,
    prompt: String,
    created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Records an edit that just completed.
    pub fn new(
        original_image: Arc<EncodedImage>,
        edited_image: Arc<EncodedImage>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            original_image,
            edited_image,
            prompt: prompt.into(),
            created_at: Utc::now(),
        }
    }

    /// Session-unique identifier.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// The image the edit started from.
    pub fn original_image(&self) -> &Arc<EncodedImage> {
        &self.original_image
    }

    /// The image the editor returned.
    pub fn edited_image(&self) -> &Arc<EncodedImage> {
        &self.edited_image
    }

    /// The instruction that produced this edit.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// When the edit completed.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Append-only list of edits, newest first.
///
/// Entries are shared behind `Arc`, so cloning the store for observers copies
/// pointers only.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    entries: VecDeque<Arc<HistoryEntry>>,
}

impl SessionHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry` at the front.
    pub fn append(&mut self, entry: HistoryEntry) -> Arc<HistoryEntry> {
        let entry = Arc::new(entry);
        self.entries.push_front(Arc::clone(&entry));
        entry
    }

    /// Iterates entries from newest to oldest.
    pub fn list(&self) -> impl ExactSizeIterator<Item = &Arc<HistoryEntry>> + '_ {
        self.entries.iter()
    }

    /// Looks an entry up by id.
    pub fn find_by_id(&self, id: EntryId) -> Option<&Arc<HistoryEntry>> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Returns the entry at `index`, where 0 is the newest.
    pub fn get(&self, index: usize) -> Option<&Arc<HistoryEntry>> {
        self.entries.get(index)
    }

    /// Number of recorded edits.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no edit has completed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
