//! The page aggregate: an append-only, newest-first revision history.
//!
//! Revisions are stored newest first (`revisions[0]` is current) but
//! addressed chronologically from 1 (the oldest). The mapping is a pure
//! index transform, `index = len - n`; the stored sequence is never reversed.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::revision::{EditorRef, Revision};
use crate::types::{DbId, Timestamp};

/// A wiki page and its full revision history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<DbId>,
    revisions: Vec<Revision>,
    created: Timestamp,
    updated: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trashed: Option<Timestamp>,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    /// An empty, unsaved page. Only valid transiently, before its first revision.
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        Self {
            id: None,
            revisions: Vec::new(),
            created: now,
            updated: now,
            trashed: None,
        }
    }

    /// A new page whose history starts with `revision`.
    pub fn with_initial(revision: Revision) -> Self {
        let mut page = Self::new();
        page.add_revision(revision);
        page
    }

    pub fn id(&self) -> Option<DbId> {
        self.id
    }

    /// Record the identifier assigned by storage on first save.
    pub fn set_id(&mut self, id: DbId) {
        self.id = Some(id);
    }

    pub fn revision_count(&self) -> usize {
        self.revisions.len()
    }

    pub fn created(&self) -> Timestamp {
        self.created
    }

    pub fn updated(&self) -> Timestamp {
        self.updated
    }

    pub fn trashed(&self) -> Option<Timestamp> {
        self.trashed
    }

    pub fn is_trashed(&self) -> bool {
        self.trashed.is_some()
    }

    /// The newest revision, or `None` for a page with no history yet.
    pub fn current(&self) -> Option<&Revision> {
        self.revisions.first()
    }

    /// Title of the current revision.
    pub fn title(&self) -> Option<&str> {
        self.current().map(|r| r.content().title.as_str())
    }

    /// Canonical path of the current revision (generated from the title when
    /// the revision carries no explicit path).
    pub fn canonical_path(&self) -> Option<String> {
        self.current().map(|r| r.content().canonical_path())
    }

    /// Storage index of chronological revision number `n` (1 = oldest).
    fn storage_index(&self, n: i64) -> Option<usize> {
        let len = self.revisions.len();
        let n = usize::try_from(n).ok()?;
        if n == 0 || n > len {
            return None;
        }
        Some(len - n)
    }

    /// The `n`-th oldest revision, or `None` outside `[1, revision_count]`.
    pub fn revision_by_number(&self, n: i64) -> Option<&Revision> {
        self.storage_index(n).map(|i| &self.revisions[i])
    }

    /// Revisions oldest first, paired with their chronological numbers.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = (usize, &Revision)> + '_ {
        self.revisions
            .iter()
            .rev()
            .enumerate()
            .map(|(i, revision)| (i + 1, revision))
    }

    /// Append `revision` as the new current revision.
    ///
    /// Callers must have authorized the write already.
    pub fn add_revision(&mut self, revision: Revision) {
        self.updated = revision.timestamp();
        self.revisions.insert(0, revision);
    }

    /// Append a copy of revision `n` as the new current revision.
    ///
    /// Content, permissions, and attachments are copied; the editor, the
    /// timestamp (now), and the message are replaced. Returns `false` without
    /// touching the page when `n` is out of range.
    pub fn rollback(&mut self, n: i64, editor: Option<EditorRef>) -> bool {
        let Some(target) = self.revision_by_number(n) else {
            return false;
        };

        let restored = Revision::new(target.content().clone())
            .with_permissions(*target.permissions())
            .with_file(target.file().cloned())
            .with_thumbnail(target.thumbnail().cloned())
            .with_editor(editor)
            .with_msg(rollback_message(n, target.msg()));

        self.add_revision(restored);
        true
    }

    /// Stamp the page as trashed. Returns `false` if it already was.
    pub fn trash(&mut self) -> bool {
        if self.trashed.is_some() {
            return false;
        }
        self.trashed = Some(chrono::Utc::now());
        true
    }

    /// Clear the trash stamp. Returns `false` if the page was not trashed.
    pub fn restore(&mut self) -> bool {
        self.trashed.take().is_some()
    }
}

/// Message recorded on a rollback revision.
pub fn rollback_message(n: i64, target_msg: &str) -> String {
    if target_msg.is_empty() {
        format!("Rolling back to revision #{n}")
    } else {
        format!("Rolling back to revision #{n}: {target_msg}")
    }
}

/// Parse a caller-supplied revision number against a history of `len` revisions.
///
/// Non-numeric and out-of-range input are both reported with the valid range.
pub fn parse_revision_number(raw: &str, len: usize) -> Result<i64, CoreError> {
    let out_of_range = || {
        CoreError::Validation(format!(
            "Revision number must be an integer between 1 and {len}, got '{raw}'"
        ))
    };

    let n: i64 = raw.trim().parse().map_err(|_| out_of_range())?;
    if n < 1 || n as u64 > len as u64 {
        return Err(out_of_range());
    }
    Ok(n)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
