//! Word-level diffing of text and whole-revision comparison.
//!
//! Text is split into maximal runs of word characters and of non-word
//! characters, so whitespace and punctuation are tokens of their own. The
//! longest common subsequence over those tokens drives the output.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::revision::{Attachment, Revision};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+|\W+").expect("valid regex"));

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// The status of an item in a diff comparison.
///
/// - `Added`     -- present only in the new side.
/// - `Removed`   -- present only in the old side.
/// - `Changed`   -- present on both sides with different values.
/// - `Unchanged` -- present on both sides with identical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Added,
    Removed,
    Changed,
    Unchanged,
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

fn is_false(flag: &bool) -> bool {
    !flag
}

/// One run of the diff output. At most one of `added` / `removed` is set;
/// neither means the run is common to both inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSegment {
    pub value: String,
    /// Number of tokens merged into `value`.
    pub count: usize,
    #[serde(default, skip_serializing_if = "is_false")]
    pub added: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub removed: bool,
}

impl ChangeSegment {
    pub fn common(value: impl Into<String>, count: usize) -> Self {
        Self {
            value: value.into(),
            count,
            added: false,
            removed: false,
        }
    }

    pub fn added(value: impl Into<String>, count: usize) -> Self {
        Self {
            added: true,
            ..Self::common(value, count)
        }
    }

    pub fn removed(value: impl Into<String>, count: usize) -> Self {
        Self {
            removed: true,
            ..Self::common(value, count)
        }
    }

    pub fn is_change(&self) -> bool {
        self.added || self.removed
    }
}

// ---------------------------------------------------------------------------
// Text diff
// ---------------------------------------------------------------------------

/// Split text into maximal word and non-word runs.
pub fn tokenize(text: &str) -> Vec<&str> {
    TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect()
}

#[derive(Debug, Clone, Copy)]
enum Op<'a> {
    Common(&'a str),
    Removed(&'a str),
    Added(&'a str),
}

/// Word-level diff of `old` against `new`.
///
/// Within a block of changes, removed runs precede added runs. Equal inputs
/// produce exactly one common segment covering the whole text.
pub fn diff_text(old: &str, new: &str) -> Vec<ChangeSegment> {
    let a = tokenize(old);
    let b = tokenize(new);

    // Shared prefix and suffix never need the LCS table.
    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut ops = Vec::with_capacity(a.len().max(b.len()));
    ops.extend(a[..prefix].iter().map(|t| Op::Common(*t)));
    lcs_ops(
        &a[prefix..a.len() - suffix],
        &b[prefix..b.len() - suffix],
        &mut ops,
    );
    ops.extend(a[a.len() - suffix..].iter().map(|t| Op::Common(*t)));

    let segments = merge_ops(&ops);
    if segments.is_empty() {
        return vec![ChangeSegment::common(String::new(), 0)];
    }
    segments
}

/// Largest LCS table (in cells) built for the changed middle of a diff.
///
/// Past this, the middle is reported as one removed run followed by one
/// added run. At 4 bytes per cell this bounds the table to 16 MB.
pub const MAX_DIFF_CELLS: usize = 4_000_000;

/// Append the edit script between `a` and `b` to `out`, in document order.
///
/// Walks forward over a suffix-LCS table. When skipping either token keeps
/// an equally long common subsequence, the lexicographically smaller token
/// is skipped, so swapping `a` and `b` selects the same common tokens.
fn lcs_ops<'a>(a: &[&'a str], b: &[&'a str], out: &mut Vec<Op<'a>>) {
    let m = a.len();
    let n = b.len();
    if m == 0 || n == 0 || m.saturating_mul(n) > MAX_DIFF_CELLS {
        out.extend(a.iter().map(|t| Op::Removed(*t)));
        out.extend(b.iter().map(|t| Op::Added(*t)));
        return;
    }

    // lcs[i * width + j] = LCS length of a[i..] and b[j..].
    let width = n + 1;
    let mut lcs = vec![0u32; (m + 1) * width];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            lcs[i * width + j] = if a[i] == b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < m && j < n {
        if a[i] == b[j] {
            out.push(Op::Common(a[i]));
            i += 1;
            j += 1;
            continue;
        }
        let without_old = lcs[(i + 1) * width + j];
        let without_new = lcs[i * width + j + 1];
        if without_old > without_new || (without_old == without_new && a[i] < b[j]) {
            out.push(Op::Removed(a[i]));
            i += 1;
        } else {
            out.push(Op::Added(b[j]));
            j += 1;
        }
    }
    out.extend(a[i..].iter().map(|t| Op::Removed(*t)));
    out.extend(b[j..].iter().map(|t| Op::Added(*t)));
}

#[derive(Default)]
struct Run {
    value: String,
    count: usize,
}

impl Run {
    fn push(&mut self, token: &str) {
        self.value.push_str(token);
        self.count += 1;
    }

    fn take(&mut self) -> Option<(String, usize)> {
        if self.count == 0 {
            return None;
        }
        let count = std::mem::take(&mut self.count);
        Some((std::mem::take(&mut self.value), count))
    }
}

/// Merge single-token ops into segments.
fn merge_ops(ops: &[Op<'_>]) -> Vec<ChangeSegment> {
    let mut segments = Vec::new();
    let mut common = Run::default();
    let mut removed = Run::default();
    let mut added = Run::default();

    let flush_changes = |segments: &mut Vec<ChangeSegment>, removed: &mut Run, added: &mut Run| {
        if let Some((value, count)) = removed.take() {
            segments.push(ChangeSegment::removed(value, count));
        }
        if let Some((value, count)) = added.take() {
            segments.push(ChangeSegment::added(value, count));
        }
    };

    for op in ops {
        match *op {
            Op::Common(token) => {
                flush_changes(&mut segments, &mut removed, &mut added);
                common.push(token);
            }
            Op::Removed(token) => {
                if let Some((value, count)) = common.take() {
                    segments.push(ChangeSegment::common(value, count));
                }
                removed.push(token);
            }
            Op::Added(token) => {
                if let Some((value, count)) = common.take() {
                    segments.push(ChangeSegment::common(value, count));
                }
                added.push(token);
            }
        }
    }

    if let Some((value, count)) = common.take() {
        segments.push(ChangeSegment::common(value, count));
    }
    flush_changes(&mut segments, &mut removed, &mut added);
    segments
}

/// Diff two values treated as single opaque tokens.
pub fn diff_value(old: &str, new: &str) -> Vec<ChangeSegment> {
    if old == new {
        vec![ChangeSegment::common(old, 1)]
    } else {
        vec![ChangeSegment::removed(old, 1), ChangeSegment::added(new, 1)]
    }
}

// ---------------------------------------------------------------------------
// Revision diff
// ---------------------------------------------------------------------------

/// Raw attachment on each side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentDiff {
    pub before: Option<Attachment>,
    pub after: Option<Attachment>,
}

impl AttachmentDiff {
    pub fn status(&self) -> DiffStatus {
        match (&self.before, &self.after) {
            (None, None) => DiffStatus::Unchanged,
            (None, Some(_)) => DiffStatus::Added,
            (Some(_), None) => DiffStatus::Removed,
            (Some(a), Some(b)) if a == b => DiffStatus::Unchanged,
            (Some(_), Some(_)) => DiffStatus::Changed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentDiff {
    pub title: Vec<ChangeSegment>,
    pub path: Vec<ChangeSegment>,
    pub body: Vec<ChangeSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionDiff {
    pub read: Vec<ChangeSegment>,
    pub write: Vec<ChangeSegment>,
}

/// Structured comparison of two revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionDiff {
    pub content: ContentDiff,
    pub permissions: PermissionDiff,
    pub file: AttachmentDiff,
    pub thumbnail: AttachmentDiff,
}

impl RevisionDiff {
    /// `true` when no field differs between the two revisions.
    pub fn is_unchanged(&self) -> bool {
        let segments = [
            &self.content.title,
            &self.content.path,
            &self.content.body,
            &self.permissions.read,
            &self.permissions.write,
        ];
        segments.iter().all(|s| s.iter().all(|seg| !seg.is_change()))
            && self.file.status() == DiffStatus::Unchanged
            && self.thumbnail.status() == DiffStatus::Unchanged
    }
}

/// Compare revision `a` (before) with revision `b` (after).
///
/// A missing path diffs as the empty string. Attachments are reported as-is
/// from each side; `file` and `thumbnail` are compared independently.
pub fn diff_revisions(a: &Revision, b: &Revision) -> RevisionDiff {
    let (ca, cb) = (a.content(), b.content());
    let (pa, pb) = (a.permissions(), b.permissions());

    RevisionDiff {
        content: ContentDiff {
            title: diff_text(&ca.title, &cb.title),
            path: diff_text(
                ca.path.as_deref().unwrap_or_default(),
                cb.path.as_deref().unwrap_or_default(),
            ),
            body: diff_text(&ca.body, &cb.body),
        },
        permissions: PermissionDiff {
            read: diff_value(pa.read.as_str(), pb.read.as_str()),
            write: diff_value(pa.write.as_str(), pb.write.as_str()),
        },
        file: AttachmentDiff {
            before: a.file().cloned(),
            after: b.file().cloned(),
        },
        thumbnail: AttachmentDiff {
            before: a.thumbnail().cloned(),
            after: b.thumbnail().cloned(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
