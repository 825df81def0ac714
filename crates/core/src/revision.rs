//! Immutable revision snapshots and the references they carry.
//!
//! A [`Revision`] never changes after construction: fields are private, read
//! through accessors, and every `with_*` builder consumes the value and
//! returns a new one.

use serde::{Deserialize, Serialize};

use crate::content::ContentUnit;
use crate::error::CoreError;
use crate::permissions::{PermissionLevel, PermissionRule};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// Reference to an uploaded file held by the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub location: String,
    pub key: String,
    pub mime: String,
    pub size: u64,
}

/// Public rendering of an [`Attachment`] with a human-readable size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentView {
    pub location: String,
    pub key: String,
    pub mime: String,
    pub size: u64,
    pub size_display: String,
}

impl Attachment {
    pub fn view(&self) -> AttachmentView {
        AttachmentView {
            location: self.location.clone(),
            key: self.key.clone(),
            mime: self.mime.clone(),
            size: self.size,
            size_display: human_size(self.size),
        }
    }
}

/// Render a byte count with decimal units (`bytes`, `kB`, `MB`, `GB`).
pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1e3;
    const MB: f64 = 1e6;
    const GB: f64 = 1e9;

    let n = bytes as f64;
    if n < KB {
        format!("{bytes} bytes")
    } else if n < MB {
        format!("{:.1} kB", n / KB)
    } else if n < GB {
        format!("{:.1} MB", n / MB)
    } else {
        format!("{:.1} GB", n / GB)
    }
}

// ---------------------------------------------------------------------------
// Editor references
// ---------------------------------------------------------------------------

/// Denormalized copy of the editing user at the time of the edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub id: DbId,
    pub name: String,
}

/// Who made a revision: either a bare user id or a snapshot of the user.
///
/// The engine never resolves ids; both forms are identity-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EditorRef {
    Id(DbId),
    Snapshot(EditorSnapshot),
}

impl EditorRef {
    pub fn id(&self) -> DbId {
        match self {
            Self::Id(id) => *id,
            Self::Snapshot(snapshot) => snapshot.id,
        }
    }
}

// ---------------------------------------------------------------------------
// Revision
// ---------------------------------------------------------------------------

/// One immutable snapshot of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    content: ContentUnit,
    #[serde(default)]
    permissions: PermissionRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thumbnail: Option<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    editor: Option<EditorRef>,
    #[serde(default)]
    msg: String,
    #[serde(default = "chrono::Utc::now")]
    timestamp: Timestamp,
}

impl Revision {
    /// A revision with default permissions, no attachments, no editor, an
    /// empty message, and the current time as its timestamp.
    pub fn new(content: ContentUnit) -> Self {
        Self {
            content,
            permissions: PermissionRule::default(),
            file: None,
            thumbnail: None,
            editor: None,
            msg: String::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_permissions(mut self, permissions: PermissionRule) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_file(mut self, file: Option<Attachment>) -> Self {
        self.file = file;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Option<Attachment>) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    pub fn with_editor(mut self, editor: Option<EditorRef>) -> Self {
        self.editor = editor;
        self
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = msg.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn content(&self) -> &ContentUnit {
        &self.content
    }

    pub fn permissions(&self) -> &PermissionRule {
        &self.permissions
    }

    pub fn file(&self) -> Option<&Attachment> {
        self.file.as_ref()
    }

    pub fn thumbnail(&self) -> Option<&Attachment> {
        self.thumbnail.as_ref()
    }

    pub fn editor(&self) -> Option<&EditorRef> {
        self.editor.as_ref()
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

// ---------------------------------------------------------------------------
// Input DTO
// ---------------------------------------------------------------------------

/// Client-supplied fields for a new revision.
///
/// Omitted permission levels default to `anyone`; the editor and timestamp
/// are never taken from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct RevisionInput {
    pub title: String,
    pub path: Option<String>,
    #[serde(default)]
    pub body: String,
    pub read: Option<PermissionLevel>,
    pub write: Option<PermissionLevel>,
    pub file: Option<Attachment>,
    pub thumbnail: Option<Attachment>,
    #[serde(default)]
    pub msg: String,
}

impl RevisionInput {
    /// Validate the content and build the revision.
    pub fn into_revision(self, editor: Option<EditorRef>) -> Result<Revision, CoreError> {
        let content = ContentUnit {
            title: self.title,
            path: self.path,
            body: self.body,
        };
        content.validate()?;

        let permissions = PermissionRule::new(
            self.read.unwrap_or_default(),
            self.write.unwrap_or_default(),
        );

        Ok(Revision::new(content)
            .with_permissions(permissions)
            .with_file(self.file)
            .with_thumbnail(self.thumbnail)
            .with_editor(editor)
            .with_msg(self.msg))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
