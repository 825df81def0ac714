//! Access levels and the read/write predicate applied to every revision.
//!
//! Levels form a total order `anyone < authenticated < editor < admin`. A
//! requester passes a check when their effective level is at least the level
//! the revision requires; admins pass every check regardless.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::revision::{EditorRef, Revision};
use crate::roles::{ROLE_ADMIN, ROLE_EDITOR};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// One of the four ordered access levels.
///
/// Variant order is the access order, so the derived `Ord` is the comparison
/// used by [`can_access`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Anyone,
    Authenticated,
    Editor,
    Admin,
}

/// Level applied to any rule field that is left unspecified.
pub const DEFAULT_PERMISSION_LEVEL: PermissionLevel = PermissionLevel::Anyone;

/// All levels, lowest first.
pub const ALL_LEVELS: [PermissionLevel; 4] = [
    PermissionLevel::Anyone,
    PermissionLevel::Authenticated,
    PermissionLevel::Editor,
    PermissionLevel::Admin,
];

impl PermissionLevel {
    /// String representation for display, logging, and query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anyone => "anyone",
            Self::Authenticated => "authenticated",
            Self::Editor => "editor",
            Self::Admin => "admin",
        }
    }

    /// Numeric rank (0 = `anyone`), persisted by storage backends so scope
    /// filters can use a plain `<=` comparison.
    pub fn rank(self) -> i16 {
        self as i16
    }
}

impl Default for PermissionLevel {
    fn default() -> Self {
        DEFAULT_PERMISSION_LEVEL
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_LEVELS
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = ALL_LEVELS.iter().map(|l| l.as_str()).collect();
                CoreError::Validation(format!(
                    "Invalid permission level '{s}'. Valid levels: {}",
                    valid.join(", ")
                ))
            })
    }
}

/// `true` iff `requester_level` is at least `required`.
pub fn can_access(required: PermissionLevel, requester_level: PermissionLevel) -> bool {
    requester_level >= required
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// The pair of levels a revision requires for reading and for writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionRule {
    #[serde(default)]
    pub read: PermissionLevel,
    #[serde(default)]
    pub write: PermissionLevel,
}

impl PermissionRule {
    pub const fn new(read: PermissionLevel, write: PermissionLevel) -> Self {
        Self { read, write }
    }

    /// Reject rules that would lock the requester out of what they create.
    ///
    /// A requester may only require levels they hold themselves.
    pub fn ensure_grantable_by(&self, requester: &Requester) -> Result<(), CoreError> {
        for (field, level) in [("read", self.read), ("write", self.write)] {
            if !requester.satisfies(level) {
                return Err(CoreError::Validation(format!(
                    "Cannot require '{level}' for {field} access above your own level '{}'",
                    requester.level()
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Requester
// ---------------------------------------------------------------------------

/// The identity a request is evaluated as, supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    User { id: DbId, role: String },
}

impl Requester {
    pub fn user(id: DbId, role: impl Into<String>) -> Self {
        Self::User {
            id,
            role: role.into(),
        }
    }

    pub fn id(&self) -> Option<DbId> {
        match self {
            Self::Anonymous => None,
            Self::User { id, .. } => Some(*id),
        }
    }

    /// Effective level derived from the role name.
    pub fn level(&self) -> PermissionLevel {
        match self {
            Self::Anonymous => PermissionLevel::Anyone,
            Self::User { role, .. } => match role.as_str() {
                ROLE_ADMIN => PermissionLevel::Admin,
                ROLE_EDITOR => PermissionLevel::Editor,
                _ => PermissionLevel::Authenticated,
            },
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::User { role, .. } if role == ROLE_ADMIN)
    }

    /// Access check with the admin override applied last.
    pub fn satisfies(&self, required: PermissionLevel) -> bool {
        can_access(required, self.level()) || self.is_admin()
    }

    pub fn can_read(&self, revision: &Revision) -> bool {
        self.satisfies(revision.permissions().read)
    }

    pub fn can_write(&self, revision: &Revision) -> bool {
        self.satisfies(revision.permissions().write)
    }

    /// Editor reference stamped on revisions this requester creates.
    pub fn editor_ref(&self) -> Option<EditorRef> {
        self.id().map(EditorRef::Id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
