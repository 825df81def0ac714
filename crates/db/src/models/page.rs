//! Page row model and the denormalized columns written alongside it.

use quire_core::page::Page;
use quire_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `pages` table, as read back for the engine.
#[derive(Debug, Clone, FromRow)]
pub struct PageRow {
    pub id: DbId,
    pub document: Json<Page>,
}

impl PageRow {
    /// The stored aggregate, carrying the row id.
    pub fn into_page(self) -> Page {
        let mut page = self.document.0;
        page.set_id(self.id);
        page
    }
}

/// Column values mirrored from a page's current revision.
#[derive(Debug, Clone)]
pub struct PageRecord<'a> {
    pub path: String,
    pub title: &'a str,
    pub body: &'a str,
    pub read_level: i16,
    pub revision_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub trashed_at: Option<Timestamp>,
    pub document: Json<&'a Page>,
}

impl<'a> PageRecord<'a> {
    /// `None` for a page without any revision, which cannot be stored.
    pub fn from_page(page: &'a Page) -> Option<Self> {
        let current = page.current()?;
        Some(Self {
            path: current.content().canonical_path(),
            title: &current.content().title,
            body: &current.content().body,
            read_level: current.permissions().read.rank(),
            revision_count: i32::try_from(page.revision_count()).unwrap_or(i32::MAX),
            created_at: page.created(),
            updated_at: page.updated(),
            trashed_at: page.trashed(),
            document: Json(page),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::content::ContentUnit;
    use quire_core::permissions::{PermissionLevel, PermissionRule};
    use quire_core::revision::Revision;

    #[test]
    fn record_mirrors_current_revision() {
        let mut page = Page::with_initial(Revision::new(ContentUnit::new("Draft", "old")));
        page.add_revision(
            Revision::new(ContentUnit::new("Launch Plan", "new").with_path("plans/launch"))
                .with_permissions(PermissionRule::new(
                    PermissionLevel::Editor,
                    PermissionLevel::Admin,
                )),
        );

        let record = PageRecord::from_page(&page).unwrap();
        assert_eq!(record.path, "plans/launch");
        assert_eq!(record.title, "Launch Plan");
        assert_eq!(record.body, "new");
        assert_eq!(record.read_level, PermissionLevel::Editor.rank());
        assert_eq!(record.revision_count, 2);
        assert_eq!(record.trashed_at, None);
    }

    #[test]
    fn empty_page_has_no_record() {
        assert!(PageRecord::from_page(&Page::new()).is_none());
    }
}
