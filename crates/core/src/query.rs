//! Page listing: parameter parsing, requester scoping, sort resolution, and
//! execution against a [`PageStore`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::CoreError;
use crate::page::Page;
use crate::pagination::{build_links, LinkRelations, PageWindow};
use crate::permissions::{can_access, PermissionLevel, Requester};
use crate::search::{
    clamp_limit, clamp_offset, normalize_search_text, relevance_score, search_terms,
    MAX_PAGE_LIMIT,
};
use crate::store::{PageSet, PageStore};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Raw parameters
// ---------------------------------------------------------------------------

/// Listing parameters exactly as the caller supplied them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageListParams {
    pub created_before: Option<String>,
    pub created_after: Option<String>,
    pub updated_before: Option<String>,
    pub updated_after: Option<String>,
    pub revisions_min: Option<String>,
    pub revisions_max: Option<String>,
    pub text: Option<String>,
    pub trashed: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
}

// ---------------------------------------------------------------------------
// Sort
// ---------------------------------------------------------------------------

/// Listing order. `Title*` is the `alphabetical` ordering on the current
/// revision's title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSort {
    CreatedAsc,
    CreatedDesc,
    UpdatedAsc,
    UpdatedDesc,
    TitleAsc,
    TitleDesc,
    Relevance,
}

/// Ordering used when nothing else applies.
pub const DEFAULT_SORT: PageSort = PageSort::UpdatedDesc;

impl PageSort {
    /// Parse a `sort` parameter. Unrecognized values are `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::CreatedAsc),
            "-created" => Some(Self::CreatedDesc),
            "updated" => Some(Self::UpdatedAsc),
            "-updated" => Some(Self::UpdatedDesc),
            "alphabetical" => Some(Self::TitleAsc),
            "-alphabetical" => Some(Self::TitleDesc),
            "relevance" => Some(Self::Relevance),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAsc => "created",
            Self::CreatedDesc => "-created",
            Self::UpdatedAsc => "updated",
            Self::UpdatedDesc => "-updated",
            Self::TitleAsc => "alphabetical",
            Self::TitleDesc => "-alphabetical",
            Self::Relevance => "relevance",
        }
    }
}

/// Pick the effective ordering.
///
/// Relevance needs search text: without it an explicit `relevance` becomes
/// `alphabetical`. With text and no explicit sort, relevance is the default.
pub fn resolve_sort(requested: Option<PageSort>, has_text: bool) -> PageSort {
    match (requested, has_text) {
        (Some(PageSort::Relevance), false) => PageSort::TitleAsc,
        (Some(sort), _) => sort,
        (None, true) => PageSort::Relevance,
        (None, false) => DEFAULT_SORT,
    }
}

// ---------------------------------------------------------------------------
// Typed filter
// ---------------------------------------------------------------------------

/// Parsed listing parameters, before requester scoping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFilter {
    pub created_before: Option<Timestamp>,
    pub created_after: Option<Timestamp>,
    pub updated_before: Option<Timestamp>,
    pub updated_after: Option<Timestamp>,
    pub revisions_min: Option<i64>,
    pub revisions_max: Option<i64>,
    /// Normalized search text; `None` when absent or blank.
    pub text: Option<String>,
    pub trashed: bool,
    pub sort: Option<PageSort>,
    pub offset: i64,
    pub limit: Option<i64>,
}

impl PageFilter {
    /// Parse raw parameters. Malformed values are rejected with an error
    /// naming the parameter; an unrecognized `sort` is dropped.
    pub fn from_params(params: &PageListParams) -> Result<Self, CoreError> {
        Ok(Self {
            created_before: parse_instant("createdBefore", &params.created_before)?,
            created_after: parse_instant("createdAfter", &params.created_after)?,
            updated_before: parse_instant("updatedBefore", &params.updated_before)?,
            updated_after: parse_instant("updatedAfter", &params.updated_after)?,
            revisions_min: parse_integer("revisionsMin", &params.revisions_min)?,
            revisions_max: parse_integer("revisionsMax", &params.revisions_max)?,
            text: present(&params.text).and_then(normalize_search_text),
            trashed: parse_bool("trashed", &params.trashed)?.unwrap_or(false),
            sort: present(&params.sort).and_then(PageSort::parse),
            offset: clamp_offset(parse_integer("offset", &params.offset)?),
            limit: clamp_limit(parse_integer("limit", &params.limit)?, MAX_PAGE_LIMIT),
        })
    }
}

/// Trimmed, non-blank parameter value.
fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// RFC 3339 instant, or a `YYYY-MM-DD` date taken as UTC midnight.
fn parse_instant(name: &str, raw: &Option<String>) -> Result<Option<Timestamp>, CoreError> {
    let Some(value) = present(raw) else {
        return Ok(None);
    };
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(instant.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Some(midnight.and_utc()))
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Parameter '{name}' must be an RFC 3339 timestamp or a YYYY-MM-DD date, got '{value}'"
            ))
        })
}

fn parse_integer(name: &str, raw: &Option<String>) -> Result<Option<i64>, CoreError> {
    present(raw)
        .map(|value| {
            value.parse::<i64>().map_err(|_| {
                CoreError::Validation(format!(
                    "Parameter '{name}' must be an integer, got '{value}'"
                ))
            })
        })
        .transpose()
}

fn parse_bool(name: &str, raw: &Option<String>) -> Result<Option<bool>, CoreError> {
    present(raw)
        .map(|value| match value {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(CoreError::Validation(format!(
                "Parameter '{name}' must be 'true' or 'false', got '{value}'"
            ))),
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// Resolved query
// ---------------------------------------------------------------------------

/// Storage-facing listing descriptor: filters scoped to the requester, with
/// the effective sort and window.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub created_before: Option<Timestamp>,
    pub created_after: Option<Timestamp>,
    pub updated_before: Option<Timestamp>,
    pub updated_after: Option<Timestamp>,
    pub revisions_min: Option<i64>,
    pub revisions_max: Option<i64>,
    pub text: Option<String>,
    /// List trashed pages instead of live ones.
    pub trashed: bool,
    /// Highest current-revision read level the requester may see; `None`
    /// means unrestricted (admins).
    pub max_read_level: Option<PermissionLevel>,
    pub sort: PageSort,
    pub offset: i64,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Scope `filter` to what `requester` may list.
    ///
    /// Non-admins asking for trashed pages get the live scope instead.
    pub fn build(filter: PageFilter, requester: &Requester) -> Self {
        let is_admin = requester.is_admin();
        let sort = resolve_sort(filter.sort, filter.text.is_some());
        Self {
            created_before: filter.created_before,
            created_after: filter.created_after,
            updated_before: filter.updated_before,
            updated_after: filter.updated_after,
            revisions_min: filter.revisions_min,
            revisions_max: filter.revisions_max,
            text: filter.text,
            trashed: filter.trashed && is_admin,
            max_read_level: (!is_admin).then(|| requester.level()),
            sort,
            offset: filter.offset,
            limit: filter.limit,
        }
    }

    /// Whether `page` falls inside this query's filters and scope.
    ///
    /// Timestamp bounds are exclusive, revision-count bounds inclusive.
    pub fn matches(&self, page: &Page) -> bool {
        if page.is_trashed() != self.trashed {
            return false;
        }
        if let Some(max) = self.max_read_level {
            let required = page
                .current()
                .map(|r| r.permissions().read)
                .unwrap_or_default();
            if !can_access(required, max) {
                return false;
            }
        }

        let created = page.created();
        let updated = page.updated();
        if self.created_before.is_some_and(|t| created >= t)
            || self.created_after.is_some_and(|t| created <= t)
            || self.updated_before.is_some_and(|t| updated >= t)
            || self.updated_after.is_some_and(|t| updated <= t)
        {
            return false;
        }

        let count = page.revision_count() as i64;
        if self.revisions_min.is_some_and(|min| count < min)
            || self.revisions_max.is_some_and(|max| count > max)
        {
            return false;
        }

        match &self.text {
            Some(text) => self.score(text, page).is_some(),
            None => true,
        }
    }

    /// Text-search relevance of `page`; `0.0` without search text.
    pub fn relevance(&self, page: &Page) -> f64 {
        self.text
            .as_deref()
            .and_then(|text| self.score(text, page))
            .unwrap_or(0.0)
    }

    fn score(&self, text: &str, page: &Page) -> Option<f64> {
        let current = page.current()?;
        relevance_score(
            &search_terms(text),
            &current.content().title,
            &current.content().body,
        )
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// One listing window with its navigation metadata.
#[derive(Debug, Clone)]
pub struct PageListing {
    pub pages: Vec<Page>,
    pub total: i64,
    pub window: PageWindow,
    pub links: LinkRelations,
}

/// Parse, scope, and run a listing, then compute window links.
///
/// `base_path` and `raw_query` are the request path and undecoded query
/// string the links are built from.
pub async fn list_pages(
    store: &dyn PageStore,
    requester: &Requester,
    params: &PageListParams,
    base_path: &str,
    raw_query: Option<&str>,
) -> Result<PageListing, CoreError> {
    let filter = PageFilter::from_params(params)?;
    let query = PageQuery::build(filter, requester);

    let PageSet { pages, total } = store.find(&query).await?;

    let window = PageWindow::compute(query.offset, query.limit, total);
    let links = build_links(base_path, raw_query.unwrap_or_default(), &window);

    Ok(PageListing {
        pages,
        total,
        window,
        links,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
