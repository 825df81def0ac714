//! Result-window bounds and `first`/`previous`/`next`/`last` link relations.
//!
//! Link URLs carry the caller's raw query string with only `offset` and
//! `limit` rewritten; every other pair, including ones this crate does not
//! understand, is kept byte-for-byte.

use std::fmt;

/// Bounds of one listing window over `total` matching pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Index of the first page in the window.
    pub start: i64,
    /// Index of the last page in the window (`start - 1` when empty).
    pub end: i64,
    /// Window size used for neighbouring links.
    pub size: i64,
    pub total: i64,
}

impl PageWindow {
    pub fn compute(offset: i64, limit: Option<i64>, total: i64) -> Self {
        let (end, size) = match limit {
            Some(limit) => (offset.saturating_add(limit).min(total) - 1, limit),
            None => (total - 1, (total - offset).max(1)),
        };
        Self {
            start: offset,
            end,
            size,
            total,
        }
    }

    pub fn is_first(&self) -> bool {
        self.start == 0
    }

    pub fn is_last(&self) -> bool {
        self.end >= self.total - 1
    }
}

/// Navigation relation within a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRelation {
    First,
    Previous,
    Next,
    Last,
}

impl LinkRelation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Previous => "previous",
            Self::Next => "next",
            Self::Last => "last",
        }
    }
}

impl fmt::Display for LinkRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relation name to URL map for one window. Absent relations are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRelations {
    pub first: Option<String>,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub last: Option<String>,
}

impl LinkRelations {
    /// Present relations in `first, previous, next, last` order.
    pub fn iter(&self) -> impl Iterator<Item = (LinkRelation, &str)> + '_ {
        [
            (LinkRelation::First, &self.first),
            (LinkRelation::Previous, &self.previous),
            (LinkRelation::Next, &self.next),
            (LinkRelation::Last, &self.last),
        ]
        .into_iter()
        .filter_map(|(rel, url)| url.as_deref().map(|url| (rel, url)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

// ---------------------------------------------------------------------------
// Query string rewriting
// ---------------------------------------------------------------------------

/// A raw query string split into its `&`-separated pairs, left undecoded.
#[derive(Debug, Clone, Default)]
pub struct QueryString<'a> {
    pairs: Vec<&'a str>,
}

impl<'a> QueryString<'a> {
    pub fn parse(raw: &'a str) -> Self {
        Self {
            pairs: raw
                .trim_start_matches('?')
                .split('&')
                .filter(|pair| !pair.is_empty())
                .collect(),
        }
    }

    /// Render with `offset`/`limit` replaced where they first appear (and
    /// appended when absent). Repeated `offset`/`limit` pairs are dropped.
    pub fn with_window(&self, offset: i64, limit: i64) -> String {
        let mut out = Vec::with_capacity(self.pairs.len() + 2);
        let mut wrote_offset = false;
        let mut wrote_limit = false;

        for pair in &self.pairs {
            let key = pair.split_once('=').map_or(*pair, |(key, _)| key);
            match key {
                "offset" => {
                    if !wrote_offset {
                        out.push(format!("offset={offset}"));
                        wrote_offset = true;
                    }
                }
                "limit" => {
                    if !wrote_limit {
                        out.push(format!("limit={limit}"));
                        wrote_limit = true;
                    }
                }
                _ => out.push((*pair).to_string()),
            }
        }
        if !wrote_offset {
            out.push(format!("offset={offset}"));
        }
        if !wrote_limit {
            out.push(format!("limit={limit}"));
        }
        out.join("&")
    }
}

/// Build the link relations for `window` under `base_path`.
pub fn build_links(base_path: &str, raw_query: &str, window: &PageWindow) -> LinkRelations {
    let query = QueryString::parse(raw_query);
    let url = |offset: i64| format!("{base_path}?{}", query.with_window(offset, window.size));

    let mut links = LinkRelations::default();
    if !window.is_first() {
        links.first = Some(url(0));
        links.previous = Some(url((window.start - window.size).max(0)));
    }
    if !window.is_last() {
        links.next = Some(url(window.end.saturating_add(1)));
        links.last = Some(url((window.total - window.size).max(0)));
    }
    links
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
