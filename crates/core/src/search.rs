//! Free-text search and pagination helpers shared by the storage backends.
//!
//! The Postgres store hands normalized text to `plainto_tsquery`; the
//! in-memory store scores pages with [`relevance_score`]. Both use the same
//! term sanitizing.

// ---------------------------------------------------------------------------
// Relevance weights
// ---------------------------------------------------------------------------

/// PostgreSQL tsvector weight for page titles (highest priority).
pub const WEIGHT_TITLE: char = 'A';

/// PostgreSQL tsvector weight for page bodies.
pub const WEIGHT_BODY: char = 'B';

/// Score contributed by one term occurrence in a title, relative to a body hit.
const TITLE_HIT_SCORE: f64 = 4.0;
const BODY_HIT_SCORE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Maximum number of pages per listing window.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Clamp a user-provided limit to `[1, max]`. An absent limit stays absent
/// (the listing is unbounded).
pub fn clamp_limit(limit: Option<i64>, max: i64) -> Option<i64> {
    limit.map(|l| l.max(1).min(max))
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

/// Sanitize user input into a list of lowercase search terms.
///
/// - Splits on whitespace.
/// - Strips non-alphanumeric characters (except `_`) from each term's edges.
/// - Drops empty terms.
pub fn search_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Normalized search text handed to PostgreSQL `plainto_tsquery`.
///
/// Returns `None` when no usable term is left.
pub fn normalize_search_text(query: &str) -> Option<String> {
    let terms = search_terms(query);
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

/// Score a page for `terms`: every term must occur in the title or body.
///
/// Returns `None` when some term is missing, otherwise a score where title
/// hits weigh more than body hits.
pub fn relevance_score(terms: &[String], title: &str, body: &str) -> Option<f64> {
    let title = title.to_lowercase();
    let body = body.to_lowercase();

    let mut score = 0.0;
    for term in terms {
        let in_title = title.matches(term.as_str()).count();
        let in_body = body.matches(term.as_str()).count();
        if in_title + in_body == 0 {
            return None;
        }
        score += in_title as f64 * TITLE_HIT_SCORE + in_body as f64 * BODY_HIT_SCORE;
    }
    Some(score)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
