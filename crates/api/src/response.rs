//! Shared response envelope types and listing headers.
//!
//! All API responses use a `{ "data": ... }` envelope. Listings additionally
//! carry a `Link` header (`<url>; rel="name"`, comma-joined) and the total
//! match count in `X-Total-Count`.

use axum::http::header::LINK;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use quire_core::pagination::LinkRelations;
use serde::Serialize;

/// Name of the header carrying the unwindowed match count.
pub const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Render link relations as an RFC 5988 `Link` header value.
///
/// Returns `None` when no relation is present.
pub fn link_header_value(links: &LinkRelations) -> Option<String> {
    if links.is_empty() {
        return None;
    }
    let rendered: Vec<String> = links
        .iter()
        .map(|(rel, url)| format!("<{url}>; rel=\"{rel}\""))
        .collect();
    Some(rendered.join(", "))
}

/// `Link` and `X-Total-Count` headers for a listing window.
pub fn listing_headers(links: &LinkRelations, total: i64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from(total));

    if let Some(value) = link_header_value(links) {
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                headers.insert(LINK, value);
            }
            Err(e) => tracing::warn!(error = %e, "Skipping unrepresentable Link header"),
        }
    }
    headers
}
