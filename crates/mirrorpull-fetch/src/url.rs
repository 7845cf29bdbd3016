//! Mirror node query and URL construction.

use mirrorpull_types::{Cursor, FetchTarget};

/// Builds the first-page query (path plus query string) for a target.
///
/// Format: `/{prefix}/{resource}?account.id={id}&limit={n}&order={order}&{filters}`
///
/// # Example
///
/// ```
/// use mirrorpull_fetch::url::initial_query;
/// use mirrorpull_types::{FetchTarget, TimeFilter};
///
/// let target = FetchTarget::new("https://example.com", "transactions")
///     .with_account("0.0.800")
///     .with_time_filter(TimeFilter::Gte(1700000000))
///     .with_time_filter(TimeFilter::Lt(1700086400));
/// assert_eq!(
///     initial_query(&target),
///     "/api/v1/transactions?account.id=0.0.800&limit=100&order=asc\
///      &timestamp=gte:1700000000&timestamp=lt:1700086400"
/// );
/// ```
#[must_use]
pub fn initial_query(target: &FetchTarget) -> String {
    let mut query = format!("{}?", target.path());
    if let Some(account) = &target.account {
        query.push_str(&format!("account.id={account}&"));
    }
    query.push_str(&format!("limit={}&order={}", target.limit, target.order.as_str()));
    for filter in &target.time_filters {
        query.push_str(&format!("&{filter}"));
    }
    for fragment in target.extra.iter().filter(|f| !f.is_empty()) {
        query.push('&');
        query.push_str(fragment.trim_start_matches('&'));
    }
    query
}

/// Joins a base URL and a path-plus-query.
#[must_use]
pub fn request_url(base_url: &str, query: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if query.starts_with('/') {
        format!("{base}{query}")
    } else {
        format!("{base}/{query}")
    }
}

/// Builds the URL for a continuation cursor. Absolute cursors are used as-is.
#[must_use]
pub fn cursor_url(base_url: &str, cursor: &Cursor) -> String {
    if cursor.is_absolute() {
        cursor.to_string()
    } else {
        request_url(base_url, cursor.as_str())
    }
}

/// Builds the first-page URL for a target.
#[must_use]
pub fn initial_url(target: &FetchTarget) -> String {
    request_url(&target.base_url, &initial_query(target))
}
