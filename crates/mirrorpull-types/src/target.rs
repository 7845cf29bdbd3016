//! Fetch target description.

use serde::{Deserialize, Serialize};

/// Public Hedera mainnet mirror node.
pub const DEFAULT_BASE_URL: &str = "https://mainnet-public.mirrornode.hedera.com";

/// Path prefix of the mirror node REST API.
pub const DEFAULT_API_PREFIX: &str = "api/v1";

/// Account queried when none is given.
pub const DEFAULT_ACCOUNT: &str = "0.0.800";

/// Page size requested when none is given.
pub const DEFAULT_LIMIT: u32 = 100;

/// Sort order requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first. Pagination walks forward in time.
    #[default]
    Asc,
    /// Newest first.
    Desc,
}

impl SortOrder {
    /// Returns the query-string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Timestamp filter with an inclusive or exclusive operator.
///
/// Timestamps are unix seconds, rendered the way the mirror node expects
/// (`timestamp=gt:1700000000`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFilter {
    /// Strictly after.
    Gt(i64),
    /// At or after.
    Gte(i64),
    /// Strictly before.
    Lt(i64),
    /// At or before.
    Lte(i64),
    /// Exactly at (point-in-time snapshot).
    At(i64),
}

impl std::fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gt(t) => write!(f, "timestamp=gt:{t}"),
            Self::Gte(t) => write!(f, "timestamp=gte:{t}"),
            Self::Lt(t) => write!(f, "timestamp=lt:{t}"),
            Self::Lte(t) => write!(f, "timestamp=lte:{t}"),
            Self::At(t) => write!(f, "timestamp={t}"),
        }
    }
}

/// Immutable description of one fetch unit.
///
/// Created by the caller per job and never mutated afterwards; collectors
/// only borrow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTarget {
    /// Root URL of the API, without a trailing slash.
    pub base_url: String,
    /// API path prefix (e.g. `api/v1`).
    pub api_prefix: String,
    /// Resource name. Doubles as the data key of the response body.
    pub resource: String,
    /// Entity filter (`account.id`).
    pub account: Option<String>,
    /// Page size.
    pub limit: u32,
    /// Sort order.
    pub order: SortOrder,
    /// Timestamp filters.
    pub time_filters: Vec<TimeFilter>,
    /// Additional raw query fragments (`key=value`), appended verbatim.
    pub extra: Vec<String>,
}

impl FetchTarget {
    /// Creates a target for `resource` on the given API root.
    #[must_use]
    pub fn new(base_url: impl Into<String>, resource: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            resource: resource.into(),
            account: None,
            limit: DEFAULT_LIMIT,
            order: SortOrder::Asc,
            time_filters: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// Sets the account filter.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub const fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Sets the API path prefix.
    #[must_use]
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Adds a timestamp filter.
    #[must_use]
    pub fn with_time_filter(mut self, filter: TimeFilter) -> Self {
        self.time_filters.push(filter);
        self
    }

    /// Adds a raw query fragment.
    #[must_use]
    pub fn with_extra(mut self, fragment: impl Into<String>) -> Self {
        self.extra.push(fragment.into());
        self
    }

    /// Returns the key under which the response carries its records.
    #[must_use]
    pub fn data_key(&self) -> &str {
        &self.resource
    }

    /// Returns the resource path, e.g. `/api/v1/transactions`.
    #[must_use]
    pub fn path(&self) -> String {
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("/{}", self.resource)
        } else {
            format!("/{prefix}/{}", self.resource)
        }
    }
}
