//! HTTP fetching and pagination for mirrorpull.
//!
//! This crate provides the request pipeline:
//!
//! - [`BackoffPolicy`] - Capped exponential retry delays
//! - [`FetchClient`] - HTTP client with connection pooling and retries
//! - [`url::initial_query`] - Builds mirror node queries
//! - [`collect`] - Follows a cursor chain, persisting every page with resume support
//! - [`collect_once`] / [`collect_once_into`] - Point-in-time single requests

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/mirrorpull/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod backoff;
mod client;
mod collect;
pub mod url;

pub use backoff::BackoffPolicy;
pub use client::{AttemptError, ClientConfig, FetchClient, FetchError};
pub use collect::{
    CollectEnd, CollectError, CollectOutcome, collect, collect_once, collect_once_into,
};
