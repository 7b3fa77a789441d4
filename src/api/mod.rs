//! QA Sphere public REST API client.
//!
//! All tools talk to `{tenant}/api/public/v0` through [`ApiClient`].

mod client;

pub use client::{ApiClient, QueryParams, API_PREFIX};
