//! Request layer: URL building, header assembly, dispatch and response
//! classification.
//!
//! - `ApiClient`: single-attempt requests against the diary backend
//! - `classify`: maps a status and body onto one outcome

mod client;
mod response;

pub use client::{ApiClient, RequestBody, RequestOptions, build_headers, query_pairs};
pub use response::{Outcome, classify};

pub use reqwest::Method;
