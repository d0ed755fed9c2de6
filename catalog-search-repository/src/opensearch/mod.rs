//! OpenSearch implementation of the search backend.
//!
//! This module provides a concrete implementation of `SearchBackend`
//! using OpenSearch (or a wire-compatible Elasticsearch) as the backend.

mod client;
mod index_config;
pub mod queries;
mod response;

pub use client::OpenSearchBackend;
pub use index_config::get_index_settings;
pub use response::{decode_bulk, decode_search};
